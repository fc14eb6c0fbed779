//! Itinerary management flow
//!
//! Looks up an existing booking by reference and offers a small menu of
//! actions on it. Cancelling is destructive, so it takes an explicit
//! "CONFIRM CANCEL" before anything happens.

use super::{ticket_booking::itinerary_text, DialogState, DialogTurn};
use crate::activity::Activity;
use crate::cards;
use crate::error::{DialogError, FlightError, Result};
use crate::flights::FlightApi;
use crate::session::Session;
use crate::types::BookingRef;

const STEP_REFERENCE: usize = 0;
const STEP_ACTION: usize = 1;
const STEP_CONFIRM_CANCEL: usize = 2;

const ACTION_MENU: &str =
    "What would you like to do? (View Details / Change Seats / Cancel Booking / Email Itinerary)";

pub(crate) async fn run(
    dialog: &mut DialogState,
    _session: &mut Session,
    input: Option<&str>,
    flights: &dyn FlightApi,
) -> Result<DialogTurn> {
    let input = input.map(str::trim).filter(|t| !t.is_empty());
    let mut replies = Vec::new();

    match dialog.step {
        STEP_REFERENCE => match input {
            Some(text) => {
                let reference = BookingRef::new(text.to_uppercase());
                match flights.booking_details(&reference).await {
                    Ok(record) => {
                        replies.push(Activity::message(format!(
                            "Found it. {} {} from {} to {} on {}, status {}.",
                            record.offer.airline,
                            record.offer.flight_number,
                            record.offer.origin,
                            record.offer.destination,
                            record.offer.departure_date,
                            record.status,
                        )));
                        replies.push(Activity::message(ACTION_MENU));
                        dialog.booking_reference = Some(reference);
                        dialog.booking = Some(record);
                        dialog.step = STEP_ACTION;
                        Ok(DialogTurn::waiting(replies))
                    }
                    Err(FlightError::BookingNotFound(_)) => {
                        replies.push(Activity::message(format!(
                            "I'm sorry, I couldn't find a booking with reference {}. \
                             Please check the reference and start again.",
                            reference
                        )));
                        Ok(DialogTurn::complete(replies))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            None => {
                replies.push(Activity::message(
                    "Please enter your booking reference (e.g. BK1234).",
                ));
                Ok(DialogTurn::waiting(replies))
            }
        },
        STEP_ACTION => {
            let record = dialog
                .booking
                .as_ref()
                .ok_or_else(|| DialogError::MissingField("booking".to_string()))?;
            let choice = input.map(str::to_lowercase).unwrap_or_default();

            if choice.contains("view") || choice.contains("details") {
                replies.push(Activity::message(itinerary_text(record)));
                replies.push(Activity::card(cards::options_card(None)));
                Ok(DialogTurn::complete(replies))
            } else if choice.contains("seat") {
                replies.push(Activity::message(
                    "Seat changes aren't available here yet. Please contact the airline directly with your booking reference.",
                ));
                Ok(DialogTurn::complete(replies))
            } else if choice.contains("cancel") {
                let reference = record.reference.clone();
                replies.push(Activity::message(format!(
                    "Cancelling booking {} is permanent. Reply CONFIRM CANCEL to go ahead, or anything else to keep it.",
                    reference
                )));
                dialog.step = STEP_CONFIRM_CANCEL;
                Ok(DialogTurn::waiting(replies))
            } else if choice.contains("email") {
                replies.push(Activity::message(format!(
                    "Your itinerary has been emailed to {}.",
                    record.passenger.email
                )));
                Ok(DialogTurn::complete(replies))
            } else {
                replies.push(Activity::message(ACTION_MENU));
                Ok(DialogTurn::waiting(replies))
            }
        }
        STEP_CONFIRM_CANCEL => {
            let record = dialog
                .booking
                .as_ref()
                .ok_or_else(|| DialogError::MissingField("booking".to_string()))?;

            if input == Some("CONFIRM CANCEL") {
                replies.push(Activity::message(format!(
                    "Booking {} has been cancelled. Any refund will follow the fare rules for your ticket.",
                    record.reference
                )));
            } else {
                replies.push(Activity::message(
                    "Cancellation not confirmed. Your booking is unchanged.",
                ));
            }
            Ok(DialogTurn::complete(replies))
        }
        step => Err(DialogError::StepOutOfRange {
            flow: dialog.flow.name().to_string(),
            step,
        }
        .into()),
    }
}
