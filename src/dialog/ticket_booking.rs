//! Ticket booking flow
//!
//! Books one of the offers from the most recent search: pick the flight,
//! collect passenger name, email, and payment method, confirm, then hand the
//! booking to the flight client. The selected offer may arrive prefilled
//! from an offer card's "Select Flight" submission.

use super::{is_no, is_yes, DialogState, DialogTurn};
use crate::activity::Activity;
use crate::cards;
use crate::error::{DialogError, Result};
use crate::flights::{FlightApi, FlightOffer, Passenger};
use crate::session::Session;

const STEP_SELECT: usize = 0;
const STEP_NAME: usize = 1;
const STEP_EMAIL: usize = 2;
const STEP_PAYMENT: usize = 3;
const STEP_CONFIRM: usize = 4;

const PAYMENT_METHODS: [&str; 3] = ["Credit Card", "PayPal", "Apple Pay"];

pub(crate) async fn run(
    dialog: &mut DialogState,
    session: &mut Session,
    input: Option<&str>,
    flights: &dyn FlightApi,
) -> Result<DialogTurn> {
    let mut input = input.map(str::trim).filter(|t| !t.is_empty());
    let mut replies = Vec::new();

    loop {
        match dialog.step {
            STEP_SELECT => {
                if dialog.selected_offer.is_some() {
                    dialog.step = STEP_NAME;
                    continue;
                }
                if session.offers.is_empty() {
                    replies.push(Activity::message(
                        "You haven't searched for flights yet. Search first, then pick the one you'd like to book.",
                    ));
                    replies.push(Activity::card(cards::options_card(None)));
                    return Ok(DialogTurn::complete(replies));
                }
                match input.take() {
                    Some(text) => match find_offer(&session.offers, text) {
                        Some(offer) => {
                            dialog.selected_offer = Some(offer.clone());
                            dialog.step = STEP_NAME;
                        }
                        None => {
                            replies.push(Activity::message(
                                "I couldn't match that to one of the flights above. Please reply with a flight number (e.g. AI101) or a list number.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        let mut listing =
                            String::from("Which flight would you like to book?\n");
                        for (i, offer) in session.offers.iter().enumerate() {
                            listing.push_str(&super::offer_line(i, offer));
                            listing.push('\n');
                        }
                        listing.push_str(
                            "Reply with a flight number (e.g. AI101) or a list number.",
                        );
                        replies.push(Activity::message(listing));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_NAME => {
                if dialog.passenger.name.is_some() {
                    dialog.step = STEP_EMAIL;
                    continue;
                }
                match input.take() {
                    Some(text) => {
                        dialog.passenger.name = Some(text.to_string());
                        dialog.step = STEP_EMAIL;
                    }
                    None => {
                        replies.push(Activity::message(
                            "Great, let's book it. What's the passenger's full name?",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_EMAIL => {
                if dialog.passenger.email.is_some() {
                    dialog.step = STEP_PAYMENT;
                    continue;
                }
                match input.take() {
                    Some(text) if looks_like_email(text) => {
                        dialog.passenger.email = Some(text.to_string());
                        dialog.step = STEP_PAYMENT;
                    }
                    Some(_) => {
                        replies.push(Activity::message(
                            "That doesn't look like an email address. Please try again.",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                    None => {
                        replies.push(Activity::message(
                            "What email address should the confirmation go to?",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_PAYMENT => {
                if dialog.passenger.payment_method.is_some() {
                    dialog.step = STEP_CONFIRM;
                    continue;
                }
                match input.take() {
                    Some(text) => match match_payment(text) {
                        Some(method) => {
                            dialog.passenger.payment_method = Some(method.to_string());
                            dialog.step = STEP_CONFIRM;
                        }
                        None => {
                            replies.push(Activity::message(
                                "Please pick one of: Credit Card, PayPal, or Apple Pay.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message(
                            "How would you like to pay? (Credit Card / PayPal / Apple Pay)",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_CONFIRM => match input.take() {
                Some(text) if is_yes(text) => {
                    let offer = dialog
                        .selected_offer
                        .as_ref()
                        .ok_or_else(|| DialogError::MissingField("selected_offer".to_string()))?;
                    let passenger = passenger_from_draft(dialog)?;

                    let record = flights.book(offer, &passenger).await?;
                    replies.push(Activity::message(format!(
                        "Your booking is confirmed! Reference: {}",
                        record.reference
                    )));
                    replies.push(Activity::message(itinerary_text(&record)));
                    dialog.booking = Some(record);
                    return Ok(DialogTurn::complete(replies));
                }
                Some(text) if is_no(text) => {
                    replies.push(Activity::message(
                        "No problem, I haven't booked anything.",
                    ));
                    replies.push(Activity::card(cards::options_card(None)));
                    return Ok(DialogTurn::complete(replies));
                }
                Some(_) => {
                    replies.push(Activity::message("Please answer yes or no."));
                    return Ok(DialogTurn::waiting(replies));
                }
                None => {
                    replies.push(Activity::message(confirmation_text(dialog)?));
                    return Ok(DialogTurn::waiting(replies));
                }
            },
            step => {
                return Err(DialogError::StepOutOfRange {
                    flow: dialog.flow.name().to_string(),
                    step,
                }
                .into())
            }
        }
    }
}

/// Resolve a typed selection against the stored offers, by flight number or
/// 1-based list position.
pub(crate) fn find_offer<'a>(offers: &'a [FlightOffer], text: &str) -> Option<&'a FlightOffer> {
    let trimmed = text.trim();
    if let Some(offer) = offers
        .iter()
        .find(|o| o.flight_number.eq_ignore_ascii_case(trimmed))
    {
        return Some(offer);
    }
    if let Ok(position) = trimmed.parse::<usize>() {
        if position >= 1 {
            return offers.get(position - 1);
        }
    }
    None
}

fn match_payment(text: &str) -> Option<&'static str> {
    let lower = text.trim().to_lowercase();
    PAYMENT_METHODS
        .iter()
        .find(|method| lower.contains(&method.to_lowercase()))
        .copied()
}

fn looks_like_email(text: &str) -> bool {
    let trimmed = text.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

fn passenger_from_draft(dialog: &DialogState) -> Result<Passenger> {
    let draft = &dialog.passenger;
    Ok(Passenger {
        name: draft
            .name
            .clone()
            .ok_or_else(|| DialogError::MissingField("name".to_string()))?,
        email: draft
            .email
            .clone()
            .ok_or_else(|| DialogError::MissingField("email".to_string()))?,
        payment_method: draft
            .payment_method
            .clone()
            .ok_or_else(|| DialogError::MissingField("payment_method".to_string()))?,
    })
}

fn confirmation_text(dialog: &DialogState) -> Result<String> {
    let offer = dialog
        .selected_offer
        .as_ref()
        .ok_or_else(|| DialogError::MissingField("selected_offer".to_string()))?;
    let name = dialog
        .passenger
        .name
        .as_deref()
        .ok_or_else(|| DialogError::MissingField("name".to_string()))?;
    let payment = dialog
        .passenger
        .payment_method
        .as_deref()
        .ok_or_else(|| DialogError::MissingField("payment_method".to_string()))?;
    Ok(format!(
        "Please confirm your booking:\n\
         Flight: {} {} — {} to {} on {}\n\
         Passenger: {}\n\
         Payment: {}\n\
         Total: ${:.0}\n\
         Shall I book it? (yes/no)",
        offer.airline,
        offer.flight_number,
        offer.origin,
        offer.destination,
        offer.departure_date,
        name,
        payment,
        offer.price,
    ))
}

pub(crate) fn itinerary_text(record: &crate::flights::BookingRecord) -> String {
    let offer = &record.offer;
    format!(
        "Itinerary {}\n\
         {} {} — {} to {}\n\
         Date: {}, departs {}, arrives {} ({})\n\
         Passenger: {} <{}>\n\
         Payment: {} ({})\n\
         Status: {}",
        record.reference,
        offer.airline,
        offer.flight_number,
        offer.origin,
        offer.destination,
        offer.departure_date,
        offer.departure_time,
        offer.arrival_time,
        offer.duration,
        record.passenger.name,
        record.passenger.email,
        record.passenger.payment_method,
        record.payment_status,
        record.status,
    )
}
