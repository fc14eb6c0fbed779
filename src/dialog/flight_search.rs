//! Quick flight-search flow
//!
//! Three prompts (origin, destination, date), then a search. Results are
//! listed as numbered text and stored on the session so a follow-up
//! "book that one" can refer to them.

use super::{offer_line, parse_date, DialogState, DialogTurn};
use crate::activity::Activity;
use crate::cards;
use crate::error::{DialogError, Result};
use crate::flights::FlightApi;
use crate::session::Session;

const STEP_ORIGIN: usize = 0;
const STEP_DESTINATION: usize = 1;
const STEP_DATE: usize = 2;
const STEP_SEARCH: usize = 3;

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
            STEP_ORIGIN => {
                if dialog.query.origin.is_some() {
                    dialog.step = STEP_DESTINATION;
                    continue;
                }
                match input.take() {
                    Some(text) => {
                        dialog.query.origin = Some(text.to_string());
                        dialog.step = STEP_DESTINATION;
                    }
                    None => {
                        replies.push(Activity::message("Which city are you flying from?"));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_DESTINATION => {
                if dialog.query.destination.is_some() {
                    dialog.step = STEP_DATE;
                    continue;
                }
                match input.take() {
                    Some(text) => {
                        dialog.query.destination = Some(text.to_string());
                        dialog.step = STEP_DATE;
                    }
                    None => {
                        replies.push(Activity::message("Where would you like to fly to?"));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_DATE => {
                if dialog.query.departure_date.is_some() {
                    dialog.step = STEP_SEARCH;
                    continue;
                }
                match input.take() {
                    Some(text) => match parse_date(text) {
                        Some(date) => {
                            dialog.query.departure_date = Some(date);
                            dialog.step = STEP_SEARCH;
                        }
                        None => {
                            replies.push(Activity::message(
                                "I didn't catch that date. Please use YYYY-MM-DD, for example 2025-07-15.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message(
                            "What date would you like to travel? (YYYY-MM-DD)",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_SEARCH => {
                let offers = flights.search_offers(&dialog.query).await?;

                let mut listing = String::from("Here's what I found:\n");
                for (i, offer) in offers.iter().enumerate() {
                    listing.push_str(&offer_line(i, offer));
                    listing.push('\n');
                }
                replies.push(Activity::message(listing.trim_end()));
                replies.push(Activity::card(cards::options_card(Some(&offers))));

                session.store_offers(offers);
                return Ok(DialogTurn::complete(replies));
            }
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
