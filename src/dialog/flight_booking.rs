//! Guided booking flow
//!
//! The long-form waterfall: the full trip (origin, destination, dates,
//! travelers, cabin class) is collected, summarized for confirmation, and
//! only then searched. Fields the recognizer already extracted from the
//! opening utterance are skipped. Saying "no" at the confirmation step
//! starts the collection over.

use super::{
    is_no, is_one_way_answer, is_yes, parse_date, DialogState, DialogTurn,
};
use crate::activity::Activity;
use crate::cards;
use crate::error::{DialogError, Result};
use crate::flights::{CabinClass, FlightApi, FlightQuery};
use crate::session::Session;

const STEP_ORIGIN: usize = 0;
const STEP_DESTINATION: usize = 1;
const STEP_DEPARTURE: usize = 2;
const STEP_RETURN: usize = 3;
const STEP_TRAVELERS: usize = 4;
const STEP_CABIN: usize = 5;
const STEP_CONFIRM: usize = 6;
const STEP_SEARCH: usize = 7;

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
                        replies.push(Activity::message(
                            "Let's book your flight. Which city are you departing from?",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_DESTINATION => {
                if dialog.query.destination.is_some() {
                    dialog.step = STEP_DEPARTURE;
                    continue;
                }
                match input.take() {
                    Some(text) => {
                        dialog.query.destination = Some(text.to_string());
                        dialog.step = STEP_DEPARTURE;
                    }
                    None => {
                        replies.push(Activity::message("And where are you flying to?"));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_DEPARTURE => {
                if dialog.query.departure_date.is_some() {
                    dialog.step = STEP_RETURN;
                    continue;
                }
                match input.take() {
                    Some(text) => match parse_date(text) {
                        Some(date) => {
                            dialog.query.departure_date = Some(date);
                            dialog.step = STEP_RETURN;
                        }
                        None => {
                            replies.push(Activity::message(
                                "Please enter the departure date as YYYY-MM-DD, for example 2025-07-15.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message(
                            "When would you like to depart? (YYYY-MM-DD)",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_RETURN => {
                if dialog.query.return_date.is_some() || dialog.one_way {
                    dialog.step = STEP_TRAVELERS;
                    continue;
                }
                match input.take() {
                    Some(text) if is_one_way_answer(text) => {
                        dialog.one_way = true;
                        dialog.step = STEP_TRAVELERS;
                    }
                    Some(text) => match parse_date(text) {
                        Some(date) => {
                            dialog.query.return_date = Some(date);
                            dialog.step = STEP_TRAVELERS;
                        }
                        None => {
                            replies.push(Activity::message(
                                "Please enter the return date as YYYY-MM-DD, or say \"none\" for a one-way trip.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message(
                            "When are you coming back? Enter a date (YYYY-MM-DD), or say \"none\" for one-way.",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_TRAVELERS => {
                if dialog.query.travelers.is_some() {
                    dialog.step = STEP_CABIN;
                    continue;
                }
                match input.take() {
                    Some(text) => match text.parse::<u32>() {
                        Ok(count) if count >= 1 => {
                            dialog.query.travelers = Some(count);
                            dialog.step = STEP_CABIN;
                        }
                        _ => {
                            replies.push(Activity::message(
                                "How many travelers? Please enter a number, for example 2.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message("How many travelers?"));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_CABIN => {
                if dialog.query.cabin_class.is_some() {
                    dialog.step = STEP_CONFIRM;
                    continue;
                }
                match input.take() {
                    Some(text) => match CabinClass::parse(text) {
                        Some(cabin) => {
                            dialog.query.cabin_class = Some(cabin);
                            dialog.step = STEP_CONFIRM;
                        }
                        None => {
                            replies.push(Activity::message(
                                "Which cabin class? Your options are Economy, Business, or First.",
                            ));
                            return Ok(DialogTurn::waiting(replies));
                        }
                    },
                    None => {
                        replies.push(Activity::message(
                            "Which cabin class would you like? (Economy / Business / First)",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_CONFIRM => match input.take() {
                Some(text) if is_yes(text) => {
                    dialog.step = STEP_SEARCH;
                }
                Some(text) if is_no(text) => {
                    dialog.query = FlightQuery::default();
                    dialog.one_way = false;
                    dialog.step = STEP_ORIGIN;
                    replies.push(Activity::message(
                        "No problem, let's start over.",
                    ));
                }
                Some(_) => {
                    replies.push(Activity::message("Please answer yes or no."));
                    return Ok(DialogTurn::waiting(replies));
                }
                None => {
                    replies.push(Activity::message(summary(dialog)));
                    return Ok(DialogTurn::waiting(replies));
                }
            },
            STEP_SEARCH => {
                let offers = flights.search_offers(&dialog.query).await?;

                replies.push(Activity::message("Here are the flights I found:"));
                for offer in &offers {
                    replies.push(Activity::card(cards::offer_card(offer)));
                }
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

fn summary(dialog: &DialogState) -> String {
    let query = &dialog.query;
    let unknown = || "unknown".to_string();
    let return_line = if dialog.one_way {
        "one-way".to_string()
    } else {
        query.return_date.clone().unwrap_or_else(unknown)
    };
    format!(
        "Here's what I have:\n\
         From: {}\n\
         To: {}\n\
         Departing: {}\n\
         Returning: {}\n\
         Travelers: {}\n\
         Class: {}\n\
         Shall I search for flights? (yes/no)",
        query.origin.clone().unwrap_or_else(unknown),
        query.destination.clone().unwrap_or_else(unknown),
        query.departure_date.clone().unwrap_or_else(unknown),
        return_line,
        query.travelers.map_or_else(unknown, |t| t.to_string()),
        query
            .cabin_class
            .map_or_else(unknown, |c| c.to_string()),
    )
}
