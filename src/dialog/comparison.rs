//! Price and duration comparison flow
//!
//! Same three prompts as the quick search, but the results come back ranked:
//! cheapest first and fastest first, three entries each.

use super::{offer_line, parse_date, DialogState, DialogTurn};
use crate::activity::Activity;
use crate::cards;
use crate::error::{DialogError, Result};
use crate::flights::{FlightApi, FlightOffer};
use crate::session::Session;

const STEP_ORIGIN: usize = 0;
const STEP_DESTINATION: usize = 1;
const STEP_DATE: usize = 2;
const STEP_COMPARE: usize = 3;

const RANKING_SIZE: usize = 3;

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
                            "Let's compare flights. Which city are you flying from?",
                        ));
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
                        replies.push(Activity::message("And flying to where?"));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_DATE => {
                if dialog.query.departure_date.is_some() {
                    dialog.step = STEP_COMPARE;
                    continue;
                }
                match input.take() {
                    Some(text) => match parse_date(text) {
                        Some(date) => {
                            dialog.query.departure_date = Some(date);
                            dialog.step = STEP_COMPARE;
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
                            "For which travel date? (YYYY-MM-DD)",
                        ));
                        return Ok(DialogTurn::waiting(replies));
                    }
                }
            }
            STEP_COMPARE => {
                let offers = flights.search_offers(&dialog.query).await?;

                replies.push(Activity::message(ranking(
                    "Best Price Options",
                    by_price(&offers),
                )));
                replies.push(Activity::message(ranking(
                    "Fastest Options",
                    by_duration(&offers),
                )));
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

fn by_price(offers: &[FlightOffer]) -> Vec<&FlightOffer> {
    let mut ranked: Vec<&FlightOffer> = offers.iter().collect();
    ranked.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(RANKING_SIZE);
    ranked
}

/// Offers with an unparseable duration sort last.
fn by_duration(offers: &[FlightOffer]) -> Vec<&FlightOffer> {
    let mut ranked: Vec<&FlightOffer> = offers.iter().collect();
    ranked.sort_by_key(|offer| offer.duration_minutes().unwrap_or(u32::MAX));
    ranked.truncate(RANKING_SIZE);
    ranked
}

fn ranking(title: &str, ranked: Vec<&FlightOffer>) -> String {
    let mut text = format!("{}:\n", title);
    for (i, offer) in ranked.iter().enumerate() {
        text.push_str(&offer_line(i, offer));
        text.push('\n');
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{drive, FlowKind, StepOutcome};
    use crate::flights::{mock::fixture_offers, FlightQuery, MockFlightClient};
    use crate::types::ConversationId;

    #[test]
    fn test_price_ranking_order() {
        let offers = fixture_offers(&FlightQuery::default());
        let ranked = by_price(&offers);
        // IndiGo 380 < SpiceJet 420 < AirIndia 450
        assert_eq!(ranked[0].flight_number, "IG202");
        assert_eq!(ranked[1].flight_number, "SJ303");
        assert_eq!(ranked[2].flight_number, "AI101");
    }

    #[test]
    fn test_duration_ranking_puts_mangled_last() {
        let mut offers = fixture_offers(&FlightQuery::default());
        offers[0].duration = "soon".to_string();
        let ranked = by_duration(&offers);
        assert_eq!(ranked[2].flight_number, "AI101");
    }

    #[tokio::test]
    async fn test_full_walkthrough() {
        let mut session = Session::new(ConversationId::new("conv-1"));
        session.dialog = Some(DialogState::new(FlowKind::Comparison));
        let flights = MockFlightClient::new();

        drive(&mut session, None, &flights).await.unwrap();
        drive(&mut session, Some("New Delhi"), &flights).await.unwrap();
        drive(&mut session, Some("Mumbai"), &flights).await.unwrap();

        let turn = drive(&mut session, Some("2025-12-15"), &flights)
            .await
            .unwrap();
        assert_eq!(turn.outcome, StepOutcome::Complete);

        let price_text = turn.replies[0].text.as_deref().unwrap();
        assert!(price_text.starts_with("Best Price Options"));
        assert!(price_text.contains("IG202"));

        let duration_text = turn.replies[1].text.as_deref().unwrap();
        assert!(duration_text.starts_with("Fastest Options"));

        assert_eq!(session.offers.len(), 3);
    }
}
