//! Adaptive card builders
//!
//! Cards are plain JSON bodies wrapped in an [`Attachment`]. Their submit
//! actions carry an `intent` field the bot routes on exactly like a
//! recognized intent, so pressing a button and typing the request behave
//! the same.

use crate::activity::Attachment;
use crate::flights::FlightOffer;
use serde_json::{json, Value};

const SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const CARD_VERSION: &str = "1.3";

/// Greeting card shown when a user joins the conversation.
pub fn welcome_card() -> Attachment {
    Attachment::adaptive_card(json!({
        "$schema": SCHEMA,
        "type": "AdaptiveCard",
        "version": CARD_VERSION,
        "body": [
            {
                "type": "TextBlock",
                "text": "Welcome to FlightDesk",
                "size": "Large",
                "weight": "Bolder"
            },
            {
                "type": "TextBlock",
                "text": "I can search for flights, compare prices, book tickets, and manage your itinerary. What would you like to do?",
                "wrap": true
            }
        ],
        "actions": [
            { "type": "Action.Submit", "title": "Search Flights", "data": { "intent": "SearchFlights" } },
            { "type": "Action.Submit", "title": "Book a Flight", "data": { "intent": "BookFlight" } },
            { "type": "Action.Submit", "title": "Compare Prices", "data": { "intent": "CompareFlights" } },
            { "type": "Action.Submit", "title": "Manage Itinerary", "data": { "intent": "ManageItinerary" } }
        ]
    }))
}

/// Follow-up menu sent after a flow completes.
///
/// With offers on hand the card also offers booking one of them; the search
/// action resets any dialog state left behind.
pub fn options_card(offers: Option<&[FlightOffer]>) -> Attachment {
    let mut actions = vec![json!({
        "type": "Action.Submit",
        "title": "Search Another Flight",
        "data": { "intent": "SearchFlights", "resetDialog": true }
    })];
    if offers.is_some_and(|o| !o.is_empty()) {
        actions.push(json!({
            "type": "Action.Submit",
            "title": "Book a Flight",
            "data": { "intent": "BookTicket" }
        }));
    }
    actions.push(json!({
        "type": "Action.Submit",
        "title": "Compare Prices",
        "data": { "intent": "CompareFlights" }
    }));

    Attachment::adaptive_card(json!({
        "$schema": SCHEMA,
        "type": "AdaptiveCard",
        "version": CARD_VERSION,
        "body": [
            {
                "type": "TextBlock",
                "text": "What would you like to do next?",
                "wrap": true
            }
        ],
        "actions": actions
    }))
}

/// One search result as a card with a "Select Flight" action.
///
/// The submission carries the flight number so the booking flow can find
/// the offer again in the session.
pub fn offer_card(offer: &FlightOffer) -> Attachment {
    Attachment::adaptive_card(json!({
        "$schema": SCHEMA,
        "type": "AdaptiveCard",
        "version": CARD_VERSION,
        "body": [
            {
                "type": "TextBlock",
                "text": format!("{} {}", offer.airline, offer.flight_number),
                "size": "Medium",
                "weight": "Bolder"
            },
            {
                "type": "ColumnSet",
                "columns": [
                    {
                        "type": "Column",
                        "width": "stretch",
                        "items": [
                            { "type": "TextBlock", "text": format!("{} → {}", offer.origin, offer.destination), "wrap": true },
                            { "type": "TextBlock", "text": format!("{} · departs {} · arrives {}", offer.departure_date, offer.departure_time, offer.arrival_time), "isSubtle": true, "wrap": true },
                            { "type": "TextBlock", "text": format!("{} · {} · {} seats left", offer.duration, offer.cabin_class, offer.available_seats), "isSubtle": true, "wrap": true }
                        ]
                    },
                    {
                        "type": "Column",
                        "width": "auto",
                        "items": [
                            { "type": "TextBlock", "text": format!("${:.0}", offer.price), "size": "Large", "weight": "Bolder" }
                        ]
                    }
                ]
            }
        ],
        "actions": [
            {
                "type": "Action.Submit",
                "title": "Select Flight",
                "data": { "intent": "BookTicket", "flightNumber": offer.flight_number }
            }
        ]
    }))
}
