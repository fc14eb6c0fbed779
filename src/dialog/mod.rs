//! Waterfall dialog flows
//!
//! A flow is a fixed sequence of steps that collects one field per turn.
//! [`DialogState`] records which flow is active, how far it has gotten, and
//! the values gathered so far; it lives on the session between turns. Fields
//! already present (prefilled from recognized entities or a card submission)
//! are skipped rather than re-asked.
//!
//! Every user turn is screened for interruptions before it reaches the
//! active flow: "help" or "?" answers with guidance and leaves the flow
//! where it was, "cancel" or "quit" abandons it.

use crate::activity::Activity;
use crate::error::{DialogError, Result};
use crate::flights::{BookingRecord, FlightApi, FlightOffer, FlightQuery};
use crate::session::Session;
use crate::types::BookingRef;
use aho_corasick::{AhoCorasick, MatchKind};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod comparison;
pub mod flight_booking;
pub mod flight_search;
pub mod itinerary;
pub mod ticket_booking;

/// Which waterfall flow a dialog state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Full guided booking: trip details, confirmation, then offers
    FlightBooking,
    /// Quick search: origin, destination, date
    FlightSearch,
    /// Search plus best-price and fastest rankings
    Comparison,
    /// Book one of the offers from an earlier search
    TicketBooking,
    /// Look up and act on an existing booking
    Itinerary,
}

impl FlowKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlightBooking => "flight_booking",
            Self::FlightSearch => "flight_search",
            Self::Comparison => "comparison",
            Self::TicketBooking => "ticket_booking",
            Self::Itinerary => "itinerary",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Passenger details while the booking flow is still collecting them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassengerDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub payment_method: Option<String>,
}

/// Persistent state of the active flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogState {
    /// Which flow is running
    pub flow: FlowKind,
    /// Index of the step currently awaiting input
    pub step: usize,
    /// Trip parameters collected so far
    #[serde(default)]
    pub query: FlightQuery,
    /// Explicit one-way choice; distinguishes "no return flight" from
    /// "not asked yet"
    #[serde(default)]
    pub one_way: bool,
    /// Passenger details collected so far
    #[serde(default)]
    pub passenger: PassengerDraft,
    /// Offer picked for booking
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selected_offer: Option<FlightOffer>,
    /// Reference entered in the itinerary flow
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub booking_reference: Option<BookingRef>,
    /// Booking looked up or created by the flow
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub booking: Option<BookingRecord>,
}

impl DialogState {
    pub fn new(flow: FlowKind) -> Self {
        Self {
            flow,
            step: 0,
            query: FlightQuery::default(),
            one_way: false,
            passenger: PassengerDraft::default(),
            selected_offer: None,
            booking_reference: None,
            booking: None,
        }
    }

    /// Start a flow with fields already filled in from recognized entities.
    pub fn with_query(flow: FlowKind, query: FlightQuery) -> Self {
        Self {
            query,
            ..Self::new(flow)
        }
    }
}

/// Whether the flow is waiting on the user or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A prompt was sent; the dialog stays active
    Waiting,
    /// The flow ran to completion (or was abandoned)
    Complete,
}

/// What one dialog turn produced
#[derive(Debug, Clone)]
pub struct DialogTurn {
    /// Messages to send back, in order
    pub replies: Vec<Activity>,
    pub outcome: StepOutcome,
}

impl DialogTurn {
    pub fn waiting(replies: Vec<Activity>) -> Self {
        Self {
            replies,
            outcome: StepOutcome::Waiting,
        }
    }

    pub fn complete(replies: Vec<Activity>) -> Self {
        Self {
            replies,
            outcome: StepOutcome::Complete,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.outcome == StepOutcome::Waiting
    }
}

pub const HELP_TEXT: &str = "I can help you search for flights, compare prices, \
book a ticket, or manage an existing booking. Answer the question above to \
continue, or say \"cancel\" to stop.";

const CANCELLED_TEXT: &str = "Okay, I've cancelled that. Is there anything else I can help with?";

enum Interruption {
    Help,
    Cancel,
}

static INTERRUPTS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(["help", "?", "cancel", "quit"])
        .expect("valid interrupt patterns")
});

/// Classify an utterance as an interruption, but only when the whole message
/// is the keyword ("cancel"), not when it merely contains one ("Cancun").
fn interruption(input: &str) -> Option<Interruption> {
    let trimmed = input.trim();
    let hit = INTERRUPTS.find(trimmed)?;
    if hit.start() != 0 || hit.end() != trimmed.len() {
        return None;
    }
    match hit.pattern().as_usize() {
        0 | 1 => Some(Interruption::Help),
        _ => Some(Interruption::Cancel),
    }
}

/// Run one turn of the session's active flow.
///
/// `input` is the user's message for this turn, or `None` when the flow has
/// just been started and should issue its first prompt. The dialog is
/// removed from the session while the step runs and put back only if the
/// flow is still waiting; an error therefore also ends the flow.
pub async fn drive(
    session: &mut Session,
    input: Option<&str>,
    flights: &dyn FlightApi,
) -> Result<DialogTurn> {
    let mut dialog = session
        .dialog
        .take()
        .ok_or_else(|| DialogError::NoActiveDialog(session.conversation_id.clone()))?;

    if let Some(text) = input {
        match interruption(text) {
            Some(Interruption::Help) => {
                debug!(flow = %dialog.flow, "help interruption");
                session.dialog = Some(dialog);
                return Ok(DialogTurn::waiting(vec![Activity::message(HELP_TEXT)]));
            }
            Some(Interruption::Cancel) => {
                debug!(flow = %dialog.flow, "cancel interruption");
                return Ok(DialogTurn::complete(vec![Activity::message(
                    CANCELLED_TEXT,
                )]));
            }
            None => {}
        }
    }

    let turn = match dialog.flow {
        FlowKind::FlightBooking => flight_booking::run(&mut dialog, session, input, flights).await,
        FlowKind::FlightSearch => flight_search::run(&mut dialog, session, input, flights).await,
        FlowKind::Comparison => comparison::run(&mut dialog, session, input, flights).await,
        FlowKind::TicketBooking => ticket_booking::run(&mut dialog, session, input, flights).await,
        FlowKind::Itinerary => itinerary::run(&mut dialog, session, input, flights).await,
    }?;

    if turn.is_waiting() {
        session.dialog = Some(dialog);
    }
    session.touch();
    Ok(turn)
}

/// Validate a user-entered travel date, returning it normalized.
pub(crate) fn parse_date(text: &str) -> Option<String> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    Some(trimmed.to_string())
}

pub(crate) fn is_yes(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "yes" | "y" | "yeah" | "yep" | "sure" | "ok" | "okay"
    )
}

pub(crate) fn is_no(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "no" | "n" | "nope")
}

/// Inputs that mean "no return flight" at the return-date prompt.
pub(crate) fn is_one_way_answer(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "none" | "no" | "skip" | "one way" | "one-way" | "oneway" | "-"
    )
}

/// One line of an offer for numbered text listings.
pub(crate) fn offer_line(index: usize, offer: &FlightOffer) -> String {
    format!(
        "{}. {} {} — {} to {} on {}, departs {}, arrives {}, {} — ${:.0} ({})",
        index + 1,
        offer.airline,
        offer.flight_number,
        offer.origin,
        offer.destination,
        offer.departure_date,
        offer.departure_time,
        offer.arrival_time,
        offer.duration,
        offer.price,
        offer.cabin_class
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights::MockFlightClient;
    use crate::types::ConversationId;

    fn session() -> Session {
        Session::new(ConversationId::new("conv-1"))
    }

    #[test]
    fn test_interruption_whole_message_only() {
        assert!(matches!(interruption("help"), Some(Interruption::Help)));
        assert!(matches!(interruption("  HELP  "), Some(Interruption::Help)));
        assert!(matches!(interruption("?"), Some(Interruption::Help)));
        assert!(matches!(
            interruption("cancel"),
            Some(Interruption::Cancel)
        ));
        assert!(matches!(interruption("Quit"), Some(Interruption::Cancel)));
        // Keywords embedded in a longer message are ordinary input
        assert!(interruption("I want to fly to Cancun").is_none());
        assert!(interruption("can you help me book").is_none());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-07-15").as_deref(), Some("2025-07-15"));
        assert_eq!(parse_date(" 2025-07-15 ").as_deref(), Some("2025-07-15"));
        assert_eq!(parse_date("15/07/2025"), None);
        assert_eq!(parse_date("2025-13-40"), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn test_one_way_answers() {
        for answer in ["none", "No", "skip", "one way", "one-way", "-"] {
            assert!(is_one_way_answer(answer), "{answer} should mean one-way");
        }
        assert!(!is_one_way_answer("2025-08-01"));
    }

    #[tokio::test]
    async fn test_drive_without_active_dialog_is_an_error() {
        let mut session = session();
        let flights = MockFlightClient::new();
        let err = drive(&mut session, Some("hello"), &flights)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::BotError::Dialog(DialogError::NoActiveDialog(_))
        ));
    }

    #[tokio::test]
    async fn test_help_keeps_dialog_active() {
        let mut session = session();
        session.dialog = Some(DialogState::new(FlowKind::FlightSearch));
        let flights = MockFlightClient::new();

        let turn = drive(&mut session, Some("help"), &flights).await.unwrap();
        assert!(turn.is_waiting());
        assert!(session.dialog_active());
        assert_eq!(turn.replies[0].text.as_deref(), Some(HELP_TEXT));
    }

    #[tokio::test]
    async fn test_cancel_ends_dialog() {
        let mut session = session();
        session.dialog = Some(DialogState::new(FlowKind::FlightSearch));
        let flights = MockFlightClient::new();

        let turn = drive(&mut session, Some("cancel"), &flights).await.unwrap();
        assert_eq!(turn.outcome, StepOutcome::Complete);
        assert!(!session.dialog_active());
    }
}
