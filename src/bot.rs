//! Turn processing
//!
//! [`FlightBot`] is the piece the webhook hands each inbound activity to.
//! A turn loads (or creates) the conversation's session, records history,
//! routes the activity, saves the session back, and returns the replies.
//!
//! Routing order: an active dialog flow consumes the turn first. Otherwise
//! a card-submitted intent wins over the recognizer, and the recognizer's
//! top intent decides which flow starts. Errors never leak to the channel;
//! they are converted to user-facing messages here.

use crate::activity::{Activity, ActivityType};
use crate::cards;
use crate::dialog::{self, DialogState, FlowKind};
use crate::error::{BotError, FlightError, Result};
use crate::flights::{FlightApi, FlightQuery, MockFlightClient};
use crate::recognizer::{Intent, IntentRecognizer, RecognizedEntities, UnconfiguredRecognizer};
use crate::session::{HistoryEntry, Session};
use crate::storage::{memory::InMemorySessionStore, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub(crate) const GENERIC_ERROR_TEXT: &str = "The bot encountered an error. Please try again later.";

const DEFAULT_REPLY: &str = "I'm not sure I understood that. I can search for \
flights, compare prices, book a ticket, or manage an existing booking.";

/// The conversational flight assistant
pub struct FlightBot {
    store: Arc<dyn SessionStore>,
    recognizer: Arc<dyn IntentRecognizer>,
    flights: Arc<dyn FlightApi>,
}

/// Builder for [`FlightBot`]
///
/// Every component has an in-process default, so `FlightBot::builder().build()`
/// yields a bot that works without any external service.
#[derive(Default)]
pub struct FlightBotBuilder {
    store: Option<Arc<dyn SessionStore>>,
    recognizer: Option<Arc<dyn IntentRecognizer>>,
    flights: Option<Arc<dyn FlightApi>>,
}

impl FlightBotBuilder {
    pub fn store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn recognizer(mut self, recognizer: impl IntentRecognizer + 'static) -> Self {
        self.recognizer = Some(Arc::new(recognizer));
        self
    }

    pub fn flights(mut self, flights: impl FlightApi + 'static) -> Self {
        self.flights = Some(Arc::new(flights));
        self
    }

    pub fn build(self) -> FlightBot {
        FlightBot {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemorySessionStore::new())),
            recognizer: self
                .recognizer
                .unwrap_or_else(|| Arc::new(UnconfiguredRecognizer)),
            flights: self
                .flights
                .unwrap_or_else(|| Arc::new(MockFlightClient::new())),
        }
    }
}

impl Default for FlightBot {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FlightBot {
    pub fn builder() -> FlightBotBuilder {
        FlightBotBuilder::default()
    }

    /// Process one inbound activity and return the replies to send.
    pub async fn process_activity(&self, activity: &Activity) -> Result<Vec<Activity>> {
        match activity.activity_type {
            ActivityType::ConversationUpdate => Ok(self.handle_conversation_update(activity)),
            ActivityType::Message => self.handle_message(activity).await,
            ActivityType::Other => Ok(Vec::new()),
        }
    }

    fn handle_conversation_update(&self, activity: &Activity) -> Vec<Activity> {
        let bot_id = activity.recipient.as_ref().map(|r| r.id.as_str()).unwrap_or("");
        if activity.added_someone_besides(bot_id) {
            debug!("greeting new conversation member");
            vec![Activity::card(cards::welcome_card())]
        } else {
            Vec::new()
        }
    }

    async fn handle_message(&self, activity: &Activity) -> Result<Vec<Activity>> {
        let conversation_id = activity
            .conversation_id()
            .ok_or_else(|| BotError::InvalidActivity("message has no conversation".to_string()))?
            .clone();

        let (mut session, is_new) = match self.store.get(&conversation_id).await? {
            Some(session) => (session, false),
            None => {
                info!(conversation = %conversation_id, "starting new session");
                (Session::new(conversation_id.clone()), true)
            }
        };

        let text = activity.trimmed_text();
        if let Some(text) = text {
            session.record(HistoryEntry::user(text));
        }
        if activity.reset_requested() {
            session.cancel_dialog();
        }

        let replies = self.route(activity, &mut session, text).await;

        for reply in &replies {
            if let Some(reply_text) = &reply.text {
                session.record(HistoryEntry::bot(reply_text.clone()));
            }
        }

        if is_new {
            self.store.create(session).await?;
        } else {
            self.store.update(&conversation_id, session).await?;
        }

        Ok(replies)
    }

    async fn route(
        &self,
        activity: &Activity,
        session: &mut Session,
        text: Option<&str>,
    ) -> Vec<Activity> {
        // An active flow owns the turn. Card presses are no exception: the
        // resetDialog flag (already applied by the caller) is the one way to
        // replace a waiting flow.
        if session.dialog_active() {
            return self.continue_dialog(session, text).await;
        }

        let (intent, entities) = match activity.submitted_intent().map(Intent::from_label) {
            Some(intent) => (intent, RecognizedEntities::default()),
            None => match text {
                Some(utterance) => {
                    let recognition = self.recognizer.recognize(utterance).await;
                    (recognition.top_intent(), recognition.entities)
                }
                None => (Intent::None, RecognizedEntities::default()),
            },
        };
        debug!(conversation = %session.conversation_id, ?intent, "routing turn");

        match intent {
            Intent::BookFlight => {
                self.start_flow(
                    session,
                    DialogState::with_query(FlowKind::FlightBooking, query_from(&entities)),
                )
                .await
            }
            Intent::SearchFlights => {
                self.start_flow(
                    session,
                    DialogState::with_query(FlowKind::FlightSearch, query_from(&entities)),
                )
                .await
            }
            Intent::CompareFlights => {
                self.start_flow(
                    session,
                    DialogState::with_query(FlowKind::Comparison, query_from(&entities)),
                )
                .await
            }
            Intent::BookTicket => {
                let mut dialog = DialogState::new(FlowKind::TicketBooking);
                // An offer-card press names the flight; an options-card press
                // falls back to the first stored offer.
                dialog.selected_offer = activity
                    .submitted_flight_number()
                    .and_then(|number| dialog::ticket_booking::find_offer(&session.offers, number))
                    .or_else(|| session.offers.first())
                    .cloned();
                self.start_flow(session, dialog).await
            }
            Intent::ManageItinerary => {
                self.start_flow(session, DialogState::new(FlowKind::Itinerary))
                    .await
            }
            Intent::Cancel => {
                session.cancel_dialog();
                vec![Activity::message("Cancelling your request.")]
            }
            Intent::None => vec![
                Activity::message(DEFAULT_REPLY),
                Activity::card(cards::options_card(None)),
            ],
        }
    }

    async fn start_flow(&self, session: &mut Session, dialog: DialogState) -> Vec<Activity> {
        session.cancel_dialog();
        session.dialog = Some(dialog);
        self.continue_dialog(session, None).await
    }

    async fn continue_dialog(&self, session: &mut Session, input: Option<&str>) -> Vec<Activity> {
        match dialog::drive(session, input, self.flights.as_ref()).await {
            Ok(turn) => turn.replies,
            // drive() already dropped the failed flow from the session
            Err(err) => error_replies(&err),
        }
    }
}

/// Prefill a trip query from recognized entities.
fn query_from(entities: &RecognizedEntities) -> FlightQuery {
    FlightQuery {
        origin: entities.from_city.clone(),
        destination: entities.to_city.clone(),
        departure_date: entities
            .date
            .as_deref()
            .and_then(dialog::parse_date),
        return_date: None,
        travelers: entities.travelers,
        cabin_class: entities.parsed_cabin_class(),
    }
}

fn error_replies(err: &BotError) -> Vec<Activity> {
    match err {
        BotError::FlightApi(FlightError::UnknownAirport(city)) => {
            warn!(city = %city, "no airport code for city");
            vec![
                Activity::message(format!(
                    "I couldn't find an airport for \"{}\". Please try a major city name \
                     or a 3-letter airport code.",
                    city
                )),
                Activity::card(cards::options_card(None)),
            ]
        }
        BotError::FlightApi(FlightError::NoOffers) => vec![
            Activity::message(
                "I couldn't find any flights matching those criteria. \
                 Try different dates or nearby cities.",
            ),
            Activity::card(cards::options_card(None)),
        ],
        other => {
            error!(error = %other, "turn failed");
            vec![Activity::message(GENERIC_ERROR_TEXT)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights::mock::fixture_offers;
    use crate::recognizer::Recognition;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// Recognizer that always answers with a fixed intent and entities.
    struct FixedRecognizer {
        intent: &'static str,
        entities: RecognizedEntities,
    }

    impl FixedRecognizer {
        fn new(intent: &'static str) -> Self {
            Self {
                intent,
                entities: RecognizedEntities::default(),
            }
        }
    }

    #[async_trait]
    impl IntentRecognizer for FixedRecognizer {
        async fn recognize(&self, utterance: &str) -> Recognition {
            let mut intents = HashMap::new();
            intents.insert(self.intent.to_string(), 0.95);
            Recognition {
                text: utterance.to_string(),
                intents,
                entities: self.entities.clone(),
            }
        }
    }

    fn message_in(conversation: &str, text: &str) -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "text": text,
            "from": { "id": "user-1" },
            "recipient": { "id": "bot-1" },
            "conversation": { "id": conversation }
        }))
        .unwrap()
    }

    fn card_submission(conversation: &str, value: serde_json::Value) -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "value": value,
            "from": { "id": "user-1" },
            "recipient": { "id": "bot-1" },
            "conversation": { "id": conversation }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_member_added_gets_welcome_card() {
        let bot = FlightBot::builder().build();
        let activity: Activity = serde_json::from_value(json!({
            "type": "conversationUpdate",
            "membersAdded": [{ "id": "user-1" }],
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();

        let replies = bot.process_activity(&activity).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_bot_added_alone_gets_no_greeting() {
        let bot = FlightBot::builder().build();
        let activity: Activity = serde_json::from_value(json!({
            "type": "conversationUpdate",
            "membersAdded": [{ "id": "bot-1" }],
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();

        let replies = bot.process_activity(&activity).await.unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_text_gets_default_reply() {
        let bot = FlightBot::builder().build();
        let replies = bot
            .process_activity(&message_in("conv-1", "what's the weather"))
            .await
            .unwrap();
        assert!(replies[0].text.as_deref().unwrap().contains("not sure"));
        assert_eq!(replies[1].attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_search_intent_starts_flow_and_persists_session() {
        let store = InMemorySessionStore::new();
        let bot = FlightBot::builder()
            .store(store.clone())
            .recognizer(FixedRecognizer::new("SearchFlights"))
            .build();

        let replies = bot
            .process_activity(&message_in("conv-1", "find me a flight"))
            .await
            .unwrap();
        assert!(replies[0].text.as_deref().unwrap().contains("from"));

        let session = store
            .get(&"conv-1".into())
            .await
            .unwrap()
            .expect("session saved");
        assert!(session.dialog_active());
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn test_entities_prefill_booking_flow() {
        let bot = FlightBot::builder()
            .recognizer(FixedRecognizer {
                intent: "BookFlight",
                entities: RecognizedEntities {
                    from_city: Some("New Delhi".to_string()),
                    to_city: Some("Mumbai".to_string()),
                    date: Some("2025-12-15".to_string()),
                    travelers: None,
                    cabin_class: None,
                },
            })
            .build();

        let replies = bot
            .process_activity(&message_in(
                "conv-1",
                "book a flight from delhi to mumbai on 2025-12-15",
            ))
            .await
            .unwrap();
        // Origin, destination, and date were extracted, so the first
        // question is the return date
        assert!(replies[0].text.as_deref().unwrap().contains("coming back"));
    }

    #[tokio::test]
    async fn test_active_dialog_consumes_plain_text() {
        let bot = FlightBot::builder()
            .recognizer(FixedRecognizer::new("SearchFlights"))
            .build();

        bot.process_activity(&message_in("conv-1", "find me a flight"))
            .await
            .unwrap();
        // "London" would recognize as SearchFlights again, but the active
        // flow takes it as the origin answer
        let replies = bot
            .process_activity(&message_in("conv-1", "London"))
            .await
            .unwrap();
        assert!(replies[0].text.as_deref().unwrap().contains("to"));
    }

    #[tokio::test]
    async fn test_help_interruption_mid_flow() {
        let bot = FlightBot::builder()
            .recognizer(FixedRecognizer::new("SearchFlights"))
            .build();

        bot.process_activity(&message_in("conv-1", "find me a flight"))
            .await
            .unwrap();
        let replies = bot
            .process_activity(&message_in("conv-1", "help"))
            .await
            .unwrap();
        assert_eq!(replies[0].text.as_deref(), Some(dialog::HELP_TEXT));
    }

    #[tokio::test]
    async fn test_offer_card_press_starts_ticket_booking() {
        let store = InMemorySessionStore::new();
        let bot = FlightBot::builder().store(store.clone()).build();

        // Seed a session with offers as if a search just finished
        let mut session = Session::new("conv-1".into());
        session.store_offers(fixture_offers(&FlightQuery::default()));
        store.create(session).await.unwrap();

        let replies = bot
            .process_activity(&card_submission(
                "conv-1",
                json!({ "intent": "BookTicket", "flightNumber": "IG202" }),
            ))
            .await
            .unwrap();
        // Selection was carried by the card, so the flow asks for the name
        assert!(replies[0].text.as_deref().unwrap().contains("name"));

        let session = store.get(&"conv-1".into()).await.unwrap().unwrap();
        let dialog = session.dialog.as_ref().unwrap();
        assert_eq!(
            dialog.selected_offer.as_ref().unwrap().flight_number,
            "IG202"
        );
    }

    #[tokio::test]
    async fn test_card_press_without_reset_keeps_active_flow() {
        let store = InMemorySessionStore::new();
        let bot = FlightBot::builder()
            .store(store.clone())
            .recognizer(FixedRecognizer::new("SearchFlights"))
            .build();

        bot.process_activity(&message_in("conv-1", "find me a flight"))
            .await
            .unwrap();
        bot.process_activity(&message_in("conv-1", "London"))
            .await
            .unwrap();

        // A card intent without resetDialog must not replace the waiting flow
        let replies = bot
            .process_activity(&card_submission(
                "conv-1",
                json!({ "intent": "CompareFlights" }),
            ))
            .await
            .unwrap();
        // The flow reissues its current prompt instead of starting over
        assert!(replies[0].text.as_deref().unwrap().contains("to"));

        let session = store.get(&"conv-1".into()).await.unwrap().unwrap();
        let dialog = session.dialog.as_ref().expect("flow still active");
        assert_eq!(dialog.flow, FlowKind::FlightSearch);
        assert_eq!(
            dialog.query.origin.as_deref(),
            Some("London"),
            "collected answers survive the card press"
        );
    }

    #[tokio::test]
    async fn test_reset_card_abandons_active_flow() {
        let bot = FlightBot::builder()
            .recognizer(FixedRecognizer::new("BookFlight"))
            .build();

        bot.process_activity(&message_in("conv-1", "book a flight"))
            .await
            .unwrap();
        let replies = bot
            .process_activity(&card_submission(
                "conv-1",
                json!({ "intent": "SearchFlights", "resetDialog": true }),
            ))
            .await
            .unwrap();
        // Fresh search flow, not the booking flow's next prompt
        assert!(replies[0].text.as_deref().unwrap().contains("flying from"));
    }

    #[tokio::test]
    async fn test_cancel_intent_replies_and_clears_dialog() {
        let store = InMemorySessionStore::new();
        let bot = FlightBot::builder()
            .store(store.clone())
            .recognizer(FixedRecognizer::new("Cancel"))
            .build();

        let replies = bot
            .process_activity(&message_in("conv-1", "forget it"))
            .await
            .unwrap();
        assert!(replies[0].text.as_deref().unwrap().contains("Cancelling"));

        let session = store.get(&"conv-1".into()).await.unwrap().unwrap();
        assert!(!session.dialog_active());
    }

    #[tokio::test]
    async fn test_message_without_conversation_is_invalid() {
        let bot = FlightBot::builder().build();
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "text": "hello"
        }))
        .unwrap();

        let err = bot.process_activity(&activity).await.unwrap_err();
        assert!(matches!(err, BotError::InvalidActivity(_)));
    }
}
