//! # FlightDesk - Conversational Flight Booking
//!
//! FlightDesk is a chat assistant for searching, comparing, and booking
//! flights. It speaks the common bot-channel activity format over a single
//! webhook, routes each message through NLU intent recognition, and walks
//! users through multi-step waterfall dialogs that collect one trip detail
//! per turn.
//!
//! ## Features
//!
//! - 🛫 **Five guided flows**: quick search, full booking, price/duration
//!   comparison, ticket booking, and itinerary management
//! - 🧠 **Intent routing**: remote CLU recognition with entity extraction,
//!   so "book a flight from Delhi to Mumbai on 2025-12-15" skips the
//!   questions it already answers
//! - 🃏 **Adaptive cards**: welcome menu, per-offer cards with select
//!   actions, and follow-up option menus
//! - ⏸️ **Interruptions**: "help" answers in place, "cancel" abandons the
//!   flow, at any step
//! - 🔌 **Pluggable backends**: session storage, recognizer, and flight API
//!   are traits with working in-process defaults
//! - 📴 **Degrades offline**: without external services the bot runs
//!   entirely on fixture data
//!
//! ## Quick Start
//!
//! ```
//! use flightdesk::activity::Activity;
//! use flightdesk::bot::FlightBot;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // All defaults: in-memory sessions, fixture offers, no NLU
//! let bot = FlightBot::builder().build();
//!
//! let activity: Activity = serde_json::from_value(serde_json::json!({
//!     "type": "message",
//!     "text": "hello",
//!     "conversation": { "id": "conv-1" }
//! }))?;
//!
//! let replies = bot.process_activity(&activity).await?;
//! assert!(!replies.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Running as a service is one call more: [`server::serve`] binds the
//! webhook (`POST /api/messages`) and `GET /healthz`. The `flightdesk`
//! binary does exactly that, wiring the optional CLU and flight-API
//! integrations from the environment (see [`config`]).
//!
//! ## Module Overview
//!
//! - [`bot`]: turn processing and intent routing
//! - [`dialog`]: waterfall flows and interruption handling
//! - [`recognizer`]: intent/entity recognition, CLU client
//! - [`flights`]: offer search and booking backends
//! - [`cards`]: adaptive card builders
//! - [`activity`]: the wire format of the webhook
//! - [`session`] / [`storage`]: per-conversation state and where it lives
//! - [`server`]: the axum HTTP surface
//! - [`config`]: environment configuration
//! - [`error`]: error types and result aliases

pub mod activity;
pub mod bot;
pub mod cards;
pub mod config;
pub mod dialog;
pub mod error;
pub mod flights;
pub mod recognizer;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

pub use activity::{Activity, ActivityType, Attachment};
pub use bot::{FlightBot, FlightBotBuilder};
pub use dialog::{DialogState, DialogTurn, FlowKind, StepOutcome};
pub use error::{BotError, Result};
pub use flights::{FlightApi, FlightOffer, FlightQuery, MockFlightClient, RemoteFlightClient};
pub use recognizer::{CluRecognizer, Intent, IntentRecognizer, Recognition};
pub use session::Session;
pub use storage::{memory::InMemorySessionStore, SessionStore};
pub use types::{BookingRef, ConversationId, MessageId, OfferId};
