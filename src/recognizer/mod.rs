//! Intent and entity recognition
//!
//! The bot routes on a small closed set of intents. Recognition is delegated
//! to a remote conversational-language-understanding service (see [`clu`]);
//! when no service is configured, or the service fails, recognition degrades
//! to [`Recognition::none`] and the bot leans on card-submitted intents
//! instead. A recognizer never fails a turn.

use crate::flights::CabinClass;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod clu;

pub use clu::{CluConfig, CluRecognizer};

/// Intents the bot routes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Guided booking: collect a full trip and show offers
    BookFlight,
    /// Quick search: origin, destination, date
    SearchFlights,
    /// Price/duration comparison of matching offers
    CompareFlights,
    /// Book one of the offers from an earlier search
    BookTicket,
    /// Look up or change an existing booking
    ManageItinerary,
    /// Abandon whatever is going on
    Cancel,
    /// Unrecognized input
    None,
}

impl Intent {
    /// Parse an intent label from the NLU service or a card submission.
    pub fn from_label(label: &str) -> Self {
        match label {
            "BookFlight" => Self::BookFlight,
            "SearchFlights" => Self::SearchFlights,
            "CompareFlights" => Self::CompareFlights,
            "BookTicket" => Self::BookTicket,
            "ManageItinerary" => Self::ManageItinerary,
            "Cancel" => Self::Cancel,
            _ => Self::None,
        }
    }
}

/// Entities pulled out of a single utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntities {
    /// Departure city text
    pub from_city: Option<String>,
    /// Destination city text
    pub to_city: Option<String>,
    /// Travel date (date part only, "2025-07-15")
    pub date: Option<String>,
    /// Number of travelers
    pub travelers: Option<u32>,
    /// Cabin class text as uttered
    pub cabin_class: Option<String>,
}

impl RecognizedEntities {
    /// Cabin class parsed into the closed enum, if the text maps to one.
    pub fn parsed_cabin_class(&self) -> Option<CabinClass> {
        self.cabin_class.as_deref().and_then(CabinClass::parse)
    }
}

/// Result of running recognition over one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// The utterance that was analyzed
    pub text: String,
    /// Intent labels with confidence scores
    pub intents: HashMap<String, f32>,
    /// Extracted entities
    pub entities: RecognizedEntities,
}

impl Recognition {
    /// Default result: `None` intent with full confidence, no entities.
    pub fn none(text: impl Into<String>) -> Self {
        let mut intents = HashMap::new();
        intents.insert("None".to_string(), 1.0);
        Self {
            text: text.into(),
            intents,
            entities: RecognizedEntities::default(),
        }
    }

    /// The highest-scoring intent.
    pub fn top_intent(&self) -> Intent {
        self.intents
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, _)| Intent::from_label(label))
            .unwrap_or(Intent::None)
    }
}

/// Trait for intent recognizers
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Analyze one utterance.
    ///
    /// Implementations swallow their own failures and return
    /// [`Recognition::none`]; a broken NLU service must not break the turn.
    async fn recognize(&self, utterance: &str) -> Recognition;
}

/// Recognizer used when no NLU service is configured.
///
/// Always returns the default result, so routing falls through to card
/// submissions and the help text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredRecognizer;

#[async_trait]
impl IntentRecognizer for UnconfiguredRecognizer {
    async fn recognize(&self, utterance: &str) -> Recognition {
        Recognition::none(utterance)
    }
}
