//! Error types for the flightdesk bot
//!
//! Errors are grouped per concern with thiserror. Turn processing in
//! [`crate::bot`] converts them into user-facing chat messages; nothing here
//! is ever shown to the user verbatim.

use crate::types::{BookingRef, ConversationId};
use thiserror::Error;

/// Main error type for bot operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BotError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Dialog execution error
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// Intent recognition error
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    /// Flight API error
    #[error("Flight API error: {0}")]
    FlightApi(#[from] FlightError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid inbound activity
    #[error("Invalid activity: {0}")]
    InvalidActivity(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage-related errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Serialization failed
    #[error("Storage serialization failed: {0}")]
    Serialization(String),

    /// Internal storage error
    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Dialog-related errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DialogError {
    /// No dialog flow is active for the session
    #[error("No active dialog for conversation: {0}")]
    NoActiveDialog(ConversationId),

    /// A step index outside the flow's step list was reached
    #[error("Dialog step out of range: step {step} in {flow}")]
    StepOutOfRange { flow: String, step: usize },

    /// A step needed a field that was never collected
    #[error("Missing dialog field: {0}")]
    MissingField(String),

    /// Internal dialog error
    #[error("Internal dialog error: {0}")]
    Internal(String),
}

/// Recognizer-related errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecognizerError {
    /// Transport failure talking to the NLU service
    #[error("NLU request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The NLU service returned a non-success status
    #[error("NLU service returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The NLU response could not be interpreted
    #[error("Unexpected NLU response: {0}")]
    Malformed(String),
}

/// Flight API errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FlightError {
    /// A city name has no entry in the airport-code table
    #[error("Could not find airport code for city: {0}")]
    UnknownAirport(String),

    /// The search completed but returned no offers
    #[error("No flights found for the given criteria")]
    NoOffers,

    /// Transport failure talking to the travel API
    #[error("Flight API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The travel API returned a non-success status
    #[error("Flight API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// No booking exists for the reference
    #[error("No booking found for reference: {0}")]
    BookingNotFound(BookingRef),

    /// The API response could not be interpreted
    #[error("Unexpected flight API response: {0}")]
    Malformed(String),
}

/// Type alias for bot results
pub type Result<T> = std::result::Result<T, BotError>;

/// Type alias for recognizer results
pub type RecognizerResult<T> = std::result::Result<T, RecognizerError>;

/// Type alias for flight API results
pub type FlightResult<T> = std::result::Result<T, FlightError>;
