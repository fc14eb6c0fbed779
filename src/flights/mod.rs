//! Flight-offer search and booking
//!
//! This module defines the flat records the dialogs collect and display
//! (queries, offers, bookings) and the [`FlightApi`] trait the dialogs call.
//! Two implementations ship with the crate: a remote travel-API client that
//! falls back to fixtures on failure, and a pure-fixture client for
//! development and tests.

use crate::error::FlightResult;
use crate::types::{BookingRef, OfferId};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod airports;
pub mod mock;
pub mod remote;

pub use mock::MockFlightClient;
pub use remote::RemoteFlightClient;

/// Cabin class requested by the traveler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CabinClass {
    Economy,
    Business,
    First,
}

impl CabinClass {
    /// Parse user-supplied text, tolerating case and surrounding noise.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        if lower.contains("business") {
            Some(Self::Business)
        } else if lower.contains("first") {
            Some(Self::First)
        } else if lower.contains("economy") {
            Some(Self::Economy)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Business => "Business",
            Self::First => "First",
        }
    }
}

impl std::fmt::Display for CabinClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip parameters collected one field per turn.
///
/// Every field is optional while the draft is being filled in; a missing
/// return date means a one-way trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub travelers: Option<u32>,
    pub cabin_class: Option<CabinClass>,
}

impl FlightQuery {
    pub fn is_one_way(&self) -> bool {
        self.return_date.is_none()
    }
}

/// A flight search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub id: OfferId,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub departure_time: String,
    pub arrival_time: String,
    /// Display form, e.g. "2h 30m"
    pub duration: String,
    pub price: f64,
    pub cabin_class: CabinClass,
    pub available_seats: u32,
}

impl FlightOffer {
    /// Duration in minutes for sorting, None if the display form is mangled.
    pub fn duration_minutes(&self) -> Option<u32> {
        parse_display_duration(&self.duration)
    }
}

/// Passenger details collected by the booking flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub email: String,
    pub payment_method: String,
}

/// Booking state as reported by the flight client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => f.write_str("Confirmed"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// A confirmed (or cancelled) booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub reference: BookingRef,
    pub offer: FlightOffer,
    pub status: BookingStatus,
    pub passenger: Passenger,
    pub payment_status: String,
}

/// Trait for flight-offer backends
///
/// The dialogs only ever talk to this trait; which backend answers is wired
/// up when the bot is built.
#[async_trait]
pub trait FlightApi: Send + Sync {
    /// Search offers matching the query.
    ///
    /// Origin and destination must be present on the query; an empty result
    /// is reported as [`crate::error::FlightError::NoOffers`].
    async fn search_offers(&self, query: &FlightQuery) -> FlightResult<Vec<FlightOffer>>;

    /// Book an offer for a passenger.
    async fn book(&self, offer: &FlightOffer, passenger: &Passenger)
        -> FlightResult<BookingRecord>;

    /// Look up an existing booking by reference.
    async fn booking_details(&self, reference: &BookingRef) -> FlightResult<BookingRecord>;
}

static ISO_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?$").expect("valid duration pattern"));

static DISPLAY_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)h)?\s*(?:(\d+)m)?$").expect("valid duration pattern"));

/// Convert an ISO-8601 duration ("PT2H30M") to display form ("2h 30m").
///
/// Returns None for anything that is not a plain hours/minutes duration.
pub fn iso_duration_to_display(iso: &str) -> Option<String> {
    let captures = ISO_DURATION.captures(iso.trim())?;
    let hours: u32 = captures
        .get(1)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
    let minutes: u32 = captures
        .get(2)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
    if hours == 0 && minutes == 0 {
        return None;
    }
    if hours == 0 {
        Some(format!("{}m", minutes))
    } else if minutes == 0 {
        Some(format!("{}h", hours))
    } else {
        Some(format!("{}h {}m", hours, minutes))
    }
}

/// Parse a display duration ("2h 30m", "45m", "3h") into minutes.
pub fn parse_display_duration(display: &str) -> Option<u32> {
    let captures = DISPLAY_DURATION.captures(display.trim())?;
    let hours: u32 = captures
        .get(1)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
    let minutes: u32 = captures
        .get(2)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
    if hours == 0 && minutes == 0 {
        return None;
    }
    Some(hours * 60 + minutes)
}
