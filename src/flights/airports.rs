//! City-name to IATA airport-code lookup
//!
//! A static table covering the cities the bot is expected to handle. City
//! matching is case-insensitive; a bare three-letter code is passed through
//! uppercased so users can type "SFO" directly.

use crate::error::{FlightError, FlightResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static CITY_TO_IATA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("new york", "JFK"),
        ("san francisco", "SFO"),
        ("los angeles", "LAX"),
        ("chicago", "ORD"),
        ("boston", "BOS"),
        ("seattle", "SEA"),
        ("miami", "MIA"),
        ("london", "LHR"),
        ("paris", "CDG"),
        ("frankfurt", "FRA"),
        ("amsterdam", "AMS"),
        ("madrid", "MAD"),
        ("rome", "FCO"),
        ("dubai", "DXB"),
        ("singapore", "SIN"),
        ("tokyo", "NRT"),
        ("hong kong", "HKG"),
        ("sydney", "SYD"),
        ("new delhi", "DEL"),
        ("delhi", "DEL"),
        ("mumbai", "BOM"),
        ("bangalore", "BLR"),
        ("bengaluru", "BLR"),
        ("chennai", "MAA"),
        ("kolkata", "CCU"),
        ("hyderabad", "HYD"),
        ("toronto", "YYZ"),
        ("mexico city", "MEX"),
        ("sao paulo", "GRU"),
    ])
});

/// Resolve a user-supplied city name to an IATA code.
///
/// Unknown cities surface as [`FlightError::UnknownAirport`], which the turn
/// loop turns into a "try a different city name" message.
pub fn airport_code(city: &str) -> FlightResult<String> {
    let trimmed = city.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(trimmed.to_ascii_uppercase());
    }
    CITY_TO_IATA
        .get(trimmed.to_lowercase().as_str())
        .map(|code| (*code).to_string())
        .ok_or_else(|| FlightError::UnknownAirport(trimmed.to_string()))
}
