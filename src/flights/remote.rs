//! Remote travel-API flight client
//!
//! Calls a flight-offers search endpoint over HTTP, translating city names
//! to IATA codes before the request and ISO-8601 durations to display form
//! after it. Transport and decode failures fall back to the fixture offers
//! so the conversation can continue; an unknown city is a real error and
//! surfaces to the user.
//!
//! Booking is not part of the remote API surface we integrate with, so
//! `book` and `booking_details` are served by the in-process fixture client.

use crate::error::{FlightError, FlightResult};
use crate::flights::airports::airport_code;
use crate::flights::mock::{fixture_offers, MockFlightClient};
use crate::flights::{
    iso_duration_to_display, BookingRecord, CabinClass, FlightApi, FlightOffer, FlightQuery,
    Passenger,
};
use crate::types::{BookingRef, OfferId};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Remote flight-offers client
pub struct RemoteFlightClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    bookings: MockFlightClient,
}

impl RemoteFlightClient {
    /// Create a client against the given API endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            bookings: MockFlightClient::new(),
        }
    }

    async fn fetch_offers(&self, query: &FlightQuery) -> FlightResult<Vec<FlightOffer>> {
        let origin_city = query
            .origin
            .as_deref()
            .ok_or_else(|| FlightError::Malformed("query has no origin".to_string()))?;
        let destination_city = query
            .destination
            .as_deref()
            .ok_or_else(|| FlightError::Malformed("query has no destination".to_string()))?;

        let origin = airport_code(origin_city)?;
        let destination = airport_code(destination_city)?;
        let departure_date = query
            .departure_date
            .clone()
            .unwrap_or_else(|| "2025-12-15".to_string());
        let adults = query.travelers.unwrap_or(1).to_string();

        debug!(%origin, %destination, %departure_date, "Requesting flight offers");

        let url = format!("{}/v2/shopping/flight-offers", self.endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("originLocationCode", origin.as_str()),
                ("destinationLocationCode", destination.as_str()),
                ("departureDate", departure_date.as_str()),
                ("adults", adults.as_str()),
                ("max", "5"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlightError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: OffersResponse = response.json().await?;
        let cabin = query.cabin_class.unwrap_or(CabinClass::Economy);

        let offers: Vec<FlightOffer> = payload
            .data
            .into_iter()
            .filter_map(|raw| raw.into_offer(query, cabin))
            .collect();

        if offers.is_empty() {
            return Err(FlightError::NoOffers);
        }

        Ok(offers)
    }
}

#[async_trait]
impl FlightApi for RemoteFlightClient {
    async fn search_offers(&self, query: &FlightQuery) -> FlightResult<Vec<FlightOffer>> {
        match self.fetch_offers(query).await {
            Ok(offers) => {
                info!(offer_count = offers.len(), "Flight offers retrieved");
                Ok(offers)
            }
            // City resolution and empty results are the user's problem to fix
            err @ Err(FlightError::UnknownAirport(_)) | err @ Err(FlightError::NoOffers) => err,
            Err(error) => {
                warn!(%error, "Flight API unavailable, falling back to fixture offers");
                Ok(fixture_offers(query))
            }
        }
    }

    async fn book(
        &self,
        offer: &FlightOffer,
        passenger: &Passenger,
    ) -> FlightResult<BookingRecord> {
        self.bookings.book(offer, passenger).await
    }

    async fn booking_details(&self, reference: &BookingRef) -> FlightResult<BookingRecord> {
        self.bookings.booking_details(reference).await
    }
}

// Wire types for the flight-offers response, trimmed to the fields we read.

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    id: String,
    itineraries: Vec<RawItinerary>,
    price: RawPrice,
    #[serde(rename = "numberOfBookableSeats", default)]
    bookable_seats: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawItinerary {
    duration: String,
    segments: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    departure: RawEndpoint,
    arrival: RawEndpoint,
    #[serde(rename = "carrierCode")]
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    #[serde(rename = "iataCode")]
    iata_code: String,
    at: String,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    total: String,
}

impl RawOffer {
    /// Map an API offer into our flat record; None drops offers we cannot
    /// render (multi-leg itineraries, unparseable prices or durations).
    fn into_offer(self, query: &FlightQuery, cabin: CabinClass) -> Option<FlightOffer> {
        let itinerary = self.itineraries.into_iter().next()?;
        let segment = itinerary.segments.into_iter().next()?;
        let price: f64 = self.price.total.parse().ok()?;
        let duration = iso_duration_to_display(&itinerary.duration)?;

        Some(FlightOffer {
            id: OfferId::new(self.id),
            airline: segment.carrier_code.clone(),
            flight_number: format!("{}{}", segment.carrier_code, segment.number),
            origin: query
                .origin
                .clone()
                .unwrap_or_else(|| segment.departure.iata_code.clone()),
            destination: query
                .destination
                .clone()
                .unwrap_or_else(|| segment.arrival.iata_code.clone()),
            departure_date: time_part(&segment.departure.at, 0)
                .unwrap_or_else(|| segment.departure.at.clone()),
            departure_time: time_part(&segment.departure.at, 1)
                .unwrap_or_else(|| segment.departure.at.clone()),
            arrival_time: time_part(&segment.arrival.at, 1)
                .unwrap_or_else(|| segment.arrival.at.clone()),
            duration,
            price,
            cabin_class: cabin,
            available_seats: self.bookable_seats.unwrap_or(9),
        })
    }
}

/// Split an ISO timestamp ("2025-07-15T10:00:00") into date (0) or time (1).
fn time_part(timestamp: &str, index: usize) -> Option<String> {
    let part = timestamp.split('T').nth(index)?;
    if index == 1 {
        // Drop seconds for display
        let mut pieces = part.splitn(3, ':');
        let hours = pieces.next()?;
        let minutes = pieces.next()?;
        Some(format!("{}:{}", hours, minutes))
    } else {
        Some(part.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_query() -> FlightQuery {
        FlightQuery {
            origin: Some("London".to_string()),
            destination: Some("Paris".to_string()),
            departure_date: Some("2025-07-15".to_string()),
            return_date: None,
            travelers: Some(2),
            cabin_class: None,
        }
    }

    #[test]
    fn test_time_part() {
        assert_eq!(
            time_part("2025-07-15T10:00:00", 0),
            Some("2025-07-15".to_string())
        );
        assert_eq!(time_part("2025-07-15T10:00:00", 1), Some("10:00".to_string()));
        assert_eq!(time_part("2025-07-15", 1), None);
    }

    #[test]
    fn test_raw_offer_mapping() {
        let raw: RawOffer = serde_json::from_value(json!({
            "id": "42",
            "itineraries": [{
                "duration": "PT2H30M",
                "segments": [{
                    "departure": { "iataCode": "LHR", "at": "2025-07-15T10:00:00" },
                    "arrival": { "iataCode": "CDG", "at": "2025-07-15T12:30:00" },
                    "carrierCode": "BA",
                    "number": "306"
                }]
            }],
            "price": { "total": "189.50" },
            "numberOfBookableSeats": 4
        }))
        .unwrap();

        let offer = raw.into_offer(&sample_query(), CabinClass::Economy).unwrap();
        assert_eq!(offer.id, OfferId::new("42"));
        assert_eq!(offer.flight_number, "BA306");
        assert_eq!(offer.origin, "London");
        assert_eq!(offer.departure_date, "2025-07-15");
        assert_eq!(offer.departure_time, "10:00");
        assert_eq!(offer.arrival_time, "12:30");
        assert_eq!(offer.duration, "2h 30m");
        assert_eq!(offer.price, 189.50);
        assert_eq!(offer.available_seats, 4);
    }

    #[test]
    fn test_raw_offer_without_segments_is_dropped() {
        let raw: RawOffer = serde_json::from_value(json!({
            "id": "43",
            "itineraries": [{ "duration": "PT1H", "segments": [] }],
            "price": { "total": "99.00" }
        }))
        .unwrap();
        assert!(raw.into_offer(&sample_query(), CabinClass::Economy).is_none());
    }

    #[tokio::test]
    async fn test_unknown_airport_is_not_swallowed() {
        // Endpoint is never reached: city resolution fails first.
        let client = RemoteFlightClient::new("http://localhost:9", "test-key");
        let mut query = sample_query();
        query.origin = Some("Atlantis".to_string());

        let err = client.search_offers(&query).await.unwrap_err();
        assert!(matches!(err, FlightError::UnknownAirport(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_fixtures() {
        // Nothing listens on this port, so the request fails and the
        // fixtures take over.
        let client = RemoteFlightClient::new("http://127.0.0.1:1", "test-key");
        let offers = client.search_offers(&sample_query()).await.unwrap();

        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].origin, "London");
    }
}
