//! Fixture-backed flight client
//!
//! Stands in for the travel API during development and tests, and supplies
//! the fallback offers the remote client uses when the API is unreachable.
//! Bookings are held in memory so `booking_details` can find them again
//! within the same process.

use crate::error::{FlightError, FlightResult};
use crate::flights::{
    BookingRecord, BookingStatus, CabinClass, FlightApi, FlightOffer, FlightQuery, Passenger,
};
use crate::types::{BookingRef, OfferId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed offers returned for every search.
///
/// Origin, destination, date, and cabin class are stamped in from the query
/// so the conversation reads naturally.
pub fn fixture_offers(query: &FlightQuery) -> Vec<FlightOffer> {
    let origin = query.origin.clone().unwrap_or_else(|| "New Delhi".to_string());
    let destination = query
        .destination
        .clone()
        .unwrap_or_else(|| "Mumbai".to_string());
    let date = query
        .departure_date
        .clone()
        .unwrap_or_else(|| "2025-12-15".to_string());
    let cabin = query.cabin_class.unwrap_or(CabinClass::Economy);

    vec![
        FlightOffer {
            id: OfferId::new("1"),
            airline: "AirIndia".to_string(),
            flight_number: "AI101".to_string(),
            origin: origin.clone(),
            destination: destination.clone(),
            departure_date: date.clone(),
            departure_time: "10:00 AM".to_string(),
            arrival_time: "12:30 PM".to_string(),
            duration: "2h 30m".to_string(),
            price: 450.0,
            cabin_class: cabin,
            available_seats: 45,
        },
        FlightOffer {
            id: OfferId::new("2"),
            airline: "IndiGo".to_string(),
            flight_number: "IG202".to_string(),
            origin: origin.clone(),
            destination: destination.clone(),
            departure_date: date.clone(),
            departure_time: "2:15 PM".to_string(),
            arrival_time: "4:45 PM".to_string(),
            duration: "2h 30m".to_string(),
            price: 380.0,
            cabin_class: cabin,
            available_seats: 32,
        },
        FlightOffer {
            id: OfferId::new("3"),
            airline: "SpiceJet".to_string(),
            flight_number: "SJ303".to_string(),
            origin,
            destination,
            departure_date: date,
            departure_time: "7:30 PM".to_string(),
            arrival_time: "10:00 PM".to_string(),
            duration: "2h 30m".to_string(),
            price: 420.0,
            cabin_class: cabin,
            available_seats: 28,
        },
    ]
}

/// In-memory flight client backed by [`fixture_offers`]
#[derive(Clone, Default)]
pub struct MockFlightClient {
    bookings: Arc<RwLock<HashMap<BookingRef, BookingRecord>>>,
}

impl MockFlightClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bookings made through this client.
    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl FlightApi for MockFlightClient {
    async fn search_offers(&self, query: &FlightQuery) -> FlightResult<Vec<FlightOffer>> {
        Ok(fixture_offers(query))
    }

    async fn book(
        &self,
        offer: &FlightOffer,
        passenger: &Passenger,
    ) -> FlightResult<BookingRecord> {
        let record = BookingRecord {
            reference: BookingRef::generate(),
            offer: offer.clone(),
            status: BookingStatus::Confirmed,
            passenger: passenger.clone(),
            payment_status: "Completed".to_string(),
        };

        let mut bookings = self.bookings.write().await;
        bookings.insert(record.reference.clone(), record.clone());
        Ok(record)
    }

    async fn booking_details(&self, reference: &BookingRef) -> FlightResult<BookingRecord> {
        let bookings = self.bookings.read().await;
        bookings
            .get(reference)
            .cloned()
            .ok_or_else(|| FlightError::BookingNotFound(reference.clone()))
    }
}
