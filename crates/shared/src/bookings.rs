use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSegment {
    pub number: String,
    pub airline: String,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_date: String,
    pub departure_time: String,
    pub arrival_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySize {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub total_price: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub passenger: Passenger,
    pub flight: FlightSegment,
    pub passengers: PartySize,
    pub pricing: Pricing,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a booking. The pricing currency tag is supplied by
/// the caller so the store stays currency-agnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub passenger: Passenger,
    pub flight: FlightSegment,
    pub passengers: PartySize,
    pub pricing: Pricing,
}

/// Booking record store. The in-memory map is the default backend; a
/// persistent implementation slots in behind the same trait.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, request: NewBooking) -> BookingRecord;
    async fn get(&self, booking_id: &str) -> Option<BookingRecord>;
    async fn list(&self, email: Option<&str>, limit: usize) -> Vec<BookingRecord>;
    async fn cancel(&self, booking_id: &str, reason: &str) -> Option<BookingRecord>;
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<String, BookingRecord>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, request: NewBooking) -> BookingRecord {
        let booking_id = mint_booking_id();
        let now = Utc::now();
        let record = BookingRecord {
            booking_id: booking_id.clone(),
            passenger: request.passenger,
            flight: request.flight,
            passengers: request.passengers,
            pricing: request.pricing,
            status: BookingStatus::Confirmed,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let mut bookings = self.bookings.write().await;
        bookings.insert(booking_id.clone(), record.clone());
        info!(booking_id = %booking_id, "booking stored");
        record
    }

    async fn get(&self, booking_id: &str) -> Option<BookingRecord> {
        let bookings = self.bookings.read().await;
        bookings.get(booking_id).cloned()
    }

    async fn list(&self, email: Option<&str>, limit: usize) -> Vec<BookingRecord> {
        let bookings = self.bookings.read().await;
        let mut matched: Vec<BookingRecord> = bookings
            .values()
            .filter(|record| email.is_none_or(|email| record.passenger.email == email))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit);
        matched
    }

    async fn cancel(&self, booking_id: &str, reason: &str) -> Option<BookingRecord> {
        let mut bookings = self.bookings.write().await;
        let record = bookings.get_mut(booking_id)?;
        record.status = BookingStatus::Cancelled;
        record.cancellation_reason = Some(reason.to_string());
        record.updated_at = Utc::now();
        info!(booking_id = %booking_id, "booking cancelled");
        Some(record.clone())
    }
}

fn mint_booking_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("BK{}", hex[..10].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::{
        BookingStatus, BookingStore, FlightSegment, InMemoryBookingStore, NewBooking, PartySize,
        Passenger, Pricing,
    };

    fn sample_booking(email: &str) -> NewBooking {
        NewBooking {
            passenger: Passenger {
                name: "Asha Rao".to_string(),
                email: email.to_string(),
            },
            flight: FlightSegment {
                number: "AI123".to_string(),
                airline: "Air India".to_string(),
                departure_city: "DEL".to_string(),
                arrival_city: "BOM".to_string(),
                departure_date: "2026-03-10".to_string(),
                departure_time: "09:15".to_string(),
                arrival_time: "11:25".to_string(),
            },
            passengers: PartySize {
                adults: 1,
                children: 0,
                infants: 0,
            },
            pricing: Pricing {
                total_price: "5430.00".to_string(),
                currency: "INR".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryBookingStore::new();
        let created = store.create(sample_booking("asha@example.com")).await;

        assert!(created.booking_id.starts_with("BK"));
        assert_eq!(created.status, BookingStatus::Confirmed);

        let fetched = store
            .get(&created.booking_id)
            .await
            .expect("created booking should be retrievable");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_unknown_id_returns_none() {
        let store = InMemoryBookingStore::new();
        assert!(store.get("BKDOESNOTEXIST").await.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_email_and_respects_limit() {
        let store = InMemoryBookingStore::new();
        store.create(sample_booking("a@example.com")).await;
        store.create(sample_booking("a@example.com")).await;
        store.create(sample_booking("b@example.com")).await;

        let for_a = store.list(Some("a@example.com"), 10).await;
        assert_eq!(for_a.len(), 2);

        let limited = store.list(None, 2).await;
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn cancel_updates_status_and_reason() {
        let store = InMemoryBookingStore::new();
        let created = store.create(sample_booking("asha@example.com")).await;

        let cancelled = store
            .cancel(&created.booking_id, "Customer requested cancellation")
            .await
            .expect("existing booking should cancel");

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Customer requested cancellation")
        );
        assert!(store.cancel("BKDOESNOTEXIST", "n/a").await.is_none());
    }
}
