use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use fleet_core::booking::{Booking, BookingStatus, PaymentStatus};
use fleet_core::repository::{BookingStore, BoxError};

/// In-memory booking store with the same conditional-write contract a
/// production store provides. Backs the dev runner and the integration
/// tests.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a booking. Creation itself belongs to the booking-creation path,
    /// not the lifecycle core, so this is a plain insert.
    pub fn insert(&self, booking: Booking) {
        self.bookings
            .write()
            .expect("booking map poisoned")
            .insert(booking.id, booking);
    }

    /// Current state of one booking, for assertions and the dev runner.
    pub fn snapshot(&self, id: Uuid) -> Option<Booking> {
        self.bookings
            .read()
            .expect("booking map poisoned")
            .get(&id)
            .cloned()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BoxError> {
        Ok(self.snapshot(id))
    }

    async fn list_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, BoxError> {
        let bookings = self.bookings.read().expect("booking map poisoned");
        Ok(bookings
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        new_payment: Option<PaymentStatus>,
    ) -> Result<bool, BoxError> {
        let mut bookings = self.bookings.write().expect("booking map poisoned");
        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(false);
        };
        if booking.status != expected {
            return Ok(false);
        }

        booking.status = new_status;
        if let Some(payment) = new_payment {
            booking.payment_status = payment;
        }
        booking.updated_at = Utc::now();
        Ok(true)
    }
}
