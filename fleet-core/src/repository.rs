use crate::booking::{Booking, BookingStatus, PaymentStatus};
use async_trait::async_trait;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Durable record of bookings. Consumed, never owned, by the lifecycle core.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, BoxError>;

    async fn list_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, BoxError>;

    /// Conditional status write: applies the new status (and payment status,
    /// when given) only while the stored status still equals `expected`.
    /// Returns `false` on a precondition mismatch or an unknown id, which the
    /// caller treats as a benign conflict.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new_status: BookingStatus,
        new_payment: Option<PaymentStatus>,
    ) -> Result<bool, BoxError>;
}
