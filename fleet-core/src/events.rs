use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle events handed to the notification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    PaymentConfirmed { booking_id: Uuid },
    BookingCancelled { booking_id: Uuid },
    BookingExpired { booking_id: Uuid },
    RentalStarted { booking_id: Uuid },
    RentalCompleted { booking_id: Uuid },
}

impl BookingEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            BookingEvent::PaymentConfirmed { booking_id }
            | BookingEvent::BookingCancelled { booking_id }
            | BookingEvent::BookingExpired { booking_id }
            | BookingEvent::RentalStarted { booking_id }
            | BookingEvent::RentalCompleted { booking_id } => *booking_id,
        }
    }
}
