pub mod booking;
pub mod events;
pub mod expiry;
pub mod inventory;
pub mod notify;
pub mod repository;
pub mod transitions;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use events::BookingEvent;
pub use inventory::InventoryService;
pub use notify::Notifier;
pub use repository::{BookingStore, BoxError};
pub use transitions::{attempt_transition, InvalidTransition, Trigger};
