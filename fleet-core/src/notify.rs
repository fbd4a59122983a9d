use crate::events::BookingEvent;
use crate::repository::BoxError;
use async_trait::async_trait;
use uuid::Uuid;

/// Customer notification collaborator (email/SMS delivery lives behind it).
/// Best effort: the lifecycle controller logs failures and never lets them
/// block or roll back a status transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, customer_id: Uuid, event: BookingEvent) -> Result<(), BoxError>;
}
