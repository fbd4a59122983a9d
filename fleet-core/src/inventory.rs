use crate::repository::BoxError;
use async_trait::async_trait;
use uuid::Uuid;

/// Car inventory collaborator. Exactly one hold exists per non-terminal
/// booking; the lifecycle controller releases it when the booking reaches a
/// terminal state.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Release the hold a booking placed on a car. Idempotent: releasing an
    /// already-released hold is a no-op success.
    async fn release_hold(&self, car_id: Uuid, booking_id: Uuid) -> Result<(), BoxError>;
}
