use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fleet_core::booking::Booking;
use fleet_core::events::BookingEvent;
use fleet_core::inventory::InventoryService;
use fleet_core::notify::Notifier;
use fleet_core::repository::BoxError;
use fleet_lifecycle::{LifecycleConfig, LifecycleController, SweepScheduler};
use fleet_store::MemoryBookingStore;

/// Dev stand-in for the fleet inventory service.
struct LogInventory;

#[async_trait]
impl InventoryService for LogInventory {
    async fn release_hold(&self, car_id: Uuid, booking_id: Uuid) -> Result<(), BoxError> {
        tracing::info!(%car_id, %booking_id, "hold released");
        Ok(())
    }
}

/// Dev stand-in for the notification service.
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, customer_id: Uuid, event: BookingEvent) -> Result<(), BoxError> {
        tracing::info!(%customer_id, ?event, "customer notified");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_engine=debug,fleet_lifecycle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fleet_store::Config::load()?;
    tracing::info!(
        sweep_interval_seconds = config.scheduler.sweep_interval_seconds,
        grace_period_seconds = config.lifecycle.grace_period_seconds,
        "starting fleet engine"
    );

    let store = Arc::new(MemoryBookingStore::new());
    seed_demo_bookings(&store);

    let lifecycle_config = LifecycleConfig {
        grace_period: chrono::Duration::seconds(config.lifecycle.grace_period_seconds as i64),
        store_timeout: Duration::from_millis(config.lifecycle.store_timeout_ms),
        sweep_fan_out: config.lifecycle.sweep_fan_out,
        release_retries: config.lifecycle.release_retries,
        alert_after_failures: config.lifecycle.alert_after_failures,
    };

    let controller = Arc::new(LifecycleController::new(
        store.clone(),
        Arc::new(LogInventory),
        Arc::new(LogNotifier),
        lifecycle_config,
    ));

    let scheduler = SweepScheduler::new(
        controller,
        Duration::from_secs(config.scheduler.sweep_interval_seconds),
        Duration::from_secs(config.scheduler.shutdown_grace_seconds),
    );
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    scheduler.stop().await;

    Ok(())
}

/// A couple of Pending bookings so the first sweep has something to look at.
fn seed_demo_bookings(store: &MemoryBookingStore) {
    let now = Utc::now();
    for days in 1..=2 {
        let mut booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            now + chrono::Duration::days(days),
            now + chrono::Duration::days(days + 2),
            15_000 * days,
        );
        // Backdate one booking past any reasonable grace period.
        if days == 1 {
            booking.created_at = now - chrono::Duration::hours(2);
        }
        tracing::info!(booking_id = %booking.id, "seeded booking");
        store.insert(booking);
    }
}
