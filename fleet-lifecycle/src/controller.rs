use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use fleet_core::booking::{Booking, BookingStatus};
use fleet_core::events::BookingEvent;
use fleet_core::expiry;
use fleet_core::inventory::InventoryService;
use fleet_core::notify::Notifier;
use fleet_core::repository::{BookingStore, BoxError};
use fleet_core::transitions::{self, InvalidTransition, Trigger};

use crate::error::LifecycleError;
use crate::locks::BookingLocks;

const RELEASE_BACKOFF: Duration = Duration::from_millis(50);

/// Tuning knobs for the lifecycle controller, loaded from config at startup.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long a Pending booking may wait for payment before expiry.
    pub grace_period: chrono::Duration,
    /// Deadline applied to every collaborator call.
    pub store_timeout: Duration,
    /// Max bookings processed concurrently by one sweep.
    pub sweep_fan_out: usize,
    /// Extra attempts to release a car hold after the status write committed.
    pub release_retries: u32,
    /// Consecutive sweep failures for one booking before escalating the log.
    pub alert_after_failures: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period: chrono::Duration::minutes(15),
            store_timeout: Duration::from_secs(5),
            sweep_fan_out: 8,
            release_retries: 3,
            alert_after_failures: 3,
        }
    }
}

/// Result of one expiry sweep over the Pending bookings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub expired: usize,
    pub failed: usize,
}

enum SweepOutcome {
    Expired,
    Skipped,
    Failed,
}

/// The only component that mutates booking status. Foreground callers
/// (cancel, payment confirmation, pickup, return) and the background sweep
/// all funnel through the same transition table and the same conditional
/// store write, so concurrent attempts on one booking cannot both succeed.
pub struct LifecycleController {
    store: Arc<dyn BookingStore>,
    inventory: Arc<dyn InventoryService>,
    notifier: Arc<dyn Notifier>,
    locks: BookingLocks,
    config: LifecycleConfig,
    failure_streaks: Mutex<HashMap<Uuid, u32>>,
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn BookingStore>,
        inventory: Arc<dyn InventoryService>,
        notifier: Arc<dyn Notifier>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            notifier,
            locks: BookingLocks::new(),
            config,
            failure_streaks: Mutex::new(HashMap::new()),
        }
    }

    /// Customer-initiated cancellation. Only the owning customer may cancel,
    /// and only from a state the transition table accepts.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        requesting_customer: Uuid,
    ) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load(booking_id).await?;

        if booking.customer_id != requesting_customer {
            return Err(LifecycleError::Forbidden(booking_id));
        }

        let updated = self.apply_transition(&booking, Trigger::Cancel).await?;
        info!(booking_id = %booking_id, from = %booking.status, "booking cancelled");

        self.release_hold(&updated).await;
        self.dispatch(
            updated.customer_id,
            BookingEvent::BookingCancelled { booking_id },
        );
        Ok(())
    }

    /// Invoked by the payment collaborator once funds cleared. The status
    /// write is the commit point; notification failure never rolls it back.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load(booking_id).await?;

        let updated = self
            .apply_transition(&booking, Trigger::ConfirmPayment)
            .await?;
        info!(booking_id = %booking_id, "payment confirmed, booking confirmed");

        self.dispatch(
            updated.customer_id,
            BookingEvent::PaymentConfirmed { booking_id },
        );
        Ok(())
    }

    /// Hand the car over at pickup. Legal only at or after the pickup date.
    pub async fn begin_rental(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load(booking_id).await?;

        if now < booking.pickup_date {
            return Err(InvalidTransition {
                from: booking.status,
                trigger: Trigger::BeginRental,
            }
            .into());
        }

        let updated = self.apply_transition(&booking, Trigger::BeginRental).await?;
        info!(booking_id = %booking_id, "rental started");

        self.dispatch(
            updated.customer_id,
            BookingEvent::RentalStarted { booking_id },
        );
        Ok(())
    }

    /// Close out a rental at car return. The car goes back into inventory.
    pub async fn complete(&self, booking_id: Uuid) -> Result<(), LifecycleError> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load(booking_id).await?;

        let updated = self.apply_transition(&booking, Trigger::Complete).await?;
        info!(booking_id = %booking_id, "rental completed");

        self.release_hold(&updated).await;
        self.dispatch(
            updated.customer_id,
            BookingEvent::RentalCompleted { booking_id },
        );
        Ok(())
    }

    /// One expiry pass over all Pending bookings. Overdue ones are expired
    /// through the transition table with bounded fan-out; a single booking's
    /// failure is recorded and never aborts the rest of the batch.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport, LifecycleError> {
        let pending = self
            .with_timeout(
                "list_by_status",
                self.store.list_by_status(BookingStatus::Pending),
            )
            .await?;

        let mut report = SweepReport {
            examined: pending.len(),
            ..SweepReport::default()
        };
        let pending_ids: HashSet<Uuid> = pending.iter().map(|b| b.id).collect();

        let mut outcomes = stream::iter(pending)
            .map(|booking| self.expire_one(booking, now))
            .buffer_unordered(self.config.sweep_fan_out.max(1));

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                SweepOutcome::Expired => report.expired += 1,
                SweepOutcome::Failed => report.failed += 1,
                SweepOutcome::Skipped => {}
            }
        }
        drop(outcomes);

        // A booking that left Pending by another path (confirmed, cancelled)
        // is never listed again; drop its streak entry so the map tracks
        // only bookings the sweep can still act on.
        self.failure_streaks
            .lock()
            .await
            .retain(|id, _| pending_ids.contains(id));

        Ok(report)
    }

    /// Consecutive sweep cycles in which this booking's expiry failed. Zero
    /// once the booking expires or leaves the Pending pool. Exposed for
    /// operator tooling.
    pub async fn consecutive_failures(&self, booking_id: Uuid) -> u32 {
        self.failure_streaks
            .lock()
            .await
            .get(&booking_id)
            .copied()
            .unwrap_or(0)
    }

    async fn expire_one(&self, booking: Booking, now: DateTime<Utc>) -> SweepOutcome {
        if !expiry::is_expired(&booking, now, self.config.grace_period) {
            return SweepOutcome::Skipped;
        }

        let _guard = self.locks.acquire(booking.id).await;
        match self.apply_transition(&booking, Trigger::Expire).await {
            Ok(updated) => {
                self.failure_streaks.lock().await.remove(&booking.id);
                info!(booking_id = %booking.id, car_id = %booking.car_id, "pending booking expired");
                self.release_hold(&updated).await;
                self.dispatch(
                    updated.customer_id,
                    BookingEvent::BookingExpired {
                        booking_id: booking.id,
                    },
                );
                SweepOutcome::Expired
            }
            // The booking was confirmed or cancelled after our snapshot. Not
            // a failure, just no longer ours to expire.
            Err(LifecycleError::Conflict(_)) => {
                debug!(booking_id = %booking.id, "booking changed since snapshot, skipping");
                SweepOutcome::Skipped
            }
            Err(err) => {
                self.note_sweep_failure(booking.id, &err).await;
                SweepOutcome::Failed
            }
        }
    }

    /// Validate the trigger against the transition table, then apply it with
    /// a conditional write keyed on the status we read. A precondition miss
    /// means somebody else transitioned the booking first.
    async fn apply_transition(
        &self,
        booking: &Booking,
        trigger: Trigger,
    ) -> Result<Booking, LifecycleError> {
        let next = transitions::attempt_transition(booking.status, trigger)?;
        let next_payment = transitions::payment_after(trigger, booking.payment_status);

        let swapped = self
            .with_timeout(
                "compare_and_set_status",
                self.store
                    .compare_and_set_status(booking.id, booking.status, next, next_payment),
            )
            .await?;
        if !swapped {
            return Err(LifecycleError::Conflict(booking.id));
        }

        let mut updated = booking.clone();
        updated.status = next;
        if let Some(payment) = next_payment {
            updated.payment_status = payment;
        }
        Ok(updated)
    }

    async fn load(&self, id: Uuid) -> Result<Booking, LifecycleError> {
        self.with_timeout("get_booking", self.store.get_booking(id))
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    /// Release the car hold after a committed terminal transition. The status
    /// write is the source of truth, so this retries independently and never
    /// fails the operation; the release itself is idempotent and inventory
    /// converges even if we give up here.
    async fn release_hold(&self, booking: &Booking) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::time::timeout(
                self.config.store_timeout,
                self.inventory.release_hold(booking.car_id, booking.id),
            )
            .await
            {
                Ok(Ok(())) => return,
                Ok(Err(err)) => {
                    warn!(booking_id = %booking.id, car_id = %booking.car_id, attempt, error = %err, "inventory release failed");
                }
                Err(_) => {
                    warn!(booking_id = %booking.id, car_id = %booking.car_id, attempt, "inventory release timed out");
                }
            }
            if attempt > self.config.release_retries {
                error!(booking_id = %booking.id, car_id = %booking.car_id, "giving up on inventory release, hold must be reconciled out of band");
                return;
            }
            tokio::time::sleep(RELEASE_BACKOFF).await;
        }
    }

    /// Fire-and-forget notification dispatch. Runs off the caller's path and
    /// only ever logs.
    fn dispatch(&self, customer_id: Uuid, event: BookingEvent) {
        let notifier = self.notifier.clone();
        let deadline = self.config.store_timeout;
        tokio::spawn(async move {
            let booking_id = event.booking_id();
            match tokio::time::timeout(deadline, notifier.notify(customer_id, event)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(booking_id = %booking_id, error = %err, "notification failed")
                }
                Err(_) => warn!(booking_id = %booking_id, "notification timed out"),
            }
        });
    }

    async fn note_sweep_failure(&self, id: Uuid, err: &LifecycleError) {
        let streak = {
            let mut streaks = self.failure_streaks.lock().await;
            let streak = streaks.entry(id).or_insert(0);
            *streak += 1;
            *streak
        };
        if streak >= self.config.alert_after_failures {
            error!(booking_id = %id, consecutive_failures = streak, error = %err, "booking keeps failing to expire, operator attention needed");
        } else {
            warn!(booking_id = %id, consecutive_failures = streak, error = %err, "failed to expire booking, retrying next sweep");
        }
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T, LifecycleError>
    where
        F: Future<Output = Result<T, BoxError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(LifecycleError::Dependency { operation, source }),
            Err(_) => Err(LifecycleError::Timeout {
                operation,
                timeout: self.config.store_timeout,
            }),
        }
    }
}
