use std::sync::{Arc, Mutex};
use std::time::Duration;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::controller::LifecycleController;

/// Long-lived background loop driving the expiry sweep on a fixed cadence.
/// Two states only: Stopped and Running. Owned by the process's composition
/// root, started once at boot and stopped on shutdown.
pub struct SweepScheduler {
    controller: Arc<LifecycleController>,
    interval: Duration,
    shutdown_grace: Duration,
    running: Mutex<Option<RunningLoop>>,
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweepScheduler {
    pub fn new(
        controller: Arc<LifecycleController>,
        interval: Duration,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            controller,
            interval,
            shutdown_grace,
            running: Mutex::new(None),
        }
    }

    /// Spawn the sweep loop. Calling start() while already Running is a
    /// no-op. The first sweep fires immediately, which doubles as restart
    /// recovery: bookings that went overdue while the process was down are
    /// expired on the first tick.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("scheduler state poisoned");
        if running.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let controller = self.controller.clone();
        let interval = self.interval;
        let handle = tokio::spawn(run_loop(controller, interval, stop_rx));

        info!(interval_secs = interval.as_secs(), "sweep scheduler started");
        *running = Some(RunningLoop { stop_tx, handle });
    }

    /// Signal shutdown and wait up to the grace period for the in-flight
    /// sweep, then abort it. Each booking transition is atomic at the store,
    /// so an abandoned sweep resumes safely on the next start.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .expect("scheduler state poisoned")
            .take();
        let Some(running) = running else {
            return;
        };

        let _ = running.stop_tx.send(true);
        let mut handle = running.handle;
        match tokio::time::timeout(self.shutdown_grace, &mut handle).await {
            Ok(_) => info!("sweep scheduler stopped"),
            Err(_) => {
                warn!("in-flight sweep did not finish within the shutdown grace period, aborting");
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .expect("scheduler state poisoned")
            .is_some()
    }
}

async fn run_loop(
    controller: Arc<LifecycleController>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // One sweep per tick, never overlapping; a long sweep delays the next
    // tick instead of bunching missed ones.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                info!("sweep loop observed shutdown");
                return;
            }
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = stop_rx.changed() => {
                info!("sweep loop observed shutdown mid-sweep");
                return;
            }
            result = controller.sweep_expired(Utc::now()) => match result {
                Ok(report) => {
                    info!(
                        examined = report.examined,
                        expired = report.expired,
                        failed = report.failed,
                        "sweep finished"
                    );
                }
                // An aborted sweep is reported and the loop keeps ticking.
                Err(err) => error!(error = %err, "sweep aborted"),
            }
        }
    }
}
