use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub lifecycle: LifecycleRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How long shutdown waits for an in-flight sweep before abandoning it.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LifecycleRules {
    /// Payment grace period for Pending bookings.
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u64,
    /// Deadline on every store/inventory call.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Bookings processed concurrently per sweep.
    #[serde(default = "default_fan_out")]
    pub sweep_fan_out: usize,
    /// Retries for releasing a car hold after a committed transition.
    #[serde(default = "default_release_retries")]
    pub release_retries: u32,
    /// Consecutive per-booking sweep failures before an operator alert.
    #[serde(default = "default_alert_after")]
    pub alert_after_failures: u32,
}

fn default_sweep_interval() -> u64 {
    300
}
fn default_shutdown_grace() -> u64 {
    10
}
fn default_grace_period() -> u64 {
    900
}
fn default_store_timeout() -> u64 {
    5_000
}
fn default_fan_out() -> usize {
    8
}
fn default_release_retries() -> u32 {
    3
}
fn default_alert_after() -> u32 {
    3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            grace_period_seconds: default_grace_period(),
            store_timeout_ms: default_store_timeout(),
            sweep_fan_out: default_fan_out(),
            release_retries: default_release_retries(),
            alert_after_failures: default_alert_after(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Layered sources, most specific last. All files are optional;
            // every field carries a default.
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Environment overrides, e.g. FLEET__SCHEDULER__SWEEP_INTERVAL_SECONDS=60
            .add_source(config::Environment::with_prefix("FLEET").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
