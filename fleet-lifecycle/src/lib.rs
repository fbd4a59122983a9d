pub mod controller;
pub mod error;
pub mod locks;
pub mod scheduler;

pub use controller::{LifecycleConfig, LifecycleController, SweepReport};
pub use error::LifecycleError;
pub use scheduler::SweepScheduler;
