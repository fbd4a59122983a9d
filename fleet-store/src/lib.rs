pub mod app_config;
pub mod memory_repo;

pub use app_config::Config;
pub use memory_repo::MemoryBookingStore;
