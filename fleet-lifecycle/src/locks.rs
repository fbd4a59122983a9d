use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

// Above this many live entries, lock() sheds cells nobody is holding.
const CLEANUP_THRESHOLD: usize = 1024;

/// Per-booking mutual exclusion. Two concurrent transition attempts on the
/// same booking serialize here before the store's conditional write is
/// attempted; transitions on distinct bookings proceed independently.
#[derive(Default)]
pub struct BookingLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let cell = {
            let mut map = self.inner.lock().expect("booking lock registry poisoned");
            if map.len() > CLEANUP_THRESHOLD {
                map.retain(|_, cell| Arc::strong_count(cell) > 1);
            }
            map.entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        cell.lock_owned().await
    }
}
