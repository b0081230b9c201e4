use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

use super::clock::now_epoch_millis;

/// Returns a process-unique, monotonically increasing identifier for map markers.
pub fn next_marker_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_epoch_millis() << 16));
    counter.fetch_add(1, Ordering::Relaxed)
}
