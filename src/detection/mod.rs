//! Detection domain types shared by the push channel, the request client and the view.
//!
//! Everything in here is plain data. Values that come off the wire are clamped into
//! their documented ranges when converted into domain types, so downstream code never
//! has to re-check a confidence or an audio level.

pub mod record;
pub mod timestamp;
mod types;

pub use record::{AnimalCountRecord, DetectionRecord, LiveResultRecord};
pub use types::*;

use std::sync::atomic::{AtomicU64, Ordering};

static LOCAL_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a locally unique, monotonic detection id.
///
/// Used for live results the backend did not persist (no `detection_id`). Ids are
/// seeded from wall-clock milliseconds shifted into the upper range so they never
/// collide with the backend's small autoincrement ids.
pub fn next_local_id() -> u64 {
    let seed = (chrono::Utc::now().timestamp_millis().max(0) as u64) << 8;
    let mut current = LOCAL_ID.load(Ordering::Relaxed);
    loop {
        let next = current.max(seed) + 1;
        match LOCAL_ID.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Clamp a probability-like value into `[0, 1]`. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp an audio level into `[0, 100]`. NaN becomes 0.
pub fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ids_are_monotonic() {
        let a = next_local_id();
        let b = next_local_id();
        let c = next_local_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_local_ids_above_backend_range() {
        assert!(next_local_id() > 1_000_000_000);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(140.0), 100.0);
        assert_eq!(clamp_level(-3.0), 0.0);
        assert_eq!(clamp_level(55.5), 55.5);
    }
}
