//! Transient persistence for a pending time-slot selection.
//!
//! A selection made just before a reload should survive it, but only
//! briefly: the cache hands the selection back within a short TTL and
//! consumes it either way. The backing store is a generic key-value port
//! (localStorage in the shipped UI).

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::appointment::TimeSlotSelection;

/// Key the pending selection is stored under.
pub const SELECTION_KEY: &str = "frontdesk.pending-selection";

/// How long a saved selection stays redeemable.
pub const SELECTION_TTL_SECS: i64 = 60;

/// Generic string key-value store (the localStorage stand-in).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// TTL-bounded cache for the pending selection.
pub struct SelectionCache<'a> {
    kv: &'a dyn KeyValueStore,
    ttl: Duration,
}

impl<'a> SelectionCache<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        SelectionCache {
            kv,
            ttl: Duration::seconds(SELECTION_TTL_SECS),
        }
    }

    pub fn with_ttl(kv: &'a dyn KeyValueStore, ttl: Duration) -> Self {
        SelectionCache { kv, ttl }
    }

    /// Persist a selection, stamping it with `now`.
    pub fn save(&self, mut selection: TimeSlotSelection, now: DateTime<Utc>) {
        selection.saved_at = now;
        match serde_json::to_string(&selection) {
            Ok(payload) => self.kv.set(SELECTION_KEY, payload),
            Err(err) => debug!(%err, "could not serialize pending selection"),
        }
    }

    /// Redeem the pending selection. Consumes the stored value whether or
    /// not it is still fresh; an expired or unreadable one yields `None`.
    pub fn take(&self, now: DateTime<Utc>) -> Option<TimeSlotSelection> {
        let payload = self.kv.get(SELECTION_KEY)?;
        self.kv.remove(SELECTION_KEY);

        let selection: TimeSlotSelection = match serde_json::from_str(&payload) {
            Ok(s) => s,
            Err(err) => {
                debug!(%err, "discarding unreadable pending selection");
                return None;
            }
        };

        if now - selection.saved_at > self.ttl {
            debug!("discarding expired pending selection");
            return None;
        }
        Some(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::ResourceId;
    use chrono::{NaiveDate, TimeZone};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, String>>);

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.lock().get(key).cloned()
        }
        fn set(&self, key: &str, value: String) {
            self.0.lock().insert(key.to_string(), value);
        }
        fn remove(&self, key: &str) {
            self.0.lock().remove(key);
        }
    }

    fn make_selection() -> TimeSlotSelection {
        TimeSlotSelection {
            start: Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 13, 15, 0).unwrap(),
            resource_id: ResourceId::staff("staff-1"),
            date_key: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            saved_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 59, 0).unwrap(),
        }
    }

    #[test]
    fn fresh_selection_round_trips_and_is_consumed() {
        let kv = MemoryStore::default();
        let cache = SelectionCache::new(&kv);
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();

        cache.save(make_selection(), now);
        let restored = cache.take(now + Duration::seconds(5)).unwrap();
        assert_eq!(restored.resource_id, ResourceId::staff("staff-1"));
        assert_eq!(restored.saved_at, now);

        // Consumed: a second take finds nothing.
        assert!(cache.take(now + Duration::seconds(6)).is_none());
    }

    #[test]
    fn expired_selection_is_discarded() {
        let kv = MemoryStore::default();
        let cache = SelectionCache::new(&kv);
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();

        cache.save(make_selection(), now);
        assert!(cache.take(now + Duration::seconds(SELECTION_TTL_SECS + 1)).is_none());
        // Expired payload was still consumed.
        assert!(kv.get(SELECTION_KEY).is_none());
    }

    #[test]
    fn unreadable_payload_yields_none() {
        let kv = MemoryStore::default();
        kv.set(SELECTION_KEY, "not json".to_string());
        let cache = SelectionCache::new(&kv);
        assert!(cache.take(Utc::now()).is_none());
    }
}
