//! Per-type timestamp watermark used to discard duplicate or stale envelopes.

use std::collections::HashMap;

use crate::domain::foundation::Timestamp;

/// Last applied envelope timestamp per event type, for one resource.
///
/// An envelope is admitted only if its timestamp is strictly newer than the
/// watermark for its type, so applied timestamps never decrease per type
/// regardless of which channel delivered them.
#[derive(Debug, Clone, Default)]
pub struct DedupWatermark {
    by_type: HashMap<String, Timestamp>,
}

impl DedupWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits and records `timestamp` if it is newer than the watermark.
    ///
    /// Returns `false` for duplicates and older envelopes, leaving the
    /// watermark untouched.
    pub fn admit(&mut self, event_type: &str, timestamp: Timestamp) -> bool {
        match self.by_type.get_mut(event_type) {
            Some(current) if timestamp <= *current => false,
            Some(current) => {
                *current = timestamp;
                true
            }
            None => {
                self.by_type.insert(event_type.to_string(), timestamp);
                true
            }
        }
    }

    /// Watermark for one event type.
    pub fn get(&self, event_type: &str) -> Option<Timestamp> {
        self.by_type.get(event_type).copied()
    }

    /// Newest timestamp across all types; the cursor for "updates since".
    pub fn latest(&self) -> Option<Timestamp> {
        self.by_type.values().max().copied()
    }

    /// Moves the watermark for `event_type` back to `to`, but only if it
    /// still sits at `from`. Used to undo an admit whose apply failed.
    pub fn rewind(&mut self, event_type: &str, from: Timestamp, to: Option<Timestamp>) {
        if self.by_type.get(event_type) != Some(&from) {
            return;
        }
        match to {
            Some(previous) => {
                self.by_type.insert(event_type.to_string(), previous);
            }
            None => {
                self.by_type.remove(event_type);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(millis: i64) -> Timestamp {
        Timestamp::parse_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .plus_millis(millis)
    }

    #[test]
    fn first_envelope_of_a_type_is_admitted() {
        let mut wm = DedupWatermark::new();
        assert!(wm.admit("balance_update", ts(0)));
        assert_eq!(wm.get("balance_update"), Some(ts(0)));
    }

    #[test]
    fn equal_timestamp_is_a_duplicate() {
        let mut wm = DedupWatermark::new();
        assert!(wm.admit("balance_update", ts(5)));
        assert!(!wm.admit("balance_update", ts(5)));
    }

    #[test]
    fn older_timestamp_is_discarded_without_moving_watermark() {
        let mut wm = DedupWatermark::new();
        wm.admit("balance_update", ts(10));
        assert!(!wm.admit("balance_update", ts(3)));
        assert_eq!(wm.get("balance_update"), Some(ts(10)));
    }

    #[test]
    fn types_are_tracked_independently() {
        let mut wm = DedupWatermark::new();
        assert!(wm.admit("balance_update", ts(10)));
        assert!(wm.admit("transaction_added", ts(3)));
        assert_eq!(wm.latest(), Some(ts(10)));
    }

    #[test]
    fn empty_watermark_has_no_cursor() {
        let wm = DedupWatermark::new();
        assert!(wm.is_empty());
        assert!(wm.latest().is_none());
    }

    #[test]
    fn rewind_restores_previous_watermark() {
        let mut wm = DedupWatermark::new();
        wm.admit("balance_update", ts(5));
        wm.admit("balance_update", ts(9));

        wm.rewind("balance_update", ts(9), Some(ts(5)));

        assert_eq!(wm.get("balance_update"), Some(ts(5)));
        assert!(wm.admit("balance_update", ts(9)));
    }

    #[test]
    fn rewind_ignores_a_watermark_that_moved_on() {
        let mut wm = DedupWatermark::new();
        wm.admit("balance_update", ts(5));
        wm.admit("balance_update", ts(9));

        wm.rewind("balance_update", ts(5), None);

        assert_eq!(wm.get("balance_update"), Some(ts(9)));
    }

    #[test]
    fn rewind_to_nothing_forgets_the_type() {
        let mut wm = DedupWatermark::new();
        wm.admit("balance_update", ts(5));

        wm.rewind("balance_update", ts(5), None);

        assert!(wm.is_empty());
    }

    proptest! {
        #[test]
        fn admitted_timestamps_strictly_increase(offsets in proptest::collection::vec(0i64..50, 1..60)) {
            let mut wm = DedupWatermark::new();
            let mut applied = Vec::new();
            for offset in offsets {
                if wm.admit("balance_update", ts(offset)) {
                    applied.push(offset);
                }
            }
            prop_assert!(applied.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
