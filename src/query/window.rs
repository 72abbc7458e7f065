//! Cache-friendly polling windows.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` delta query window.
///
/// Windows are derived by bucketing: every client whose last-known
/// timestamp falls in the same interval-wide bucket asks for the same
/// window, so concurrently polling clients share one cacheable response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl PollWindow {
    /// Bucket a client's last-known timestamp against the current time.
    ///
    /// `start` is the floor of `last_known + 1` to the interval; `end` is
    /// the floor of `now`. Any two clients with last-known timestamps in
    /// the same half-open bucket compute the same `start`, and the same
    /// `end` within one bucket width of each other's clocks.
    pub fn bucketed(last_known: Timestamp, now: Timestamp, interval: u64) -> Self {
        let i = interval.max(1) as i64;
        Self {
            start: Timestamp((last_known.0 + 1).div_euclid(i) * i),
            end: Timestamp(now.0.div_euclid(i) * i),
        }
    }

    /// An explicit window, for callers that manage their own anchoring.
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at <= self.end
    }

    /// True when the bucket math produced nothing to ask for yet.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}
