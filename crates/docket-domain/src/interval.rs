//! Effective intervals - half-open validity ranges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open validity range `[from, to)`
///
/// `to = None` means open-ended: the version is currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveInterval {
    /// Inclusive start
    pub from: DateTime<Utc>,

    /// Exclusive end (`None` = +∞)
    pub to: Option<DateTime<Utc>>,
}

impl EffectiveInterval {
    /// Create a new interval
    pub fn new(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Create an open-ended interval starting at `from`
    pub fn open(from: DateTime<Utc>) -> Self {
        Self { from, to: None }
    }

    /// Whether the interval has no end
    pub fn is_open_ended(&self) -> bool {
        self.to.is_none()
    }

    /// Whether `at` falls inside `[from, to)`
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && self.to.is_none_or(|to| at < to)
    }

    /// Whether two intervals share at least one instant
    ///
    /// `[f1, t1)` and `[f2, t2)` overlap iff `f1 < t2 && f2 < t1`, with an
    /// open end treated as +∞.
    pub fn overlaps(&self, other: &EffectiveInterval) -> bool {
        let starts_before_other_ends = other.to.is_none_or(|t2| self.from < t2);
        let other_starts_before_end = self.to.is_none_or(|t1| other.from < t1);
        starts_before_other_ends && other_starts_before_end
    }
}
