//! Closed integer intervals and normalized interval sets.
//!
//! Query intervals come in as interval sets and results go out as interval
//! sets; lifespan arithmetic in between happens on bitmaps
//! (see [`crate::lifespan`]).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DurableError, Result};

/// Closed interval `[start, end]` of timestamps, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: u32,
    end: u32,
}

#[derive(Deserialize)]
struct RawInterval {
    start: u32,
    end: u32,
}

impl TryFrom<RawInterval> for Interval {
    type Error = DurableError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Self::closed(raw.start, raw.end)
    }
}

impl Interval {
    pub fn closed(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(DurableError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn point(t: u32) -> Self {
        Self { start: t, end: t }
    }

    /// For callers that already hold `start <= end`.
    pub(crate) fn spanning(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub const fn start(&self) -> u32 {
        self.start
    }

    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Number of timestamps covered. `[0, u32::MAX]` covers 2^32.
    pub fn len(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    pub fn contains(&self, t: u32) -> bool {
        self.start <= t && t <= self.end
    }

    pub(crate) fn check_domain(&self, domain: u32) -> Result<()> {
        if self.end >= domain {
            return Err(DurableError::IntervalOutOfDomain {
                start: self.start,
                end: self.end,
                domain,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A set of disjoint, non-adjacent closed intervals in ascending order.
///
/// Overlapping or touching intervals are merged on insertion, so two sets
/// covering the same timestamps compare equal. Deserialization goes through
/// the same merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawIntervalSet")]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

#[derive(Deserialize)]
struct RawIntervalSet {
    intervals: Vec<Interval>,
}

impl From<RawIntervalSet> for IntervalSet {
    fn from(raw: RawIntervalSet) -> Self {
        raw.intervals.into_iter().collect()
    }
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single closed interval.
    pub fn closed(start: u32, end: u32) -> Result<Self> {
        let mut set = Self::new();
        set.insert(Interval::closed(start, end)?);
        Ok(set)
    }

    /// Build from `(start, end)` pairs, rejecting any pair with `start > end`.
    pub fn from_ranges<I>(ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut set = Self::new();
        for (start, end) in ranges {
            set.insert(Interval::closed(start, end)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, interval: Interval) {
        let mut merged = interval;
        let mut kept = Vec::with_capacity(self.intervals.len() + 1);
        for existing in self.intervals.drain(..) {
            let touches = existing.start <= merged.end.saturating_add(1)
                && merged.start <= existing.end.saturating_add(1);
            if touches {
                merged.start = merged.start.min(existing.start);
                merged.end = merged.end.max(existing.end);
            } else {
                kept.push(existing);
            }
        }
        let at = kept
            .iter()
            .position(|i| i.start > merged.start)
            .unwrap_or(kept.len());
        kept.insert(at, merged);
        self.intervals = kept;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> + '_ {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of intervals (not timestamps).
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains(&self, t: u32) -> bool {
        self.intervals.iter().any(|i| i.contains(t))
    }

    /// Number of timestamps covered by all intervals together.
    pub fn total_size(&self) -> u64 {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// Length of the longest interval, 0 for the empty set.
    pub fn maximum_size(&self) -> u64 {
        self.intervals.iter().map(Interval::len).max().unwrap_or(0)
    }

    /// Check that every interval lies inside `[0, domain)`.
    pub fn check_domain(&self, domain: u32) -> Result<()> {
        self.intervals.iter().try_for_each(|i| i.check_domain(domain))
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        let mut set = Self::new();
        for interval in iter {
            set.insert(interval);
        }
        set
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{interval}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_merges_overlapping_and_adjacent() {
        let set = IntervalSet::from_ranges([(5, 7), (0, 1), (2, 3), (6, 9)]).unwrap();
        assert_eq!(
            set.as_slice(),
            &[Interval { start: 0, end: 3 }, Interval { start: 5, end: 9 }]
        );
        assert_eq!(set.total_size(), 9);
        assert_eq!(set.maximum_size(), 5);
    }

    #[test]
    fn rejects_reversed_interval() {
        assert_eq!(
            IntervalSet::closed(3, 1),
            Err(DurableError::InvalidInterval { start: 3, end: 1 })
        );
    }

    #[test]
    fn domain_check_rejects_out_of_range_end() {
        let set = IntervalSet::closed(0, 3).unwrap();
        assert!(set.check_domain(4).is_ok());
        assert_eq!(
            set.check_domain(3),
            Err(DurableError::IntervalOutOfDomain {
                start: 0,
                end: 3,
                domain: 3
            })
        );
    }

    #[test]
    fn sizes_cover_the_whole_u32_range() {
        let all = IntervalSet::closed(0, u32::MAX).unwrap();
        assert_eq!(all.total_size(), 1u64 << 32);
        assert_eq!(all.maximum_size(), 1u64 << 32);

        let mut set = IntervalSet::closed(0, u32::MAX - 1).unwrap();
        set.insert(Interval::point(u32::MAX));
        assert_eq!(set.len(), 1);
        assert_eq!(set.total_size(), 1u64 << 32);
    }

    #[test]
    fn deserialization_validates_and_normalizes() {
        let reversed = serde_json::from_str::<Interval>(r#"{"start": 5, "end": 2}"#);
        assert!(reversed.is_err());

        let set: IntervalSet = serde_json::from_str(
            r#"{"intervals": [{"start": 4, "end": 6}, {"start": 0, "end": 1}, {"start": 2, "end": 2}]}"#,
        )
        .unwrap();
        assert_eq!(set, IntervalSet::from_ranges([(0, 2), (4, 6)]).unwrap());
        assert_eq!(set.total_size(), 6);
    }

    #[test]
    fn display_lists_intervals() {
        let set = IntervalSet::from_ranges([(0, 0), (2, 2)]).unwrap();
        assert_eq!(set.to_string(), "{[0, 0], [2, 2]}");
    }
}
