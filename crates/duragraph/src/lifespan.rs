//! Lifespan algebra over a fixed time domain `[0, T)`.
//!
//! A [`Lifespan`] is a roaring bitmap of timestamps tagged with the size of
//! the domain it lives in. Arithmetic between lifespans of different domains
//! is a configuration error and is reported, never truncated or padded.
//!
//! Durations come in two flavours ([`DurabilityMode`]):
//! - **collective**: the number of set timestamps (popcount)
//! - **continuous**: the length of the longest run of consecutive timestamps
//!
//! The longest run can be computed by two interchangeable algorithms
//! ([`RunLength`]); both must agree on every input.

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::error::{DurableError, Result};
use crate::interval::{Interval, IntervalSet};

// ============================================================================
// Lifespan
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLifespan")]
pub struct Lifespan {
    domain: u32,
    bits: RoaringBitmap,
}

#[derive(Deserialize)]
struct RawLifespan {
    domain: u32,
    bits: RoaringBitmap,
}

impl TryFrom<RawLifespan> for Lifespan {
    type Error = DurableError;

    fn try_from(raw: RawLifespan) -> Result<Self> {
        if let Some(last) = raw.bits.max().filter(|&t| t >= raw.domain) {
            return Err(DurableError::IntervalOutOfDomain {
                start: last,
                end: last,
                domain: raw.domain,
            });
        }
        Ok(Self {
            domain: raw.domain,
            bits: raw.bits,
        })
    }
}

impl Lifespan {
    /// All-clear lifespan.
    pub fn empty(domain: u32) -> Self {
        Self {
            domain,
            bits: RoaringBitmap::new(),
        }
    }

    /// All-set lifespan.
    pub fn full(domain: u32) -> Self {
        let mut bits = RoaringBitmap::new();
        bits.insert_range(0..domain);
        Self { domain, bits }
    }

    pub fn from_timestamps<I>(domain: u32, timestamps: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut out = Self::empty(domain);
        for t in timestamps {
            out.insert(t)?;
        }
        Ok(out)
    }

    /// Set exactly the timestamps covered by `intervals`.
    pub fn from_intervals(domain: u32, intervals: &IntervalSet) -> Result<Self> {
        intervals.check_domain(domain)?;
        let mut bits = RoaringBitmap::new();
        for interval in intervals.iter() {
            bits.insert_range(interval.start()..=interval.end());
        }
        Ok(Self { domain, bits })
    }

    pub fn domain(&self) -> u32 {
        self.domain
    }

    pub fn insert(&mut self, t: u32) -> Result<()> {
        if t >= self.domain {
            return Err(DurableError::IntervalOutOfDomain {
                start: t,
                end: t,
                domain: self.domain,
            });
        }
        self.bits.insert(t);
        Ok(())
    }

    pub fn contains(&self, t: u32) -> bool {
        self.bits.contains(t)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Set timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter()
    }

    pub fn as_bitmap(&self) -> &RoaringBitmap {
        &self.bits
    }

    fn check_same_domain(&self, other: &Lifespan) -> Result<()> {
        if self.domain != other.domain {
            return Err(DurableError::DomainMismatch {
                expected: self.domain,
                found: other.domain,
            });
        }
        Ok(())
    }

    /// Bitwise AND.
    pub fn intersect(&self, other: &Lifespan) -> Result<Lifespan> {
        self.check_same_domain(other)?;
        Ok(Self {
            domain: self.domain,
            bits: &self.bits & &other.bits,
        })
    }

    pub fn intersect_with(&mut self, other: &Lifespan) -> Result<()> {
        self.check_same_domain(other)?;
        self.bits &= &other.bits;
        Ok(())
    }

    /// Bitwise OR.
    pub fn union(&self, other: &Lifespan) -> Result<Lifespan> {
        self.check_same_domain(other)?;
        Ok(Self {
            domain: self.domain,
            bits: &self.bits | &other.bits,
        })
    }

    pub fn union_with(&mut self, other: &Lifespan) -> Result<()> {
        self.check_same_domain(other)?;
        self.bits |= &other.bits;
        Ok(())
    }

    /// In-place AND for lifespans that come from the same graph.
    pub(crate) fn and_assign(&mut self, other: &Lifespan) {
        debug_assert_eq!(self.domain, other.domain);
        self.bits &= &other.bits;
    }

    /// In-place OR for lifespans that come from the same graph.
    pub(crate) fn or_assign(&mut self, other: &Lifespan) {
        debug_assert_eq!(self.domain, other.domain);
        self.bits |= &other.bits;
    }

    /// Number of set timestamps.
    pub fn collective_duration(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Length of the longest run of consecutive set timestamps.
    pub fn continuous_duration(&self) -> u32 {
        self.longest_run_hop()
    }

    /// Longest run by a single left-to-right scan over the whole domain.
    pub fn longest_run_scan(&self) -> u32 {
        let mut longest = 0;
        let mut current = 0;
        for t in 0..self.domain {
            if self.bits.contains(t) {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// Longest run by hopping from run to run over the set timestamps only.
    pub fn longest_run_hop(&self) -> u32 {
        self.runs().map(|run| run_len(&run)).max().unwrap_or(0)
    }

    /// Maximal runs of set timestamps, in ascending order.
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            iter: self.bits.iter(),
            pending: None,
        }
    }

    /// Maximal runs of exactly `len` timestamps.
    pub fn runs_of_length(&self, len: u32) -> impl Iterator<Item = Interval> + '_ {
        self.runs().filter(move |run| run_len(run) == len)
    }

    /// Timestamps of `self` that fall inside `window`.
    pub fn restrict(&self, window: Interval) -> Lifespan {
        let mut range = RoaringBitmap::new();
        range.insert_range(window.start()..=window.end());
        Self {
            domain: self.domain,
            bits: &self.bits & &range,
        }
    }

    pub fn to_intervals(&self) -> IntervalSet {
        self.runs().collect()
    }
}

/// Iterator over the maximal runs of a [`Lifespan`].
pub struct Runs<'a> {
    iter: roaring::bitmap::Iter<'a>,
    pending: Option<u32>,
}

impl Iterator for Runs<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        let start = match self.pending.take() {
            Some(t) => t,
            None => self.iter.next()?,
        };
        let mut end = start;
        for t in self.iter.by_ref() {
            if t == end + 1 {
                end = t;
            } else {
                self.pending = Some(t);
                break;
            }
        }
        Some(Interval::spanning(start, end))
    }
}

/// Runs end below the domain, so the length always fits.
fn run_len(run: &Interval) -> u32 {
    run.end() - run.start() + 1
}

// ============================================================================
// Duration strategies
// ============================================================================

/// Algorithm used for the continuous duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLength {
    #[default]
    Scan,
    Hop,
}

impl RunLength {
    pub fn longest_run(self, lifespan: &Lifespan) -> u32 {
        match self {
            RunLength::Scan => lifespan.longest_run_scan(),
            RunLength::Hop => lifespan.longest_run_hop(),
        }
    }
}

/// How the duration of a match is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilityMode {
    /// Longest uninterrupted run of timestamps.
    Continuous,
    /// Any set of timestamps.
    Collective,
}

impl DurabilityMode {
    pub fn duration(self, lifespan: &Lifespan, run_length: RunLength) -> u32 {
        match self {
            DurabilityMode::Collective => lifespan.collective_duration(),
            DurabilityMode::Continuous => run_length.longest_run(lifespan),
        }
    }
}
