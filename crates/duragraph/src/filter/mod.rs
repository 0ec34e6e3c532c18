//! Candidate filters ("time indexes").
//!
//! A candidate filter maps a pattern vertex to the target vertices that could
//! possibly be assigned to it at some timestamp of the query interval. The
//! answer must be a superset of the true candidates: a false negative loses
//! matches, a false positive only costs search time.
//!
//! Filters are built once per [`TemporalGraph`] through [`TimeIndex::build`]
//! and reused for every query against that graph.

mod label_presence;
mod neighborhood;
mod trivial;

pub use label_presence::LabelPresenceIndex;
pub use neighborhood::NeighborhoodCountIndex;
pub use trivial::TrivialFilter;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::error::{DurableError, Result};
use crate::graph::TemporalGraph;
use crate::lifespan::Lifespan;
use crate::pattern::{BoundPattern, PatternVertex};

/// Identity of the graph a filter was built for.
///
/// Dimensions alone are not enough: two graphs of the same size can give the
/// same vertex and label ids different meanings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexShape {
    pub domain: u32,
    pub vertices: u32,
    pub fingerprint: u64,
}

impl IndexShape {
    pub fn of(graph: &TemporalGraph) -> Self {
        Self {
            domain: graph.domain_size(),
            vertices: graph.vertex_count() as u32,
            fingerprint: graph.fingerprint(),
        }
    }

    /// Fail if `graph` is not the graph this shape was taken from.
    pub fn check(self, graph: &TemporalGraph) -> Result<()> {
        let other = Self::of(graph);
        if self != other {
            return Err(DurableError::IndexMismatch {
                index_domain: self.domain,
                index_vertices: self.vertices,
                index_fingerprint: self.fingerprint,
                graph_domain: other.domain,
                graph_vertices: other.vertices,
                graph_fingerprint: other.fingerprint,
            });
        }
        Ok(())
    }
}

pub trait CandidateFilter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn shape(&self) -> IndexShape;

    /// Target vertices that may match `vertex` at some timestamp of `interval`.
    fn filter_candidates(
        &self,
        pattern: &BoundPattern<'_>,
        vertex: PatternVertex,
        interval: &Lifespan,
    ) -> RoaringBitmap;
}

/// Selects which candidate filter to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeIndex {
    /// Every vertex is a candidate.
    Trivial,
    /// Per-timestamp label -> vertex bitmaps.
    LabelPresence,
    /// Per-vertex label counters for the vertex itself (radius 0) and its
    /// out-neighbors (radius 1).
    NeighborhoodCount { radius: u8 },
}

impl Default for TimeIndex {
    fn default() -> Self {
        TimeIndex::NeighborhoodCount { radius: 1 }
    }
}

impl TimeIndex {
    pub fn build(self, graph: &TemporalGraph) -> Result<Box<dyn CandidateFilter>> {
        let filter: Box<dyn CandidateFilter> = match self {
            TimeIndex::Trivial => Box::new(TrivialFilter::new(graph)),
            TimeIndex::LabelPresence => Box::new(LabelPresenceIndex::build(graph)),
            TimeIndex::NeighborhoodCount { radius } => {
                Box::new(NeighborhoodCountIndex::build(graph, radius)?)
            }
        };
        tracing::info!(
            index = filter.name(),
            domain = graph.domain_size(),
            vertices = graph.vertex_count(),
            "built candidate filter"
        );
        Ok(filter)
    }
}
