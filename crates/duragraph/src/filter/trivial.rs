use roaring::RoaringBitmap;

use super::{CandidateFilter, IndexShape};
use crate::graph::TemporalGraph;
use crate::lifespan::Lifespan;
use crate::pattern::{BoundPattern, PatternVertex};

/// Admits every target vertex. Always sound, never prunes.
#[derive(Debug, Clone)]
pub struct TrivialFilter {
    shape: IndexShape,
    all: RoaringBitmap,
}

impl TrivialFilter {
    pub fn new(graph: &TemporalGraph) -> Self {
        Self {
            shape: IndexShape::of(graph),
            all: graph.vertex_bitmap(),
        }
    }
}

impl CandidateFilter for TrivialFilter {
    fn name(&self) -> &'static str {
        "trivial"
    }

    fn shape(&self) -> IndexShape {
        self.shape
    }

    fn filter_candidates(
        &self,
        _pattern: &BoundPattern<'_>,
        _vertex: PatternVertex,
        _interval: &Lifespan,
    ) -> RoaringBitmap {
        self.all.clone()
    }
}
