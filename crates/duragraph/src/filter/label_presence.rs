//! Label-presence index: for every timestamp, which vertices carry which label.
//!
//! Exact for single-vertex label matching: a vertex is returned iff at some
//! timestamp of the interval it carries every label of the pattern vertex
//! (or is merely alive, for an unlabeled pattern vertex).

use ahash::AHashMap;
use roaring::RoaringBitmap;

use super::{CandidateFilter, IndexShape};
use crate::graph::{LabelId, TemporalGraph};
use crate::lifespan::Lifespan;
use crate::pattern::{BoundPattern, PatternVertex};

#[derive(Debug, Clone)]
pub struct LabelPresenceIndex {
    shape: IndexShape,
    /// t -> vertices alive at t
    alive: Vec<RoaringBitmap>,
    /// t -> label -> vertices carrying the label at t
    by_label: Vec<AHashMap<LabelId, RoaringBitmap>>,
}

impl LabelPresenceIndex {
    pub fn build(graph: &TemporalGraph) -> Self {
        let domain = graph.domain_size() as usize;
        let mut alive = vec![RoaringBitmap::new(); domain];
        let mut by_label: Vec<AHashMap<LabelId, RoaringBitmap>> = vec![AHashMap::new(); domain];

        for v in graph.vertices() {
            if let Some(span) = graph.vertex_lifespan(v) {
                for t in span.timestamps() {
                    alive[t as usize].insert(v.raw());
                }
            }
            for (label, span) in graph.labels_of(v) {
                for t in span.timestamps() {
                    by_label[t as usize]
                        .entry(label)
                        .or_insert_with(RoaringBitmap::new)
                        .insert(v.raw());
                }
            }
        }

        Self {
            shape: IndexShape::of(graph),
            alive,
            by_label,
        }
    }

    /// Vertices carrying all of `labels` at `t`.
    fn vertices_at(&self, t: usize, labels: &[LabelId]) -> RoaringBitmap {
        let Some(present) = self.by_label.get(t) else {
            return RoaringBitmap::new();
        };
        let mut out = self.alive[t].clone();
        for label in labels {
            match present.get(label) {
                Some(vertices) => out &= vertices,
                None => return RoaringBitmap::new(),
            }
            if out.is_empty() {
                break;
            }
        }
        out
    }
}

impl CandidateFilter for LabelPresenceIndex {
    fn name(&self) -> &'static str {
        "label_presence"
    }

    fn shape(&self) -> IndexShape {
        self.shape
    }

    fn filter_candidates(
        &self,
        pattern: &BoundPattern<'_>,
        vertex: PatternVertex,
        interval: &Lifespan,
    ) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        let Some(labels) = pattern.labels(vertex) else {
            return out;
        };
        for t in interval.timestamps() {
            out |= self.vertices_at(t as usize, labels);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::Snapshot;

    #[test]
    fn all_labels_must_hold_at_one_timestamp() {
        // x is A at 0 and B at 1, never both; y is A and B at 1.
        let mut s0 = Snapshot::new();
        s0.add_labeled_vertex("x", &["A"]);
        let mut s1 = Snapshot::new();
        s1.add_labeled_vertex("x", &["B"]);
        s1.add_labeled_vertex("y", &["A", "B"]);
        let g = TemporalGraph::from_snapshots(&[s0, s1]).unwrap();
        let index = LabelPresenceIndex::build(&g);

        let mut p = Pattern::new();
        let both = p.add_labeled_vertex("both", &["A", "B"]).unwrap();
        let any = p.add_vertex("any").unwrap();
        let bound = p.bind(&g).unwrap();
        let all = g.full_lifespan();

        let y = g.vertex_id("y").unwrap().raw();
        assert_eq!(
            index.filter_candidates(&bound, both, &all).iter().collect::<Vec<_>>(),
            vec![y]
        );
        assert_eq!(index.filter_candidates(&bound, any, &all).len(), 2);

        let first = Lifespan::from_timestamps(2, [0]).unwrap();
        assert_eq!(index.filter_candidates(&bound, any, &first).len(), 1);
    }
}
