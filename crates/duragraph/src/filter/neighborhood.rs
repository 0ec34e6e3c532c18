//! Neighborhood-count index.
//!
//! For every target vertex and label the index keeps one counter per
//! timestamp:
//! - radius 0: 1 if the vertex itself carries the label at `t`, else 0
//! - radius 1: how many structural out-neighbors carry the label at `t`
//!
//! plus, per vertex, how many out-neighbors are alive at `t`.
//!
//! A candidate is admitted if at some timestamp of the interval it carries all
//! labels of the pattern vertex and has, for every label, at least as many
//! out-neighbors carrying it as the pattern vertex has distinct successors
//! carrying it. A match maps distinct pattern successors to distinct target
//! out-neighbors, so every real match passes at each timestamp it holds.
//!
//! Only radius 0 and 1 are defined.

use roaring::RoaringBitmap;
use std::collections::BTreeMap;

use super::{CandidateFilter, IndexShape};
use crate::error::{DurableError, Result};
use crate::graph::{LabelId, TemporalGraph, VertexId};
use crate::lifespan::Lifespan;
use crate::pattern::{BoundPattern, PatternVertex};

type Counters = Vec<u32>;

#[derive(Debug, Clone, Default)]
struct VertexCounters {
    alive: Counters,
    /// radius 0
    own: BTreeMap<LabelId, Counters>,
    /// radius 1
    neighbors: BTreeMap<LabelId, Counters>,
    alive_neighbors: Counters,
}

#[derive(Debug, Clone)]
pub struct NeighborhoodCountIndex {
    shape: IndexShape,
    radius: u8,
    counters: Vec<VertexCounters>,
}

/// What a pattern vertex demands of a candidate.
struct Requirement<'a> {
    labels: &'a [LabelId],
    neighbor_labels: BTreeMap<LabelId, u32>,
    neighbors: u32,
}

impl NeighborhoodCountIndex {
    pub fn build(graph: &TemporalGraph, radius: u8) -> Result<Self> {
        if radius > 1 {
            return Err(DurableError::UnsupportedRadius { radius });
        }

        let domain = graph.domain_size() as usize;
        let zeros = || vec![0u32; domain];

        let mut counters: Vec<VertexCounters> = graph
            .vertices()
            .map(|v| {
                let mut c = VertexCounters {
                    alive: zeros(),
                    alive_neighbors: zeros(),
                    ..VertexCounters::default()
                };
                if let Some(span) = graph.vertex_lifespan(v) {
                    for t in span.timestamps() {
                        c.alive[t as usize] = 1;
                    }
                }
                for (label, span) in graph.labels_of(v) {
                    let own = c.own.entry(label).or_insert_with(zeros);
                    for t in span.timestamps() {
                        own[t as usize] = 1;
                    }
                }
                c
            })
            .collect();

        if radius >= 1 {
            for v in graph.vertices() {
                let Some(successors) = graph.out_neighbors(v) else {
                    continue;
                };
                for w in successors.iter() {
                    let w = VertexId::new(w);
                    if let Some(span) = graph.vertex_lifespan(w) {
                        for t in span.timestamps() {
                            counters[v.index()].alive_neighbors[t as usize] += 1;
                        }
                    }
                    for (label, span) in graph.labels_of(w) {
                        let slot = counters[v.index()]
                            .neighbors
                            .entry(label)
                            .or_insert_with(zeros);
                        for t in span.timestamps() {
                            slot[t as usize] += 1;
                        }
                    }
                }
            }
        }

        Ok(Self {
            shape: IndexShape::of(graph),
            radius,
            counters,
        })
    }

    pub fn radius(&self) -> u8 {
        self.radius
    }

    fn requirement<'a>(
        &self,
        pattern: &'a BoundPattern<'_>,
        vertex: PatternVertex,
    ) -> Option<Requirement<'a>> {
        let labels = pattern.labels(vertex)?;
        let mut req = Requirement {
            labels,
            neighbor_labels: BTreeMap::new(),
            neighbors: 0,
        };
        if self.radius >= 1 {
            for &w in pattern.successors(vertex) {
                req.neighbors += 1;
                // A successor that can never match means there is no match at all.
                for &label in pattern.labels(w)? {
                    *req.neighbor_labels.entry(label).or_insert(0) += 1;
                }
            }
        }
        Some(req)
    }

    fn admits(&self, c: &VertexCounters, t: usize, req: &Requirement<'_>) -> bool {
        if c.alive[t] == 0 {
            return false;
        }
        let own = req
            .labels
            .iter()
            .all(|l| c.own.get(l).is_some_and(|counts| counts[t] > 0));
        if !own || self.radius == 0 {
            return own;
        }
        if c.alive_neighbors[t] < req.neighbors {
            return false;
        }
        req.neighbor_labels
            .iter()
            .all(|(l, &need)| c.neighbors.get(l).map_or(0, |counts| counts[t]) >= need)
    }
}

impl CandidateFilter for NeighborhoodCountIndex {
    fn name(&self) -> &'static str {
        "neighborhood_count"
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
        let Some(req) = self.requirement(pattern, vertex) else {
            return out;
        };
        for (v, c) in self.counters.iter().enumerate() {
            let hit = interval
                .timestamps()
                .filter(|&t| (t as usize) < c.alive.len())
                .any(|t| self.admits(c, t as usize, &req));
            if hit {
                out.insert(v as u32);
            }
        }
        out
    }
}
