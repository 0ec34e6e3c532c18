//! Snapshot-by-snapshot baseline.
//!
//! Enumerates the pattern's injective matches independently at every
//! timestamp of the interval and accumulates, per assignment, the timestamps
//! at which it matches. No pruning, no candidate filter: slow, but its result
//! is the definition the indexed search has to reproduce.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::graph::{TemporalGraph, VertexId};
use crate::interval::IntervalSet;
use crate::lifespan::{DurabilityMode, Lifespan, RunLength};
use crate::pattern::{BoundPattern, Pattern, PatternVertex};
use crate::result::{materialize, DurableMatch};

/// One assignment together with every timestamp at which it matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// `mapping[i]` is the target of pattern vertex `i`.
    pub mapping: Vec<VertexId>,
    pub lifespan: Lifespan,
}

pub struct BaselineSearch<'g> {
    graph: &'g TemporalGraph,
    run_length: RunLength,
}

impl<'g> BaselineSearch<'g> {
    pub fn new(graph: &'g TemporalGraph) -> Self {
        Self {
            graph,
            run_length: RunLength::default(),
        }
    }

    pub fn with_run_length(mut self, run_length: RunLength) -> Self {
        self.run_length = run_length;
        self
    }

    /// Every assignment that matches at one or more timestamps of `intervals`,
    /// ordered by mapping.
    pub fn occurrences(
        &self,
        pattern: &Pattern,
        intervals: &IntervalSet,
    ) -> Result<Vec<Occurrence>> {
        let interval = self.graph.interval_lifespan(intervals)?;
        self.occurrences_in(pattern, &interval)
    }

    pub fn occurrences_in(
        &self,
        pattern: &Pattern,
        interval: &Lifespan,
    ) -> Result<Vec<Occurrence>> {
        self.graph.check_lifespan(interval)?;
        let bound = pattern.bind(self.graph)?;
        let domain = self.graph.domain_size();

        let mut found: BTreeMap<Vec<VertexId>, Vec<u32>> = BTreeMap::new();
        for t in interval.timestamps() {
            let snapshot = SnapshotMatcher {
                graph: self.graph,
                pattern: &bound,
                t,
            };
            let mut mapping = Vec::with_capacity(bound.vertex_count());
            snapshot.extend(&mut mapping, &mut |m: &[VertexId]| {
                found.entry(m.to_vec()).or_default().push(t);
            });
        }

        tracing::debug!(occurrences = found.len(), "baseline enumeration finished");
        found
            .into_iter()
            .map(|(mapping, timestamps)| {
                Ok(Occurrence {
                    mapping,
                    lifespan: Lifespan::from_timestamps(domain, timestamps)?,
                })
            })
            .collect()
    }

    /// Most durable matches, in the same form as the indexed search reports them.
    pub fn query(
        &self,
        pattern: &Pattern,
        intervals: &IntervalSet,
        mode: DurabilityMode,
    ) -> Result<Vec<DurableMatch>> {
        let occurrences = self.occurrences(pattern, intervals)?;
        let scored: Vec<(u32, Occurrence)> = occurrences
            .into_iter()
            .map(|o| (mode.duration(&o.lifespan, self.run_length), o))
            .collect();
        let Some(best) = scored.iter().map(|(d, _)| *d).max() else {
            return Ok(Vec::new());
        };

        let mut out: Vec<DurableMatch> = scored
            .iter()
            .filter(|(d, _)| *d == best)
            .flat_map(|(d, o)| {
                materialize(self.graph, pattern, &o.mapping, &o.lifespan, mode, *d)
            })
            .collect();
        out.sort();
        out.dedup();
        Ok(out)
    }

    pub fn maximal_collective(
        &self,
        pattern: &Pattern,
        intervals: &IntervalSet,
    ) -> Result<Vec<DurableMatch>> {
        self.query(pattern, intervals, DurabilityMode::Collective)
    }

    pub fn maximal_continuous(
        &self,
        pattern: &Pattern,
        intervals: &IntervalSet,
    ) -> Result<Vec<DurableMatch>> {
        self.query(pattern, intervals, DurabilityMode::Continuous)
    }
}

/// Plain subgraph matching on the snapshot at `t`.
struct SnapshotMatcher<'a, 'p> {
    graph: &'a TemporalGraph,
    pattern: &'a BoundPattern<'p>,
    t: u32,
}

impl SnapshotMatcher<'_, '_> {
    fn vertex_matches(&self, p: PatternVertex, x: VertexId) -> bool {
        let Some(labels) = self.pattern.labels(p) else {
            return false;
        };
        self.graph
            .vertex_lifespan(x)
            .is_some_and(|l| l.contains(self.t))
            && labels.iter().all(|&l| {
                self.graph
                    .label_lifespan(x, l)
                    .is_some_and(|span| span.contains(self.t))
            })
    }

    fn edge_present(&self, source: VertexId, target: VertexId) -> bool {
        self.graph
            .link_lifespan(source, target)
            .is_some_and(|l| l.contains(self.t))
    }

    /// Extend `mapping` (targets of pattern vertices `0..mapping.len()`) in
    /// every consistent way and report each complete assignment.
    fn extend(&self, mapping: &mut Vec<VertexId>, emit: &mut dyn FnMut(&[VertexId])) {
        let depth = mapping.len();
        if depth == self.pattern.vertex_count() {
            emit(mapping);
            return;
        }
        let p = PatternVertex::new(depth);
        for x in self.graph.vertices() {
            if mapping.contains(&x) || !self.vertex_matches(p, x) {
                continue;
            }
            mapping.push(x);
            if self.edges_consistent(mapping) {
                self.extend(mapping, emit);
            }
            mapping.pop();
        }
    }

    /// Pattern edges between the newest vertex and the already placed ones.
    fn edges_consistent(&self, mapping: &[VertexId]) -> bool {
        let newest = mapping.len() - 1;
        self.pattern.pattern().edges().all(|(s, t)| {
            let (s, t) = (s.index(), t.index());
            if s.max(t) != newest {
                return true;
            }
            self.edge_present(mapping[s], mapping[t])
        })
    }
}
