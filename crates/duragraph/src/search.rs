//! Durable pattern search.
//!
//! Finds every injective assignment of pattern vertices to target vertices
//! whose joint lifespan (vertex, label and edge lifespans intersected with
//! the query interval) has maximum duration, and reports all assignments that
//! reach it.
//!
//! The search is a branch-and-bound over pattern vertices in insertion order:
//!
//! 1. **Seed**: ask the candidate filter for every pattern vertex. An empty
//!    set ends the query with no results.
//! 2. **Refine**: for every pattern edge `u -> w` keep only the candidates of
//!    `u` that can reach some candidate of `w` with a joint lifespan of at
//!    least the current threshold, and replace the candidates of `w` by the
//!    targets that were reached.
//! 3. **Descend**: fix the next pattern vertex to each remaining candidate in
//!    turn, refine, and recurse. Once every vertex is fixed the assignment is
//!    evaluated and may raise the threshold.
//!
//! The threshold starts at 1. Intersection can only shrink a lifespan, so a
//! partial assignment already below the threshold can never recover and is
//! pruned. Raising the threshold discards everything found so far.

use parking_lot::Mutex;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::cancel::CancellationToken;
use crate::config::SearchConfig;
use crate::error::{DurableError, Result};
use crate::filter::CandidateFilter;
use crate::graph::{TemporalGraph, VertexId};
use crate::interval::IntervalSet;
use crate::lifespan::{DurabilityMode, Lifespan};
use crate::pattern::{BoundPattern, Pattern, PatternVertex};
use crate::result::{materialize, DurableMatch};

// ============================================================================
// Public entry point
// ============================================================================

/// Query engine over one temporal graph and one candidate filter built for it.
///
/// Both are borrowed, so any number of queries (even concurrent ones) can
/// share a single graph and index.
pub struct DurablePatternSearch<'g> {
    graph: &'g TemporalGraph,
    filter: &'g dyn CandidateFilter,
    config: SearchConfig,
    cancel: Option<CancellationToken>,
}

impl<'g> DurablePatternSearch<'g> {
    pub fn new(graph: &'g TemporalGraph, filter: &'g dyn CandidateFilter) -> Self {
        Self {
            graph,
            filter,
            config: SearchConfig::default(),
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Most durable matches of `pattern` within `intervals`.
    ///
    /// Results are sorted and free of duplicates. An empty result means no
    /// assignment holds at even a single timestamp.
    pub fn query(
        &self,
        pattern: &Pattern,
        intervals: &IntervalSet,
        mode: DurabilityMode,
    ) -> Result<Vec<DurableMatch>> {
        let interval = self.graph.interval_lifespan(intervals)?;
        self.query_lifespan(pattern, &interval, mode)
    }

    /// Like [`query`](Self::query) over the whole time domain.
    pub fn query_full_span(
        &self,
        pattern: &Pattern,
        mode: DurabilityMode,
    ) -> Result<Vec<DurableMatch>> {
        self.query_lifespan(pattern, &self.graph.full_lifespan(), mode)
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

    /// Query with the interval given as a lifespan over the graph's domain.
    pub fn query_lifespan(
        &self,
        pattern: &Pattern,
        interval: &Lifespan,
        mode: DurabilityMode,
    ) -> Result<Vec<DurableMatch>> {
        self.filter.shape().check(self.graph)?;
        self.graph.check_lifespan(interval)?;
        let bound = pattern.bind(self.graph)?;

        tracing::debug!(
            index = self.filter.name(),
            pattern_vertices = bound.vertex_count(),
            pattern_edges = pattern.edge_count(),
            ?mode,
            timestamps = interval.collective_duration(),
            parallel = self.config.parallel,
            "durable pattern query"
        );

        let session = Session {
            graph: self.graph,
            filter: self.filter,
            pattern: &bound,
            interval,
            mode,
            config: self.config,
            cancel: self.cancel.as_ref(),
            order: pattern.vertices().collect(),
            threshold: AtomicU32::new(1),
            state: Mutex::new(SearchState {
                threshold: 1,
                matches: BTreeSet::new(),
            }),
        };
        session.run()
    }
}

// ============================================================================
// Search state
// ============================================================================

/// Candidate target vertices per pattern vertex (indexed by pattern vertex).
#[derive(Debug, Clone)]
struct CandidateMap {
    sets: Vec<RoaringBitmap>,
}

impl CandidateMap {
    fn get(&self, v: PatternVertex) -> &RoaringBitmap {
        &self.sets[v.index()]
    }

    fn set(&mut self, v: PatternVertex, candidates: RoaringBitmap) {
        self.sets[v.index()] = candidates;
    }

    fn remove(&mut self, v: PatternVertex, x: VertexId) {
        self.sets[v.index()].remove(x.raw());
    }

    fn fix(&mut self, v: PatternVertex, x: VertexId) {
        let mut only = RoaringBitmap::new();
        only.insert(x.raw());
        self.set(v, only);
    }
}

struct SearchState {
    threshold: u32,
    matches: BTreeSet<DurableMatch>,
}

/// One running query.
struct Session<'s, 'p> {
    graph: &'s TemporalGraph,
    filter: &'s dyn CandidateFilter,
    pattern: &'s BoundPattern<'p>,
    interval: &'s Lifespan,
    mode: DurabilityMode,
    config: SearchConfig,
    cancel: Option<&'s CancellationToken>,
    /// Order in which pattern vertices are fixed.
    order: Vec<PatternVertex>,
    /// Lock-free mirror of `state.threshold` for pruning.
    threshold: AtomicU32,
    state: Mutex<SearchState>,
}

impl Session<'_, '_> {
    fn run(self) -> Result<Vec<DurableMatch>> {
        let mut seeds = CandidateMap {
            sets: vec![RoaringBitmap::new(); self.order.len()],
        };
        for &v in &self.order {
            let candidates = self
                .filter
                .filter_candidates(self.pattern, v, self.interval);
            tracing::trace!(vertex = v.index(), candidates = candidates.len(), "seeded");
            if candidates.is_empty() {
                tracing::debug!(vertex = v.index(), "pattern vertex has no candidates");
                return Ok(Vec::new());
            }
            seeds.set(v, candidates);
        }

        let Some(seeds) = self.refine(seeds)? else {
            tracing::debug!("refinement emptied the candidates");
            return Ok(Vec::new());
        };

        if self.config.parallel {
            let first = self.order[0];
            let roots: Vec<u32> = seeds.get(first).iter().collect();
            roots.par_iter().try_for_each(|&x| {
                let mut assignment = Vec::with_capacity(self.order.len());
                self.branch(0, &seeds, VertexId::new(x), &mut assignment)
            })?;
        } else {
            self.descend(0, &seeds, &mut Vec::with_capacity(self.order.len()))?;
        }

        let state = self.state.into_inner();
        tracing::debug!(
            duration = state.threshold,
            matches = state.matches.len(),
            "durable pattern query finished"
        );
        Ok(state.matches.into_iter().collect())
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(DurableError::Cancelled),
            _ => Ok(()),
        }
    }

    fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Acquire)
    }

    fn duration(&self, lifespan: &Lifespan) -> u32 {
        self.mode.duration(lifespan, self.config.run_length)
    }

    /// Interval ∧ vertex lifespan ∧ every label lifespan of the pattern vertex.
    fn label_set_lifespan(&self, v: PatternVertex, x: VertexId) -> Lifespan {
        let mut span = self.interval.clone();
        let (Some(labels), Some(alive)) = (self.pattern.labels(v), self.graph.vertex_lifespan(x))
        else {
            span.clear();
            return span;
        };
        span.and_assign(alive);
        for &label in labels {
            if span.is_empty() {
                break;
            }
            match self.graph.label_lifespan(x, label) {
                Some(l) => span.and_assign(l),
                None => span.clear(),
            }
        }
        span
    }

    // ------------------------------------------------------------------------
    // Refinement
    // ------------------------------------------------------------------------

    /// One pass over all pattern edges. `None` if some pattern vertex is left
    /// without candidates.
    fn refine(&self, mut candidates: CandidateMap) -> Result<Option<CandidateMap>> {
        self.check_cancelled()?;
        let threshold = self.threshold();

        for &u in &self.order {
            for &w in self.pattern.successors(u) {
                let mut reached = RoaringBitmap::new();
                let sources: Vec<u32> = candidates.get(u).iter().collect();
                for c in sources {
                    let c = VertexId::new(c);
                    let joined = self.time_join(u, c, w, &candidates, threshold);
                    if joined.is_empty() {
                        candidates.remove(u, c);
                    } else {
                        reached |= joined;
                    }
                }
                if reached.is_empty() {
                    return Ok(None);
                }
                candidates.set(w, reached);
            }
        }
        Ok(Some(candidates))
    }

    /// Candidates `d` of `w` reachable from `c` (a candidate of `u`) with a
    /// joint lifespan of at least `threshold`.
    fn time_join(
        &self,
        u: PatternVertex,
        c: VertexId,
        w: PatternVertex,
        candidates: &CandidateMap,
        threshold: u32,
    ) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        let source = self.label_set_lifespan(u, c);
        if self.duration(&source) < threshold {
            return out;
        }
        let Some(successors) = self.graph.out_neighbors(c) else {
            return out;
        };

        for d in (candidates.get(w) & successors).iter() {
            let d = VertexId::new(d);
            let Some(link) = self.graph.link_lifespan(c, d) else {
                continue;
            };
            let mut joint = self.label_set_lifespan(w, d);
            joint.and_assign(&source);
            joint.and_assign(link);
            if self.duration(&joint) >= threshold {
                out.insert(d.raw());
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------------

    fn descend(
        &self,
        depth: usize,
        candidates: &CandidateMap,
        assignment: &mut Vec<VertexId>,
    ) -> Result<()> {
        self.check_cancelled()?;
        if depth == self.order.len() {
            self.evaluate(assignment);
            return Ok(());
        }
        let v = self.order[depth];
        for x in candidates.get(v).iter() {
            self.branch(depth, candidates, VertexId::new(x), assignment)?;
        }
        Ok(())
    }

    /// Fix `order[depth]` to `x` and explore below it.
    fn branch(
        &self,
        depth: usize,
        candidates: &CandidateMap,
        x: VertexId,
        assignment: &mut Vec<VertexId>,
    ) -> Result<()> {
        if assignment.contains(&x) {
            return Ok(());
        }
        let mut fixed = candidates.clone();
        fixed.fix(self.order[depth], x);
        let Some(refined) = self.refine(fixed)? else {
            return Ok(());
        };
        assignment.push(x);
        let out = self.descend(depth + 1, &refined, assignment);
        assignment.pop();
        out
    }

    /// Score a complete assignment (`assignment[i]` is the target of `order[i]`).
    fn evaluate(&self, assignment: &[VertexId]) {
        let mut mapping = vec![VertexId::new(0); assignment.len()];
        for (&v, &x) in self.order.iter().zip(assignment) {
            mapping[v.index()] = x;
        }

        let mut joint = self.interval.clone();
        for &v in &self.order {
            joint.and_assign(&self.label_set_lifespan(v, mapping[v.index()]));
            if joint.is_empty() {
                return;
            }
        }
        for (s, t) in self.pattern.pattern().edges() {
            let Some(link) = self.graph.link_lifespan(mapping[s.index()], mapping[t.index()])
            else {
                return;
            };
            joint.and_assign(link);
            if joint.is_empty() {
                return;
            }
        }

        let duration = self.duration(&joint);
        self.accept(duration, &mapping, &joint);
    }

    fn accept(&self, duration: u32, mapping: &[VertexId], joint: &Lifespan) {
        let mut state = self.state.lock();
        if duration < state.threshold {
            return;
        }
        if duration > state.threshold {
            tracing::trace!(from = state.threshold, to = duration, "raised threshold");
            state.threshold = duration;
            state.matches.clear();
            self.threshold.store(duration, Ordering::Release);
        }
        let matches = materialize(
            self.graph,
            self.pattern.pattern(),
            mapping,
            joint,
            self.mode,
            duration,
        );
        state.matches.extend(matches);
    }
}
