#![allow(dead_code)]

use std::collections::BTreeSet;

use duragraph::{
    DurabilityMode, IntervalSet, Lifespan, Pattern, TemporalGraph, TemporalGraphBuilder, VertexId,
};
use proptest::prelude::*;

pub const LABELS: [&str; 2] = ["A", "B"];
pub const MAX_DOMAIN: u32 = 4;
pub const MAX_VERTICES: usize = 6;
pub const MAX_EDGES: usize = 10;
pub const MAX_PATTERN_VERTICES: usize = 3;

/// Small random temporal graph, described by bit masks over the domain.
#[derive(Debug, Clone)]
pub struct GraphSpec {
    pub domain: u32,
    /// (alive mask, mask of label A, mask of label B)
    pub vertices: Vec<(u8, u8, u8)>,
    /// (source, target, alive mask, keyed)
    pub edges: Vec<(usize, usize, u8, bool)>,
}

impl GraphSpec {
    pub fn lifespan(&self, mask: u8) -> Lifespan {
        Lifespan::from_timestamps(self.domain, (0..self.domain).filter(|t| mask >> t & 1 == 1))
            .expect("mask is within the domain")
    }

    pub fn build(&self) -> TemporalGraph {
        let mut b = TemporalGraphBuilder::new(self.domain).expect("domain is non-empty");
        let ids: Vec<VertexId> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &(alive, _, _))| {
                b.add_vertex(&format!("v{i}"), &self.lifespan(alive))
                    .expect("vertex")
            })
            .collect();
        for (i, &(_, a, bb)) in self.vertices.iter().enumerate() {
            for (label, mask) in LABELS.iter().zip([a, bb]) {
                if mask != 0 {
                    b.add_label(ids[i], label, &self.lifespan(mask)).expect("label");
                }
            }
        }
        for (k, &(s, t, alive, keyed)) in self.edges.iter().enumerate() {
            let span = self.lifespan(alive);
            if keyed {
                b.add_keyed_edge(&format!("e{k}"), ids[s], ids[t], &span)
                    .expect("keyed edge");
            } else {
                b.add_edge(ids[s], ids[t], &span).expect("edge");
            }
        }
        b.build()
    }
}

/// Small random pattern: per vertex a label choice (0 = none, 1 = A, 2 = B,
/// 3 = A and B) and an adjacency matrix.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub labels: Vec<u8>,
    pub adjacency: Vec<bool>,
}

impl PatternSpec {
    pub fn build(&self) -> Pattern {
        let n = self.labels.len();
        let mut p = Pattern::new();
        let vs: Vec<_> = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, &choice)| {
                let labels: Vec<&str> = LABELS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| choice >> bit & 1 == 1)
                    .map(|(_, l)| *l)
                    .collect();
                p.add_labeled_vertex(&format!("p{i}"), &labels)
                    .expect("pattern vertex")
            })
            .collect();
        for s in 0..n {
            for t in 0..n {
                if self.adjacency[s * n + t] {
                    p.add_edge(vs[s], vs[t]).expect("pattern edge");
                }
            }
        }
        p
    }
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub graph: GraphSpec,
    pub pattern: PatternSpec,
    pub interval: (u32, u32),
}

impl Fixture {
    pub fn intervals(&self) -> IntervalSet {
        IntervalSet::closed(self.interval.0, self.interval.1).expect("ordered interval")
    }

    /// Best duration and the winning assignments (as vertex names in pattern
    /// order), computed straight from the masks over every injective mapping.
    pub fn direct_enumeration(&self, mode: DurabilityMode) -> (u32, BTreeSet<Vec<String>>) {
        let g = &self.graph;
        let n = g.vertices.len();
        let k = self.pattern.labels.len();

        // Labels and edges keep their vertices alive.
        let alive: Vec<u8> = (0..n)
            .map(|i| {
                let (v, a, b) = g.vertices[i];
                g.edges
                    .iter()
                    .filter(|e| e.0 == i || e.1 == i)
                    .fold(v | a | b, |m, e| m | e.2)
            })
            .collect();
        let link = |s: usize, t: usize| {
            g.edges
                .iter()
                .filter(|e| e.0 == s && e.1 == t)
                .fold(0u8, |m, e| m | e.2)
        };
        let window = (self.interval.0..=self.interval.1).fold(0u8, |m, t| m | 1 << t);

        let mut best = 0;
        let mut winners = BTreeSet::new();
        for mapping in injective_mappings(k, n) {
            let mut joint = window;
            for (p, &x) in mapping.iter().enumerate() {
                let (_, a, b) = g.vertices[x];
                let choice = self.pattern.labels[p];
                joint &= alive[x];
                if choice & 1 == 1 {
                    joint &= a;
                }
                if choice & 2 == 2 {
                    joint &= b;
                }
                for (q, &y) in mapping.iter().enumerate() {
                    if self.pattern.adjacency[p * k + q] {
                        joint &= link(x, y);
                    }
                }
            }
            let duration = match mode {
                DurabilityMode::Collective => joint.count_ones(),
                DurabilityMode::Continuous => longest_run(joint),
            };
            if duration == 0 || duration < best {
                continue;
            }
            if duration > best {
                best = duration;
                winners.clear();
            }
            winners.insert(mapping.iter().map(|x| format!("v{x}")).collect());
        }
        (best, winners)
    }
}

fn injective_mappings(k: usize, n: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new()];
    for _ in 0..k {
        let mut next = Vec::new();
        for prefix in &out {
            for x in 0..n {
                if !prefix.contains(&x) {
                    let mut extended = prefix.clone();
                    extended.push(x);
                    next.push(extended);
                }
            }
        }
        out = next;
    }
    out
}

fn longest_run(mask: u8) -> u32 {
    let (mut best, mut run) = (0, 0);
    for t in 0..8 {
        if mask >> t & 1 == 1 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

pub fn graph_spec() -> impl Strategy<Value = GraphSpec> {
    (1u32..=MAX_DOMAIN, 1usize..=MAX_VERTICES)
        .prop_flat_map(|(domain, n)| {
            let mask = 0u8..(1u8 << domain);
            (
                Just(domain),
                prop::collection::vec((mask.clone(), mask.clone(), mask.clone()), n),
                prop::collection::vec((0..n, 0..n, mask, any::<bool>()), 0..=MAX_EDGES),
            )
        })
        .prop_map(|(domain, vertices, edges)| GraphSpec {
            domain,
            vertices,
            edges,
        })
}

pub fn pattern_spec() -> impl Strategy<Value = PatternSpec> {
    (1usize..=MAX_PATTERN_VERTICES)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(0u8..4, n),
                prop::collection::vec(prop::bool::weighted(0.4), n * n),
            )
        })
        .prop_map(|(labels, adjacency)| PatternSpec { labels, adjacency })
}

pub fn fixture() -> impl Strategy<Value = Fixture> {
    graph_spec()
        .prop_flat_map(|graph| {
            let domain = graph.domain;
            (Just(graph), pattern_spec(), 0..domain, 0..domain)
        })
        .prop_map(|(graph, pattern, a, b)| Fixture {
            graph,
            pattern,
            interval: (a.min(b), a.max(b)),
        })
}
