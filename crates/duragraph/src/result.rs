//! Durable matches and their materialization.
//!
//! A match is reported as the matched target subgraph together with the
//! timestamps over which it holds. In collective mode one match carries every
//! maximal run of the joint lifespan; in continuous mode every run whose
//! length equals the best duration becomes its own match.

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeId, TemporalGraph, VertexId};
use crate::interval::IntervalSet;
use crate::lifespan::{DurabilityMode, Lifespan};
use crate::pattern::Pattern;

/// One pattern vertex and the target vertex assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchedVertex {
    pub pattern_vertex: String,
    pub vertex: VertexId,
    pub name: String,
    /// Labels of the target vertex that the pattern asked for.
    pub labels: Vec<String>,
}

/// Image of one pattern edge: every target edge between the two endpoints
/// that is present during the reported intervals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchedEdge {
    pub source: VertexId,
    pub target: VertexId,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchedSubgraph {
    /// In pattern vertex order.
    pub vertices: Vec<MatchedVertex>,
    /// In pattern edge order.
    pub edges: Vec<MatchedEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DurableMatch {
    pub subgraph: MatchedSubgraph,
    pub intervals: IntervalSet,
    pub duration: u32,
}

impl DurableMatch {
    /// Target vertex assigned to the pattern vertex called `pattern_vertex`.
    pub fn vertex_for(&self, pattern_vertex: &str) -> Option<VertexId> {
        self.subgraph
            .vertices
            .iter()
            .find(|m| m.pattern_vertex == pattern_vertex)
            .map(|m| m.vertex)
    }

    /// Target vertex names in pattern vertex order.
    pub fn vertex_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.subgraph.vertices.iter().map(|m| m.name.as_str())
    }
}

/// Turn one accepted assignment into reportable matches.
///
/// `mapping[i]` is the target of pattern vertex `i`; `joint` is the common
/// lifespan of the whole assignment and `duration` its measured duration.
pub(crate) fn materialize(
    graph: &TemporalGraph,
    pattern: &Pattern,
    mapping: &[VertexId],
    joint: &Lifespan,
    mode: DurabilityMode,
    duration: u32,
) -> Vec<DurableMatch> {
    let vertices: Vec<MatchedVertex> = pattern
        .vertices()
        .zip(mapping)
        .map(|(p, &v)| MatchedVertex {
            pattern_vertex: pattern.name(p).unwrap_or_default().to_string(),
            vertex: v,
            name: graph.vertex_name(v).unwrap_or_default().to_string(),
            labels: pattern.labels(p).map(str::to_string).collect(),
        })
        .collect();

    let subgraph_for = |span: &Lifespan| MatchedSubgraph {
        vertices: vertices.clone(),
        edges: pattern
            .edges()
            .map(|(s, t)| {
                let (source, target) = (mapping[s.index()], mapping[t.index()]);
                let edges = graph
                    .edges_between(source, target)
                    .iter()
                    .copied()
                    .filter(|&e| {
                        graph
                            .edge_lifespan(e)
                            .is_some_and(|l| l.as_bitmap().intersection_len(span.as_bitmap()) > 0)
                    })
                    .collect();
                MatchedEdge {
                    source,
                    target,
                    edges,
                }
            })
            .collect(),
    };

    match mode {
        DurabilityMode::Collective => vec![DurableMatch {
            subgraph: subgraph_for(joint),
            intervals: joint.to_intervals(),
            duration,
        }],
        DurabilityMode::Continuous => joint
            .runs_of_length(duration)
            .map(|run| {
                DurableMatch {
                    subgraph: subgraph_for(&joint.restrict(run)),
                    intervals: std::iter::once(run).collect(),
                    duration,
                }
            })
            .collect(),
    }
}
