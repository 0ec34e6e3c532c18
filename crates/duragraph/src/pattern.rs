//! Query patterns.
//!
//! A pattern is a small labeled directed graph without lifespans: it is taken
//! to exist at every timestamp. Pattern vertices are addressed by
//! [`PatternVertex`] handles in insertion order, which is also the order the
//! search fixes them in.
//!
//! Parallel pattern edges (two edges over the same ordered pair) are rejected
//! when they are added.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{DurableError, Result};
use crate::graph::{LabelId, TemporalGraph};

/// Pattern vertex handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PatternVertex(usize);

impl PatternVertex {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    names: Vec<String>,
    labels: Vec<BTreeSet<String>>,
    edges: BTreeSet<(PatternVertex, PatternVertex)>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, name: &str) -> Result<PatternVertex> {
        if self.names.iter().any(|n| n == name) {
            return Err(DurableError::DuplicateVertex {
                name: name.to_string(),
            });
        }
        self.names.push(name.to_string());
        self.labels.push(BTreeSet::new());
        Ok(PatternVertex(self.names.len() - 1))
    }

    pub fn add_labeled_vertex(&mut self, name: &str, labels: &[&str]) -> Result<PatternVertex> {
        let v = self.add_vertex(name)?;
        self.labels[v.0].extend(labels.iter().map(|l| l.to_string()));
        Ok(v)
    }

    pub fn add_label(&mut self, v: PatternVertex, label: &str) -> Result<bool> {
        self.require(v)?;
        Ok(self.labels[v.0].insert(label.to_string()))
    }

    /// Add `source -> target`. Self-loops are allowed, parallel edges are not.
    pub fn add_edge(&mut self, source: PatternVertex, target: PatternVertex) -> Result<()> {
        self.require(source)?;
        self.require(target)?;
        if !self.edges.insert((source, target)) {
            return Err(DurableError::ParallelPatternEdge {
                from: self.names[source.0].clone(),
                to: self.names[target.0].clone(),
            });
        }
        Ok(())
    }

    fn require(&self, v: PatternVertex) -> Result<()> {
        if v.0 < self.names.len() {
            Ok(())
        } else {
            Err(DurableError::UnknownPatternVertex { index: v.0 })
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = PatternVertex> {
        (0..self.names.len()).map(PatternVertex)
    }

    pub fn vertex(&self, name: &str) -> Option<PatternVertex> {
        self.names.iter().position(|n| n == name).map(PatternVertex)
    }

    pub fn name(&self, v: PatternVertex) -> Option<&str> {
        self.names.get(v.0).map(String::as_str)
    }

    pub fn labels(&self, v: PatternVertex) -> impl Iterator<Item = &str> + '_ {
        self.labels
            .get(v.0)
            .into_iter()
            .flat_map(|labels| labels.iter().map(String::as_str))
    }

    /// Edges in ascending `(source, target)` order.
    pub fn edges(&self) -> impl Iterator<Item = (PatternVertex, PatternVertex)> + '_ {
        self.edges.iter().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolve label names against `graph`.
    pub fn bind<'p>(&'p self, graph: &TemporalGraph) -> Result<BoundPattern<'p>> {
        if self.is_empty() {
            return Err(DurableError::EmptyPattern);
        }

        let vertices = self
            .labels
            .iter()
            .map(|labels| {
                let ids: Option<Vec<LabelId>> =
                    labels.iter().map(|l| graph.label_id(l)).collect();
                match ids {
                    Some(labels) => BoundVertex {
                        labels,
                        satisfiable: true,
                    },
                    None => BoundVertex {
                        labels: Vec::new(),
                        satisfiable: false,
                    },
                }
            })
            .collect();

        let mut successors = vec![Vec::new(); self.names.len()];
        for &(source, target) in &self.edges {
            successors[source.0].push(target);
        }

        Ok(BoundPattern {
            pattern: self,
            vertices,
            successors,
        })
    }
}

#[derive(Debug, Clone)]
struct BoundVertex {
    labels: Vec<LabelId>,
    /// `false` if some label never occurs in the graph.
    satisfiable: bool,
}

/// A pattern whose labels have been resolved against one temporal graph.
#[derive(Debug, Clone)]
pub struct BoundPattern<'p> {
    pattern: &'p Pattern,
    vertices: Vec<BoundVertex>,
    successors: Vec<Vec<PatternVertex>>,
}

impl<'p> BoundPattern<'p> {
    pub fn pattern(&self) -> &'p Pattern {
        self.pattern
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Label ids of `v`, or `None` if `v` carries a label the graph never uses
    /// (no target vertex can match it).
    pub fn labels(&self, v: PatternVertex) -> Option<&[LabelId]> {
        let bound = self.vertices.get(v.0)?;
        bound.satisfiable.then_some(bound.labels.as_slice())
    }

    /// Distinct pattern successors of `v`, ascending.
    pub fn successors(&self, v: PatternVertex) -> &[PatternVertex] {
        self.successors.get(v.0).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_edges_are_rejected() {
        let mut p = Pattern::new();
        let a = p.add_vertex("a").unwrap();
        let b = p.add_vertex("b").unwrap();
        p.add_edge(a, b).unwrap();
        p.add_edge(b, a).unwrap();
        assert!(matches!(
            p.add_edge(a, b),
            Err(DurableError::ParallelPatternEdge { .. })
        ));
        assert_eq!(p.edge_count(), 2);
    }

    #[test]
    fn duplicate_names_and_foreign_handles_are_rejected() {
        let mut p = Pattern::new();
        let a = p.add_vertex("a").unwrap();
        assert!(p.add_vertex("a").is_err());
        assert_eq!(
            p.add_edge(a, PatternVertex::new(7)),
            Err(DurableError::UnknownPatternVertex { index: 7 })
        );
    }

    #[test]
    fn binding_an_empty_pattern_fails() {
        let mut s = crate::Snapshot::new();
        s.add_vertex("v");
        let g = TemporalGraph::from_snapshots(&[s]).unwrap();
        assert_eq!(
            Pattern::new().bind(&g).unwrap_err(),
            DurableError::EmptyPattern
        );
    }

    #[test]
    fn unknown_labels_make_a_vertex_unsatisfiable() {
        let mut s = crate::Snapshot::new();
        s.add_labeled_vertex("v", &["KNOWN"]);
        let g = TemporalGraph::from_snapshots(&[s]).unwrap();

        let mut p = Pattern::new();
        let known = p.add_labeled_vertex("k", &["KNOWN"]).unwrap();
        let unknown = p.add_labeled_vertex("u", &["KNOWN", "MISSING"]).unwrap();
        let bound = p.bind(&g).unwrap();
        assert_eq!(bound.labels(known).map(<[_]>::len), Some(1));
        assert!(bound.labels(unknown).is_none());
    }
}
