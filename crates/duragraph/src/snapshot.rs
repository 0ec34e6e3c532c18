//! One timestamp's view of the graph, as handed over by ingestion.
//!
//! A snapshot is a plain labeled directed graph. Edges are identified either
//! by their endpoint pair (at most one such edge per ordered pair) or by an
//! explicit key, which allows several edges between the same pair.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DurableError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// vertex name -> labels carried in this snapshot
    vertices: BTreeMap<String, BTreeSet<String>>,
    /// Edges identified by their endpoints.
    pairs: BTreeSet<(String, String)>,
    /// Edges identified by a key: key -> (source, target).
    keyed: BTreeMap<String, (String, String)>,
}

/// Borrowed view of a snapshot edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEdge<'a> {
    pub key: Option<&'a str>,
    pub source: &'a str,
    pub target: &'a str,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the vertex was already present.
    pub fn add_vertex(&mut self, name: &str) -> bool {
        if self.vertices.contains_key(name) {
            return false;
        }
        self.vertices.insert(name.to_string(), BTreeSet::new());
        true
    }

    pub fn contains_vertex(&self, name: &str) -> bool {
        self.vertices.contains_key(name)
    }

    /// Attach `label` to an existing vertex.
    pub fn add_label(&mut self, vertex: &str, label: &str) -> Result<bool> {
        let labels = self
            .vertices
            .get_mut(vertex)
            .ok_or_else(|| DurableError::UnknownVertex {
                name: vertex.to_string(),
            })?;
        Ok(labels.insert(label.to_string()))
    }

    /// Add a vertex together with its labels.
    pub fn add_labeled_vertex(&mut self, name: &str, labels: &[&str]) -> bool {
        let added = self.add_vertex(name);
        if let Some(set) = self.vertices.get_mut(name) {
            set.extend(labels.iter().map(|l| l.to_string()));
        }
        added
    }

    /// Add the edge `source -> target`, identified by its endpoints.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<bool> {
        self.require_vertex(source)?;
        self.require_vertex(target)?;
        Ok(self.pairs.insert((source.to_string(), target.to_string())))
    }

    /// Add an edge with its own identity, so parallel edges can coexist.
    pub fn add_keyed_edge(&mut self, key: &str, source: &str, target: &str) -> Result<bool> {
        self.require_vertex(source)?;
        self.require_vertex(target)?;
        if let Some((s, t)) = self.keyed.get(key) {
            if s != source || t != target {
                return Err(DurableError::InconsistentEdge {
                    key: key.to_string(),
                    from: s.clone(),
                    to: t.clone(),
                    found_from: source.to_string(),
                    found_to: target.to_string(),
                });
            }
            return Ok(false);
        }
        self.keyed
            .insert(key.to_string(), (source.to_string(), target.to_string()));
        Ok(true)
    }

    fn require_vertex(&self, name: &str) -> Result<()> {
        if self.vertices.contains_key(name) {
            Ok(())
        } else {
            Err(DurableError::UnknownVertex {
                name: name.to_string(),
            })
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.pairs.len() + self.keyed.len()
    }

    /// Vertex names in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = &str> + '_ {
        self.vertices.keys().map(String::as_str)
    }

    pub fn labels(&self, vertex: &str) -> impl Iterator<Item = &str> + '_ {
        self.vertices
            .get(vertex)
            .into_iter()
            .flat_map(|labels| labels.iter().map(String::as_str))
    }

    /// Pair-identified edges first, then keyed edges.
    pub fn edges(&self) -> impl Iterator<Item = SnapshotEdge<'_>> + '_ {
        let pairs = self.pairs.iter().map(|(s, t)| SnapshotEdge {
            key: None,
            source: s,
            target: t,
        });
        let keyed = self.keyed.iter().map(|(k, (s, t))| SnapshotEdge {
            key: Some(k),
            source: s,
            target: t,
        });
        pairs.chain(keyed)
    }
}
