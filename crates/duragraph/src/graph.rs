//! Temporal graph store: vertices, edges and labels annotated with lifespans.
//!
//! Storage is arena-style. Vertices, edges and labels are addressed by dense
//! `u32` handles; names are kept in side tables for lookups and reporting.
//! A graph is built once (from snapshots or explicit lifespans) and is
//! read-only afterwards, so it can be shared freely between queries.
//!
//! Structural adjacency (`out_neighbors`) ignores time: `c -> d` is a neighbor
//! relation if an edge `c -> d` exists at any timestamp. Durability is only
//! ever established through lifespan intersection.

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash, Hasher};

use crate::error::{DurableError, Result};
use crate::interval::IntervalSet;
use crate::lifespan::Lifespan;
use crate::snapshot::Snapshot;

// ============================================================================
// Handles
// ============================================================================

/// Target vertex handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(u32);

/// Target edge handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// Interned label handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LabelId(u32);

macro_rules! handle_impl {
    ($ty:ident) => {
        impl $ty {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle_impl!(VertexId);
handle_impl!(EdgeId);
handle_impl!(LabelId);

// ============================================================================
// Name tables
// ============================================================================

/// Dense name <-> id table. Ids are handed out in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NameTable {
    names: Vec<String>,
    ids: AHashMap<String, u32>,
}

impl NameTable {
    fn intern(&mut self, name: &str) -> (u32, bool) {
        if let Some(&id) = self.ids.get(name) {
            return (id, false);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        (id, true)
    }

    fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VertexRecord {
    lifespan: Lifespan,
    labels: BTreeMap<LabelId, Lifespan>,
}

/// A directed target edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Explicit identity, `None` for edges identified by their endpoints.
    pub key: Option<String>,
    pub source: VertexId,
    pub target: VertexId,
    pub lifespan: Lifespan,
}

/// All target edges `source -> target` for one ordered pair, with the union
/// of their lifespans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    edges: Vec<EdgeId>,
    lifespan: Lifespan,
}

impl Link {
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn lifespan(&self) -> &Lifespan {
        &self.lifespan
    }
}

// ============================================================================
// TemporalGraph
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalGraph {
    domain: u32,
    /// Content hash, fixed at build time.
    fingerprint: u64,
    vertex_names: NameTable,
    label_names: NameTable,
    vertices: Vec<VertexRecord>,
    edges: Vec<EdgeRecord>,
    /// vertex -> structural successors
    out_neighbors: Vec<RoaringBitmap>,
    /// vertex -> successor -> link
    links: Vec<BTreeMap<VertexId, Link>>,
}

impl TemporalGraph {
    /// Flatten an ordered snapshot sequence: bit `i` of an entity's lifespan is
    /// set iff the entity is present in `snapshots[i]`.
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Result<Self> {
        let domain = u32::try_from(snapshots.len()).map_err(|_| DurableError::DomainTooLarge {
            timestamps: snapshots.len(),
        })?;
        let mut builder = TemporalGraphBuilder::new(domain)?;

        for (t, snapshot) in snapshots.iter().enumerate() {
            let t = t as u32;
            for name in snapshot.vertices() {
                let v = builder.vertex_slot(name);
                builder.vertices[v.index()].lifespan.insert(t)?;
                for label in snapshot.labels(name) {
                    builder.label_slot(v, label).1.insert(t)?;
                }
            }
            for edge in snapshot.edges() {
                let source = builder.vertex_slot(edge.source);
                let target = builder.vertex_slot(edge.target);
                let e = match edge.key {
                    Some(key) => builder.keyed_edge_slot(key, source, target)?,
                    None => builder.pair_edge_slot(source, target),
                };
                builder.edges[e.index()].lifespan.insert(t)?;
            }
        }

        Ok(builder.build())
    }

    /// Size `T` of the time domain `[0, T)`.
    pub fn domain_size(&self) -> u32 {
        self.domain
    }

    /// Hash over names, labels, edges and every lifespan. Two graphs with the
    /// same fingerprint assign the same meaning to every handle.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn label_count(&self) -> usize {
        self.label_names.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    /// Bitmap holding every vertex id.
    pub fn vertex_bitmap(&self) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        out.insert_range(0..self.vertices.len() as u32);
        out
    }

    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.vertex_names.id_of(name).map(VertexId)
    }

    pub fn vertex_name(&self, v: VertexId) -> Option<&str> {
        self.vertex_names.name_of(v.0)
    }

    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.label_names.id_of(name).map(LabelId)
    }

    pub fn label_name(&self, l: LabelId) -> Option<&str> {
        self.label_names.name_of(l.0)
    }

    pub fn vertex_lifespan(&self, v: VertexId) -> Option<&Lifespan> {
        self.vertices.get(v.index()).map(|r| &r.lifespan)
    }

    /// `None` means the vertex never carries the label.
    pub fn label_lifespan(&self, v: VertexId, l: LabelId) -> Option<&Lifespan> {
        self.vertices.get(v.index())?.labels.get(&l)
    }

    /// Labels ever carried by `v`, with their lifespans.
    pub fn labels_of(&self, v: VertexId) -> impl Iterator<Item = (LabelId, &Lifespan)> + '_ {
        self.vertices
            .get(v.index())
            .into_iter()
            .flat_map(|r| r.labels.iter().map(|(l, span)| (*l, span)))
    }

    pub fn edge(&self, e: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(e.index())
    }

    pub fn edge_lifespan(&self, e: EdgeId) -> Option<&Lifespan> {
        self.edges.get(e.index()).map(|r| &r.lifespan)
    }

    /// Structural successors of `v`, ignoring time.
    pub fn out_neighbors(&self, v: VertexId) -> Option<&RoaringBitmap> {
        self.out_neighbors.get(v.index())
    }

    pub fn link(&self, source: VertexId, target: VertexId) -> Option<&Link> {
        self.links.get(source.index())?.get(&target)
    }

    /// Edges `source -> target`; empty if the pair is never connected.
    pub fn edges_between(&self, source: VertexId, target: VertexId) -> &[EdgeId] {
        self.link(source, target).map(Link::edges).unwrap_or(&[])
    }

    /// Union of the lifespans of all edges `source -> target`.
    pub fn link_lifespan(&self, source: VertexId, target: VertexId) -> Option<&Lifespan> {
        self.link(source, target).map(Link::lifespan)
    }

    pub fn full_lifespan(&self) -> Lifespan {
        Lifespan::full(self.domain)
    }

    /// Convert query intervals to a lifespan over this graph's domain.
    pub fn interval_lifespan(&self, intervals: &IntervalSet) -> Result<Lifespan> {
        Lifespan::from_intervals(self.domain, intervals)
    }

    pub fn check_lifespan(&self, lifespan: &Lifespan) -> Result<()> {
        if lifespan.domain() != self.domain {
            return Err(DurableError::DomainMismatch {
                expected: self.domain,
                found: lifespan.domain(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`TemporalGraph`] from explicit lifespans.
///
/// Adding an entity twice unions the lifespans. A label or edge lifespan also
/// extends the lifespans of the vertices it touches.
pub struct TemporalGraphBuilder {
    domain: u32,
    vertex_names: NameTable,
    label_names: NameTable,
    vertices: Vec<VertexRecord>,
    edges: Vec<EdgeRecord>,
    pair_edges: AHashMap<(VertexId, VertexId), EdgeId>,
    keyed_edges: AHashMap<String, EdgeId>,
}

impl TemporalGraphBuilder {
    pub fn new(domain: u32) -> Result<Self> {
        if domain == 0 {
            return Err(DurableError::EmptyDomain);
        }
        Ok(Self {
            domain,
            vertex_names: NameTable::default(),
            label_names: NameTable::default(),
            vertices: Vec::new(),
            edges: Vec::new(),
            pair_edges: AHashMap::new(),
            keyed_edges: AHashMap::new(),
        })
    }

    pub fn domain_size(&self) -> u32 {
        self.domain
    }

    fn check(&self, lifespan: &Lifespan) -> Result<()> {
        if lifespan.domain() != self.domain {
            return Err(DurableError::DomainMismatch {
                expected: self.domain,
                found: lifespan.domain(),
            });
        }
        Ok(())
    }

    fn require_vertex(&self, v: VertexId) -> Result<()> {
        if v.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(DurableError::UnknownVertexId { id: v.0 })
        }
    }

    pub fn add_vertex(&mut self, name: &str, lifespan: &Lifespan) -> Result<VertexId> {
        self.check(lifespan)?;
        let v = self.vertex_slot(name);
        self.vertices[v.index()].lifespan.or_assign(lifespan);
        Ok(v)
    }

    pub fn add_label(&mut self, v: VertexId, label: &str, lifespan: &Lifespan) -> Result<LabelId> {
        self.check(lifespan)?;
        self.require_vertex(v)?;
        let (l, span) = self.label_slot(v, label);
        span.or_assign(lifespan);
        self.vertices[v.index()].lifespan.or_assign(lifespan);
        Ok(l)
    }

    /// Edge identified by its endpoints.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        lifespan: &Lifespan,
    ) -> Result<EdgeId> {
        self.check(lifespan)?;
        self.require_vertex(source)?;
        self.require_vertex(target)?;
        let e = self.pair_edge_slot(source, target);
        self.extend_edge(e, lifespan);
        Ok(e)
    }

    /// Edge with its own identity; parallel keyed edges may share endpoints.
    pub fn add_keyed_edge(
        &mut self,
        key: &str,
        source: VertexId,
        target: VertexId,
        lifespan: &Lifespan,
    ) -> Result<EdgeId> {
        self.check(lifespan)?;
        self.require_vertex(source)?;
        self.require_vertex(target)?;
        let e = self.keyed_edge_slot(key, source, target)?;
        self.extend_edge(e, lifespan);
        Ok(e)
    }

    fn extend_edge(&mut self, e: EdgeId, lifespan: &Lifespan) {
        let record = &mut self.edges[e.index()];
        record.lifespan.or_assign(lifespan);
        let (source, target) = (record.source, record.target);
        self.vertices[source.index()].lifespan.or_assign(lifespan);
        self.vertices[target.index()].lifespan.or_assign(lifespan);
    }

    fn vertex_slot(&mut self, name: &str) -> VertexId {
        let (id, created) = self.vertex_names.intern(name);
        if created {
            self.vertices.push(VertexRecord {
                lifespan: Lifespan::empty(self.domain),
                labels: BTreeMap::new(),
            });
        }
        VertexId(id)
    }

    fn label_slot(&mut self, v: VertexId, label: &str) -> (LabelId, &mut Lifespan) {
        let l = LabelId(self.label_names.intern(label).0);
        let domain = self.domain;
        let span = self.vertices[v.index()]
            .labels
            .entry(l)
            .or_insert_with(|| Lifespan::empty(domain));
        (l, span)
    }

    fn pair_edge_slot(&mut self, source: VertexId, target: VertexId) -> EdgeId {
        if let Some(&e) = self.pair_edges.get(&(source, target)) {
            return e;
        }
        let e = self.push_edge(None, source, target);
        self.pair_edges.insert((source, target), e);
        e
    }

    fn keyed_edge_slot(&mut self, key: &str, source: VertexId, target: VertexId) -> Result<EdgeId> {
        if let Some(&e) = self.keyed_edges.get(key) {
            let record = &self.edges[e.index()];
            if record.source != source || record.target != target {
                let name = |v: VertexId| {
                    self.vertex_names
                        .name_of(v.0)
                        .unwrap_or_default()
                        .to_string()
                };
                return Err(DurableError::InconsistentEdge {
                    key: key.to_string(),
                    from: name(record.source),
                    to: name(record.target),
                    found_from: name(source),
                    found_to: name(target),
                });
            }
            return Ok(e);
        }
        let e = self.push_edge(Some(key.to_string()), source, target);
        self.keyed_edges.insert(key.to_string(), e);
        Ok(e)
    }

    fn push_edge(&mut self, key: Option<String>, source: VertexId, target: VertexId) -> EdgeId {
        let e = EdgeId(self.edges.len() as u32);
        self.edges.push(EdgeRecord {
            key,
            source,
            target,
            lifespan: Lifespan::empty(self.domain),
        });
        e
    }

    fn fingerprint(&self) -> u64 {
        let mut h = ahash::RandomState::with_seeds(
            0x6475_7261,
            0x6772_6170,
            0x685f_6670,
            0x7269_6e74,
        )
        .build_hasher();
        let hash_span = |h: &mut ahash::AHasher, span: &Lifespan| {
            span.collective_duration().hash(h);
            span.timestamps().for_each(|t| t.hash(h));
        };

        self.domain.hash(&mut h);
        self.vertex_names.names.hash(&mut h);
        self.label_names.names.hash(&mut h);
        for vertex in &self.vertices {
            hash_span(&mut h, &vertex.lifespan);
            vertex.labels.len().hash(&mut h);
            for (label, span) in &vertex.labels {
                label.hash(&mut h);
                hash_span(&mut h, span);
            }
        }
        for edge in &self.edges {
            edge.key.hash(&mut h);
            edge.source.hash(&mut h);
            edge.target.hash(&mut h);
            hash_span(&mut h, &edge.lifespan);
        }
        h.finish()
    }

    pub fn build(self) -> TemporalGraph {
        let n = self.vertices.len();
        let mut out_neighbors = vec![RoaringBitmap::new(); n];
        let mut links: Vec<BTreeMap<VertexId, Link>> = vec![BTreeMap::new(); n];

        for (i, edge) in self.edges.iter().enumerate() {
            out_neighbors[edge.source.index()].insert(edge.target.0);
            let link = links[edge.source.index()]
                .entry(edge.target)
                .or_insert_with(|| Link {
                    edges: Vec::new(),
                    lifespan: Lifespan::empty(self.domain),
                });
            link.edges.push(EdgeId(i as u32));
            link.lifespan.or_assign(&edge.lifespan);
        }

        let fingerprint = self.fingerprint();
        tracing::info!(
            domain = self.domain,
            vertices = n,
            edges = self.edges.len(),
            labels = self.label_names.len(),
            fingerprint,
            "built temporal graph"
        );

        TemporalGraph {
            domain: self.domain,
            fingerprint,
            vertex_names: self.vertex_names,
            label_names: self.label_names,
            vertices: self.vertices,
            edges: self.edges,
            out_neighbors,
            links,
        }
    }
}
