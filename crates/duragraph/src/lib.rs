//! Durable pattern search over temporal graphs.
//!
//! A temporal graph is a labeled directed graph whose vertices, edges and
//! vertex labels each carry a *lifespan*: the set of timestamps in a finite
//! domain `[0, T)` at which they exist. Given a small pattern graph and a
//! query interval, the search returns the occurrences of the pattern that
//! hold for the longest time, either in total ([`DurabilityMode::Collective`])
//! or without interruption ([`DurabilityMode::Continuous`]).
//!
//! ```text
//! snapshots ──► TemporalGraph ──► TimeIndex::build ──► CandidateFilter
//!                     │                                      │
//!                     └──────────► DurablePatternSearch ◄────┘
//!                                          │
//!                                          ▼
//!                                  Vec<DurableMatch>
//! ```
//!
//! The graph and the filter are built once and shared by every query.

pub mod baseline;
pub mod cancel;
pub mod config;
pub mod error;
pub mod filter;
pub mod graph;
pub mod interval;
pub mod lifespan;
pub mod pattern;
pub mod result;
pub mod search;
pub mod snapshot;

pub use baseline::{BaselineSearch, Occurrence};
pub use cancel::CancellationToken;
pub use config::{DurableConfig, SearchConfig};
pub use error::{DurableError, Result};
pub use filter::{
    CandidateFilter, IndexShape, LabelPresenceIndex, NeighborhoodCountIndex, TimeIndex,
    TrivialFilter,
};
pub use graph::{
    EdgeId, EdgeRecord, LabelId, Link, TemporalGraph, TemporalGraphBuilder, VertexId,
};
pub use interval::{Interval, IntervalSet};
pub use lifespan::{DurabilityMode, Lifespan, RunLength};
pub use pattern::{BoundPattern, Pattern, PatternVertex};
pub use result::{DurableMatch, MatchedEdge, MatchedSubgraph, MatchedVertex};
pub use search::DurablePatternSearch;
pub use snapshot::{Snapshot, SnapshotEdge};
