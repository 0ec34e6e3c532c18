//! Error type shared by graph construction, pattern building and queries.
//!
//! Exhausted branches and empty candidate sets are not errors: they prune the
//! search and, at worst, produce an empty result.

pub type Result<T> = std::result::Result<T, DurableError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurableError {
    #[error("a temporal graph requires at least one timestamp")]
    EmptyDomain,

    #[error("{timestamps} timestamps exceed the supported time domain")]
    DomainTooLarge { timestamps: usize },

    #[error("lifespan has domain {found}, expected {expected}")]
    DomainMismatch { expected: u32, found: u32 },

    #[error("invalid interval [{start}, {end}]: start is after end")]
    InvalidInterval { start: u32, end: u32 },

    #[error("interval [{start}, {end}] lies outside the time domain [0, {domain})")]
    IntervalOutOfDomain { start: u32, end: u32, domain: u32 },

    #[error("unknown vertex `{name}`")]
    UnknownVertex { name: String },

    #[error("unknown vertex id {id}")]
    UnknownVertexId { id: u32 },

    #[error("duplicate vertex `{name}`")]
    DuplicateVertex { name: String },

    #[error("edge `{key}` connects {found_from} -> {found_to}, but was first seen as {from} -> {to}")]
    InconsistentEdge {
        key: String,
        from: String,
        to: String,
        found_from: String,
        found_to: String,
    },

    #[error("pattern is empty")]
    EmptyPattern,

    #[error("unknown pattern vertex {index}")]
    UnknownPatternVertex { index: usize },

    #[error("pattern already has an edge `{from}` -> `{to}`; parallel pattern edges are unsupported")]
    ParallelPatternEdge { from: String, to: String },

    #[error(
        "candidate filter was built for graph {index_fingerprint:016x} ({index_vertices} vertices \
         over {index_domain} timestamps), but the graph is {graph_fingerprint:016x} \
         ({graph_vertices} vertices over {graph_domain} timestamps)"
    )]
    IndexMismatch {
        index_domain: u32,
        index_vertices: u32,
        index_fingerprint: u64,
        graph_domain: u32,
        graph_vertices: u32,
        graph_fingerprint: u64,
    },

    #[error("neighborhood radius {radius} is unsupported (only 0 and 1 are defined)")]
    UnsupportedRadius { radius: u8 },

    #[error("query cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_errors_name_both_endpoints() {
        let moved = DurableError::InconsistentEdge {
            key: "e".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            found_from: "b".to_string(),
            found_to: "a".to_string(),
        };
        assert_eq!(
            moved.to_string(),
            "edge `e` connects b -> a, but was first seen as a -> b"
        );

        let parallel = DurableError::ParallelPatternEdge {
            from: "x".to_string(),
            to: "y".to_string(),
        };
        assert_eq!(
            parallel.to_string(),
            "pattern already has an edge `x` -> `y`; parallel pattern edges are unsupported"
        );
    }

    #[test]
    fn index_mismatch_shows_fingerprints() {
        let err = DurableError::IndexMismatch {
            index_domain: 1,
            index_vertices: 2,
            index_fingerprint: 0xab,
            graph_domain: 1,
            graph_vertices: 2,
            graph_fingerprint: 0xcd,
        };
        assert_eq!(
            err.to_string(),
            "candidate filter was built for graph 00000000000000ab (2 vertices over 1 timestamps), \
             but the graph is 00000000000000cd (2 vertices over 1 timestamps)"
        );
    }
}
