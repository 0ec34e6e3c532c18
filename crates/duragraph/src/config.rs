//! Query and index configuration.
//!
//! Everything here is plain serde data so it can live in a JSON config file
//! next to the graph it applies to. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::{CandidateFilter, TimeIndex};
use crate::graph::TemporalGraph;
use crate::lifespan::RunLength;

/// Knobs for a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Algorithm for the continuous duration.
    pub run_length: RunLength,
    /// Explore the first pattern vertex's candidates on the rayon pool.
    pub parallel: bool,
}

/// Index selection plus search knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DurableConfig {
    pub time_index: TimeIndex,
    pub search: SearchConfig,
}

impl DurableConfig {
    pub fn build_filter(&self, graph: &TemporalGraph) -> Result<Box<dyn CandidateFilter>> {
        self.time_index.build(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_recommended_setup() {
        let config = DurableConfig::default();
        assert_eq!(config.time_index, TimeIndex::NeighborhoodCount { radius: 1 });
        assert_eq!(config.search.run_length, RunLength::Scan);
        assert!(!config.search.parallel);
    }
}
