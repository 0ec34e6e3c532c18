//! Integration tests for the complete duragraph pipeline
//!
//! These tests run end to end:
//! - Snapshots → TemporalGraph → TimeIndex → DurablePatternSearch
//! - Indexed search vs the snapshot-by-snapshot baseline
//! - JSON configuration and JSON result export
//!
//! Run with: cargo test --test integration_tests

use duragraph::{
    BaselineSearch, DurabilityMode, DurableConfig, DurablePatternSearch, IntervalSet, Pattern,
    SearchConfig, Snapshot, TemporalGraph, TimeIndex,
};

// ============================================================================
// Fixture: a six-snapshot history
// ============================================================================

/// Add the four-vertex motif `1 -> 2 -> 3 -> 1`, `4 -> 1` labeled A, B, C, X.
fn add_motif(s: &mut Snapshot) {
    for (v, label) in [("1", "A"), ("2", "B"), ("3", "C"), ("4", "X")] {
        s.add_labeled_vertex(v, &[label]);
    }
    for (a, b) in [("1", "2"), ("2", "3"), ("3", "1"), ("4", "1")] {
        s.add_edge(a, b).expect("motif vertices exist");
    }
}

/// Two bystanders that come and go; the motif is present at 1, 2, 3 and 5.
fn history() -> TemporalGraph {
    let mut g0 = Snapshot::new();
    g0.add_vertex("666");
    g0.add_labeled_vertex("42", &["ABC", "X"]);

    let mut g1 = Snapshot::new();
    g1.add_labeled_vertex("666", &["ABC"]);
    g1.add_labeled_vertex("42", &["ABC"]);
    g1.add_edge("666", "42").expect("bystanders exist");
    add_motif(&mut g1);

    let g2 = g1.clone();

    let mut g3 = Snapshot::new();
    add_motif(&mut g3);

    let mut g4 = Snapshot::new();
    g4.add_labeled_vertex("666", &["ABC"]);
    g4.add_labeled_vertex("42", &["ABC"]);
    g4.add_edge("666", "42").expect("bystanders exist");

    let mut g5 = Snapshot::new();
    g5.add_labeled_vertex("666", &["X"]);
    g5.add_labeled_vertex("42", &["ABC"]);
    add_motif(&mut g5);

    TemporalGraph::from_snapshots(&[g0, g1, g2, g3, g4, g5]).expect("non-empty history")
}

fn motif_pattern() -> Pattern {
    let mut p = Pattern::new();
    let a = p.add_labeled_vertex("a", &["A"]).expect("fresh name");
    let b = p.add_labeled_vertex("b", &["B"]).expect("fresh name");
    let c = p.add_labeled_vertex("c", &["C"]).expect("fresh name");
    let x = p.add_labeled_vertex("x", &["X"]).expect("fresh name");
    for (s, t) in [(a, b), (b, c), (c, a), (x, a)] {
        p.add_edge(s, t).expect("no parallel edges");
    }
    p
}

// ============================================================================
// Durable queries
// ============================================================================

#[test]
fn test_history_graph_shape() {
    let g = history();
    assert_eq!(g.domain_size(), 6);
    assert_eq!(g.vertex_count(), 6);
    assert_eq!(g.edge_count(), 5);

    let motif = g.vertex_id("1").unwrap();
    let span = g.vertex_lifespan(motif).unwrap();
    assert_eq!(span.to_intervals().to_string(), "{[1, 3], [5, 5]}");
}

#[test]
fn test_collective_and_continuous_motif() {
    let g = history();
    let filter = TimeIndex::default().build(&g).unwrap();
    let search = DurablePatternSearch::new(&g, filter.as_ref());
    let p = motif_pattern();
    let window = IntervalSet::closed(1, 5).unwrap();

    let collective = search.maximal_collective(&p, &window).unwrap();
    assert_eq!(collective.len(), 1);
    assert_eq!(collective[0].duration, 4);
    assert_eq!(collective[0].intervals.to_string(), "{[1, 3], [5, 5]}");
    assert_eq!(
        collective[0].vertex_names().collect::<Vec<_>>(),
        vec!["1", "2", "3", "4"]
    );

    let continuous = search.maximal_continuous(&p, &window).unwrap();
    assert_eq!(continuous.len(), 1);
    assert_eq!(continuous[0].duration, 3);
    assert_eq!(continuous[0].intervals.to_string(), "{[1, 3]}");
}

#[test]
fn test_bystander_edge_is_most_durable_two_vertex_match() {
    let g = history();
    let filter = TimeIndex::default().build(&g).unwrap();
    let search = DurablePatternSearch::new(&g, filter.as_ref());

    let mut p = Pattern::new();
    let s = p.add_labeled_vertex("s", &["ABC"]).unwrap();
    let t = p.add_labeled_vertex("t", &["ABC"]).unwrap();
    p.add_edge(s, t).unwrap();

    let out = search
        .query_full_span(&p, DurabilityMode::Collective)
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].vertex_names().collect::<Vec<_>>(), vec!["666", "42"]);
    assert_eq!(out[0].intervals.to_string(), "{[1, 2], [4, 4]}");
}

#[test]
fn test_indexed_search_agrees_with_baseline() {
    let g = history();
    let p = motif_pattern();
    let baseline = BaselineSearch::new(&g);

    for index in [
        TimeIndex::Trivial,
        TimeIndex::LabelPresence,
        TimeIndex::NeighborhoodCount { radius: 0 },
        TimeIndex::NeighborhoodCount { radius: 1 },
    ] {
        let filter = index.build(&g).unwrap();
        for parallel in [false, true] {
            let search = DurablePatternSearch::new(&g, filter.as_ref()).with_config(SearchConfig {
                parallel,
                ..SearchConfig::default()
            });
            for start in 0..6 {
                for end in start..6 {
                    let window = IntervalSet::closed(start, end).unwrap();
                    for mode in [DurabilityMode::Collective, DurabilityMode::Continuous] {
                        assert_eq!(
                            search.query(&p, &window, mode).unwrap(),
                            baseline.query(&p, &window, mode).unwrap(),
                            "{index:?} parallel={parallel} [{start}, {end}] {mode:?}"
                        );
                    }
                }
            }
        }
    }
}

// ============================================================================
// Configuration and export
// ============================================================================

#[test]
fn test_json_config_to_json_report() -> anyhow::Result<()> {
    let config: DurableConfig = serde_json::from_str(
        r#"{
            "time_index": { "kind": "neighborhood_count", "radius": 1 },
            "search": { "run_length": "hop", "parallel": true }
        }"#,
    )?;

    let g = history();
    let filter = config.build_filter(&g)?;
    let out = DurablePatternSearch::new(&g, filter.as_ref())
        .with_config(config.search)
        .query_full_span(&motif_pattern(), DurabilityMode::Continuous)?;

    let report = serde_json::to_value(&out)?;
    assert_eq!(report.as_array().map(Vec::len), Some(1));
    assert_eq!(report[0]["duration"], 3);
    assert_eq!(report[0]["intervals"]["intervals"][0]["start"], 1);
    assert_eq!(report[0]["intervals"]["intervals"][0]["end"], 3);
    Ok(())
}
