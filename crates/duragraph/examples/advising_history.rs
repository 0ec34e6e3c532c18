//! Which professor/student advising relation lasted longest?
//!
//! Run with: RUST_LOG=duragraph=debug cargo run -p duragraph --example advising_history

use anyhow::Result;
use duragraph::{DurabilityMode, DurablePatternSearch, Pattern, Snapshot, TemporalGraph, TimeIndex};
use tracing_subscriber::EnvFilter;

/// One snapshot per year: (professor, student) advising pairs.
const YEARS: &[&[(&str, &str)]] = &[
    &[("ada", "bob"), ("ada", "cy")],
    &[("ada", "bob"), ("eve", "cy")],
    &[("ada", "bob"), ("eve", "cy"), ("eve", "dan")],
    &[("eve", "cy"), ("eve", "dan")],
    &[("ada", "bob"), ("eve", "cy")],
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let snapshots = YEARS
        .iter()
        .map(|pairs| {
            let mut s = Snapshot::new();
            for &(prof, student) in pairs.iter() {
                s.add_labeled_vertex(prof, &["PROFESSOR"]);
                s.add_labeled_vertex(student, &["STUDENT"]);
                s.add_edge(prof, student)?;
            }
            Ok(s)
        })
        .collect::<Result<Vec<_>>>()?;
    let graph = TemporalGraph::from_snapshots(&snapshots)?;
    let filter = TimeIndex::default().build(&graph)?;
    let search = DurablePatternSearch::new(&graph, filter.as_ref());

    let mut pattern = Pattern::new();
    let prof = pattern.add_labeled_vertex("professor", &["PROFESSOR"])?;
    let student = pattern.add_labeled_vertex("student", &["STUDENT"])?;
    pattern.add_edge(prof, student)?;

    for mode in [DurabilityMode::Collective, DurabilityMode::Continuous] {
        println!("{mode:?}");
        for m in search.query_full_span(&pattern, mode)? {
            let names: Vec<_> = m.vertex_names().collect();
            println!("  {} over {} ({} years)", names.join(" -> "), m.intervals, m.duration);
        }
    }
    Ok(())
}
