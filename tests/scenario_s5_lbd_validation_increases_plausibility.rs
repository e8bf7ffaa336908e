//! S5 — LBD open discovery with validation (spec §8): validating a
//! hypothesis as correct must strictly raise the plausibility of its
//! conclusion on a subsequent discovery run.
//!
//! The path starts with a reduced edge-weight override on A-B (as if an
//! earlier round of curator feedback had already discounted it) so the
//! `valid=true` nudge in this test has headroom to increase it — starting
//! from the unoverridden weight would already sit at the formula's natural
//! value and the ×1.10 bump would immediately clamp at 1.0, leaving
//! plausibility unchanged rather than strictly higher.

use neo_alexandria_core::config::Config;
use neo_alexandria_core::graph::{apply_validation_feedback, open_discovery, GraphSnapshot};
use neo_alexandria_core::model::Resource;
use neo_alexandria_core::storage::{GraphStore, OpenStore, SqliteStore};

#[test]
fn validating_a_hypothesis_as_correct_strictly_raises_its_plausibility() {
    let store = SqliteStore::open_in_memory().unwrap();

    let mut a = Resource::new("https://example.com/a");
    a.subjects.insert("Graphs".into());
    let mut b = Resource::new("https://example.com/b");
    b.subjects.insert("Graphs".into());
    b.subjects.insert("Networks".into());
    let mut c = Resource::new("https://example.com/c");
    c.subjects.insert("Networks".into());
    store.create_resource(&a).unwrap();
    store.create_resource(&b).unwrap();
    store.create_resource(&c).unwrap();

    store.set_edge_weight_override(&a.id, &b.id, "subject_similarity", 0.5).unwrap();

    let config = Config::default();

    let snap_before = GraphSnapshot::load(&store).unwrap();
    let hyps_before = open_discovery(&snap_before, &config, &a.id, 0.0, 10);
    let hypothesis = hyps_before
        .into_iter()
        .find(|h| h.c_resource_id == c.id)
        .expect("C reachable as an open-discovery candidate from A via B");
    let plausibility_before = hypothesis.plausibility_score;
    assert!(plausibility_before > 0.0);

    apply_validation_feedback(&store, &snap_before, &config, &hypothesis, true).unwrap();

    let snap_after = GraphSnapshot::load(&store).unwrap();
    let hyps_after = open_discovery(&snap_after, &config, &a.id, 0.0, 10);
    let plausibility_after = hyps_after
        .into_iter()
        .find(|h| h.c_resource_id == c.id)
        .expect("C still reachable after validation")
        .plausibility_score;

    assert!(plausibility_after > plausibility_before);
}
