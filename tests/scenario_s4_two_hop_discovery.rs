//! S4 — two-hop discovery (spec §8): A cites B, B shares subjects with C at
//! Jaccard 0.5. Querying 2-hop neighbors of A must surface C through the
//! bridge B.
//!
//! The spec's illustrative arithmetic (`path_strength = 1.0 · 0.5 = 0.5`)
//! assumes a layer weight of 1.0 for every edge type. The implemented
//! `fuse_weights`/`layer_weight_for` formula instead applies the configured
//! per-layer α_t (0.1 for citation, 0.3 for subject_similarity by default),
//! so this test derives the expected value from those functions directly
//! rather than hardcoding the spec's simplified number.

use neo_alexandria_core::config::Config;
use neo_alexandria_core::graph::{fuse_weights, layer_weight_for, neighbors, GraphSnapshot, NeighborQuery};
use neo_alexandria_core::model::{Citation, EdgeType, GraphEdge, Resource};
use neo_alexandria_core::storage::{GraphStore, OpenStore, SqliteStore};

#[test]
fn two_hop_neighbor_surfaces_bridged_resource_with_positive_path_strength() {
    let store = SqliteStore::open_in_memory().unwrap();

    let mut a = Resource::new("https://example.com/a");
    a.subjects.insert("Unrelated".into());
    let mut b = Resource::new("https://example.com/b");
    b.subjects.insert("Physics".into());
    let mut c = Resource::new("https://example.com/c");
    c.subjects.insert("Physics".into());
    c.subjects.insert("Chemistry".into());

    store.create_resource(&a).unwrap();
    store.create_resource(&b).unwrap();
    store.create_resource(&c).unwrap();

    let mut citation = Citation::new(a.id.clone(), "https://example.com/b", 0);
    citation.target_resource_id = Some(b.id.clone());
    store.create_citation(&citation).unwrap();

    let config = Config::default();
    let snap = GraphSnapshot::load(&store).unwrap();
    let query = NeighborQuery { hops: 2, ..Default::default() };
    let result = neighbors(&snap, &config, &a.id, &query);

    let via_c = result
        .iter()
        .find(|n| n.resource_id == c.id)
        .expect("C reachable as a 2-hop neighbor of A via B");

    assert_eq!(via_c.hops, 2);
    assert_eq!(via_c.bridge, Some(b.id.clone()));
    // edge_types covers both hops of the path: A->B (citation) and B->C
    // (subject_similarity).
    assert!(via_c.edge_types.contains(&EdgeType::Citation));
    assert!(via_c.edge_types.contains(&EdgeType::SubjectSimilarity));
    assert!(via_c.path_strength > 0.0);

    let citation_edge = GraphEdge::new(a.id.clone(), b.id.clone(), EdgeType::Citation, 1.0);
    let subject_edge = GraphEdge::new(b.id.clone(), c.id.clone(), EdgeType::SubjectSimilarity, 0.5);
    let bridge_fused = fuse_weights(std::slice::from_ref(&citation_edge), |t| layer_weight_for(&config, t));
    let far_fused = fuse_weights(std::slice::from_ref(&subject_edge), |t| layer_weight_for(&config, t));
    let expected_path_strength = bridge_fused * far_fused;

    assert!((via_c.path_strength - expected_path_strength).abs() < 1e-6);

    // A and C never connect directly: C only appears via the A->B->C bridge.
    assert!(result.iter().all(|n| n.resource_id != c.id || n.hops == 2));
}
