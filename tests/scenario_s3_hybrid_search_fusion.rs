//! S3 — hybrid search fusion (spec §8): three resources, only two of which
//! mention the query term, ranked under three different `hybrid_weight`
//! settings.

use std::sync::Arc;

use neo_alexandria_core::ai::{AiAdapter, MockBackend};
use neo_alexandria_core::model::Resource;
use neo_alexandria_core::search::{search, FusionMethod, SearchRequest};
use neo_alexandria_core::storage::{GraphStore, OpenStore, SqliteStore};

/// R1 and R3 both mention "quantum" in their title and body; R2 never does.
/// Embeddings are unit vectors chosen so cosine-to-query similarity is
/// R1 > R3 > R2, giving a deterministic semantic-only ordering.
fn seeded_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();

    let mut r1 = Resource::new("https://example.com/quantum-computing");
    r1.title = "Quantum Computing".into();
    r1.content_text = "Quantum computing uses quantum bits known as qubits for quantum algorithms.".into();
    r1.quality_overall = 0.9;
    r1.embedding = Some(vec![1.0, 0.0]);
    store.create_resource(&r1).unwrap();

    let mut r2 = Resource::new("https://example.com/classical-mechanics");
    r2.title = "Classical Mechanics".into();
    r2.content_text = "Classical mechanics describes the motion of macroscopic objects.".into();
    r2.quality_overall = 0.3;
    r2.embedding = Some(vec![0.0, 1.0]);
    store.create_resource(&r2).unwrap();

    let mut r3 = Resource::new("https://example.com/quantum-mechanics");
    r3.title = "Quantum Mechanics".into();
    r3.content_text = "Quantum mechanics describes the quantum behavior of particles.".into();
    r3.quality_overall = 0.7;
    r3.embedding = Some(vec![0.8, 0.6]);
    store.create_resource(&r3).unwrap();

    store
}

fn position(ids: &[neo_alexandria_core::model::ResourceId], needle: &neo_alexandria_core::model::ResourceId) -> usize {
    ids.iter().position(|id| id == needle).expect("resource present in results")
}

#[tokio::test]
async fn lexical_only_ranks_quantum_titled_resources_above_classical_mechanics() {
    let store = seeded_store();
    let ai = AiAdapter::with_backend(2, 10, Arc::new(MockBackend::unavailable()));

    let mut request = SearchRequest::new("quantum");
    request.hybrid_weight = 0.0;
    request.fusion_method = FusionMethod::WeightedLinear;
    let response = search(&store, &ai, &request).await.unwrap();

    let r1 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Quantum Computing").unwrap().id;
    let r2 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Classical Mechanics").unwrap().id;
    let r3 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Quantum Mechanics").unwrap().id;

    let ids: Vec<_> = response.hits.iter().map(|h| h.id.clone()).collect();
    assert!(position(&ids, &r1) < position(&ids, &r2));
    assert!(position(&ids, &r3) < position(&ids, &r2));
}

#[tokio::test]
async fn semantic_only_ranks_strictly_by_cosine_to_the_query_embedding() {
    let store = seeded_store();
    let backend = MockBackend::available().with_embedding("quantum", vec![1.0, 0.0]);
    let ai = AiAdapter::with_backend(2, 10, Arc::new(backend));

    let mut request = SearchRequest::new("quantum");
    request.hybrid_weight = 1.0;
    let response = search(&store, &ai, &request).await.unwrap();

    let r1 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Quantum Computing").unwrap().id;
    let r2 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Classical Mechanics").unwrap().id;
    let r3 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Quantum Mechanics").unwrap().id;

    let ids: Vec<_> = response.hits.iter().map(|h| h.id.clone()).collect();
    assert!(position(&ids, &r1) < position(&ids, &r3));
    assert!(position(&ids, &r3) < position(&ids, &r2));
}

#[tokio::test]
async fn balanced_weight_still_ranks_quantum_mechanics_above_classical_mechanics() {
    let store = seeded_store();
    let backend = MockBackend::available().with_embedding("quantum", vec![1.0, 0.0]);
    let ai = AiAdapter::with_backend(2, 10, Arc::new(backend));

    let mut request = SearchRequest::new("quantum");
    request.hybrid_weight = 0.5;
    let response = search(&store, &ai, &request).await.unwrap();

    let r2 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Classical Mechanics").unwrap().id;
    let r3 = store.all_resources().unwrap().into_iter().find(|r| r.title == "Quantum Mechanics").unwrap().id;

    let ids: Vec<_> = response.hits.iter().map(|h| h.id.clone()).collect();
    assert!(position(&ids, &r3) < position(&ids, &r2));
}
