//! End-to-end pipeline tests over mock backends and stub models.

use std::sync::Arc;
use std::time::Duration;

use prism::config::Config;
use prism::embedding::{CapabilityRegistry, EmbeddingCapability};
use prism::index::{MockVectorIndex, partition_of};
use prism::ingest::{FragmentStored, IngestOutcome, Ingestor};
use prism::modality::Modality;
use prism::retrieval::Retriever;
use prism::storage::MockObjectStore;

struct Pipeline {
    index: Arc<MockVectorIndex>,
    store: MockObjectStore,
    registry: Arc<CapabilityRegistry>,
    ingestor: Ingestor<MockVectorIndex>,
    retriever: Retriever<MockVectorIndex>,
}

impl Pipeline {
    fn new() -> Self {
        let config = Config::default();
        let index = Arc::new(MockVectorIndex::new());
        let store = MockObjectStore::new();
        let registry = Arc::new(CapabilityRegistry::stubbed());
        registry
            .verify_classifier_coverage()
            .expect("stub registry covers the classifier range");

        let ingestor = Ingestor::new(
            Arc::clone(&index),
            Arc::new(store.clone()),
            Arc::clone(&registry),
        );
        let retriever = Retriever::new(
            Arc::clone(&index),
            Arc::new(store.clone()),
            Arc::clone(&registry),
            config.overfetch_multiplier,
            Duration::from_millis(config.rerank_timeout_ms),
        );

        Self {
            index,
            store,
            registry,
            ingestor,
            retriever,
        }
    }

    async fn ingest(&self, key: &str, body: &[u8]) {
        self.store.insert(key, body);
        let outcome = self
            .ingestor
            .process(FragmentStored {
                key: key.to_string(),
                modality: None,
            })
            .await
            .expect("ingestion should not hit a retryable failure");
        assert!(
            matches!(outcome, IngestOutcome::Indexed(_)),
            "expected {key} to be indexed"
        );
    }
}

#[tokio::test]
async fn test_ingest_then_query_round_trip() {
    let pipeline = Pipeline::new();
    pipeline.ingest("alice/notes.txt", b"hello world").await;

    // The vector landed in alice's TEXT partition with the text dimension.
    let partition = partition_of("alice", Modality::Text).unwrap();
    assert_eq!(pipeline.index.point_count(&partition), Some(1));

    let text_dim = pipeline
        .registry
        .embedder_for(Modality::Text)
        .unwrap()
        .dim();
    assert_eq!(pipeline.index.partition_dim(&partition), Some(text_dim));

    let results = pipeline
        .retriever
        .query("alice", "hello", 1, &[])
        .await
        .unwrap();

    assert_eq!(results[&Modality::Text], vec!["alice/notes.txt".to_string()]);
}

#[tokio::test]
async fn test_query_for_empty_user_returns_empty_everywhere() {
    let pipeline = Pipeline::new();

    let results = pipeline
        .retriever
        .query("nobody", "anything at all", 3, &[])
        .await
        .unwrap();

    assert_eq!(results.len(), Modality::ALL.len());
    for (modality, keys) in &results {
        assert!(keys.is_empty(), "{modality} should have no results");
    }
}

#[tokio::test]
async fn test_fragments_are_grouped_by_modality() {
    let pipeline = Pipeline::new();
    pipeline.ingest("alice/notes.txt", b"meeting notes").await;
    pipeline.ingest("alice/photo.png", &[1, 2, 3, 4]).await;
    pipeline.ingest("alice/lib.rs", b"fn main() {}").await;
    pipeline.ingest("alice/talk.mp4", &[9, 9, 9]).await;

    let results = pipeline
        .retriever
        .query("alice", "notes", 5, &[])
        .await
        .unwrap();

    assert_eq!(results[&Modality::Text], vec!["alice/notes.txt".to_string()]);
    assert_eq!(results[&Modality::Image], vec!["alice/photo.png".to_string()]);
    assert_eq!(results[&Modality::Code], vec!["alice/lib.rs".to_string()]);
    assert_eq!(results[&Modality::Video], vec!["alice/talk.mp4".to_string()]);
    assert!(results[&Modality::Plot].is_empty());
}

#[tokio::test]
async fn test_users_are_fully_isolated() {
    let pipeline = Pipeline::new();
    pipeline.ingest("alice/secret.txt", b"alice private data").await;
    pipeline.ingest("bob/notes.txt", b"bob data").await;

    let results = pipeline
        .retriever
        .query("bob", "data", 10, &[])
        .await
        .unwrap();

    for keys in results.values() {
        for key in keys {
            assert!(
                key.starts_with("bob/"),
                "bob's query leaked foreign key {key}"
            );
        }
    }
}

#[tokio::test]
async fn test_redelivered_notification_converges() {
    let pipeline = Pipeline::new();
    pipeline.ingest("alice/notes.txt", b"hello world").await;
    // Simulated at-least-once redelivery of the same notification.
    pipeline.ingest("alice/notes.txt", b"hello world").await;

    let partition = partition_of("alice", Modality::Text).unwrap();
    assert_eq!(pipeline.index.point_count(&partition), Some(1));

    let results = pipeline
        .retriever
        .query("alice", "hello", 5, &[])
        .await
        .unwrap();
    assert_eq!(results[&Modality::Text].len(), 1);
}

#[tokio::test]
async fn test_budget_bounds_every_modality_list() {
    let pipeline = Pipeline::new();
    for i in 0..8 {
        pipeline
            .ingest(&format!("alice/doc{i}.txt"), format!("document {i}").as_bytes())
            .await;
    }

    let results = pipeline
        .retriever
        .query("alice", "document", 3, &[])
        .await
        .unwrap();

    assert_eq!(results[&Modality::Text].len(), 3);
    for keys in results.values() {
        assert!(keys.len() <= 3);
    }
}

#[tokio::test]
async fn test_unsupported_fragment_does_not_poison_the_pipeline() {
    let pipeline = Pipeline::new();

    pipeline.store.insert("alice/archive.zip", &[0, 1, 2]);
    let outcome = pipeline
        .ingestor
        .process(FragmentStored {
            key: "alice/archive.zip".to_string(),
            modality: None,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));

    pipeline.ingest("alice/notes.txt", b"still works").await;
    let results = pipeline
        .retriever
        .query("alice", "works", 1, &[])
        .await
        .unwrap();
    assert_eq!(results[&Modality::Text], vec!["alice/notes.txt".to_string()]);
}
