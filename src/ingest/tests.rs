use std::sync::Arc;

use super::*;
use crate::embedding::CapabilityRegistry;
use crate::index::mock::MockVectorIndex;
use crate::storage::MockObjectStore;

fn ingestor() -> (Ingestor<MockVectorIndex>, Arc<MockVectorIndex>, MockObjectStore) {
    let index = Arc::new(MockVectorIndex::new());
    let store = MockObjectStore::new();
    let registry = Arc::new(CapabilityRegistry::stubbed());

    (
        Ingestor::new(Arc::clone(&index), Arc::new(store.clone()), registry),
        index,
        store,
    )
}

fn note(key: &str) -> FragmentStored {
    FragmentStored {
        key: key.to_string(),
        modality: None,
    }
}

#[tokio::test]
async fn test_ingest_text_fragment() {
    let (ingestor, index, store) = ingestor();
    store.insert("alice/notes.txt", b"hello world");

    let receipt = ingestor.ingest(&note("alice/notes.txt")).await.unwrap();

    assert_eq!(receipt.modality, Modality::Text);
    assert_eq!(receipt.partition.as_str(), "alice__TEXT");
    assert_eq!(index.point_count(&receipt.partition), Some(1));
}

#[tokio::test]
async fn test_ingest_respects_explicit_modality_tag() {
    let (ingestor, index, store) = ingestor();
    store.insert("alice/chart.png", b"plot-bytes");

    let receipt = ingestor
        .ingest(&FragmentStored {
            key: "alice/chart.png".to_string(),
            modality: Some(Modality::Plot),
        })
        .await
        .unwrap();

    assert_eq!(receipt.modality, Modality::Plot);
    assert_eq!(receipt.partition.as_str(), "alice__PLOT");
    assert_eq!(index.point_count(&receipt.partition), Some(1));
}

#[tokio::test]
async fn test_ingest_is_idempotent_under_redelivery() {
    let (ingestor, index, store) = ingestor();
    store.insert("alice/notes.txt", b"hello world");

    let first = ingestor.ingest(&note("alice/notes.txt")).await.unwrap();
    let second = ingestor.ingest(&note("alice/notes.txt")).await.unwrap();

    assert_eq!(first.partition, second.partition);
    assert_eq!(index.point_count(&first.partition), Some(1));
}

#[tokio::test]
async fn test_unknown_suffix_is_dropped() {
    let (ingestor, _, store) = ingestor();
    store.insert("alice/archive.zip", b"bytes");

    let outcome = ingestor.process(note("alice/archive.zip")).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
}

#[tokio::test]
async fn test_missing_fragment_is_dropped() {
    let (ingestor, _, _) = ingestor();

    let outcome = ingestor.process(note("alice/ghost.txt")).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
}

#[tokio::test]
async fn test_key_without_user_prefix_is_dropped() {
    let (ingestor, _, store) = ingestor();
    store.insert("orphan.txt", b"bytes");

    let outcome = ingestor.process(note("orphan.txt")).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
}

#[tokio::test]
async fn test_non_utf8_text_fragment_is_dropped() {
    let (ingestor, _, store) = ingestor();
    store.insert("alice/broken.txt", &[0xff, 0xfe, 0x80]);

    let outcome = ingestor.process(note("alice/broken.txt")).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
}

#[tokio::test]
async fn test_unavailable_index_propagates_for_redelivery() {
    let (ingestor, index, store) = ingestor();
    store.insert("alice/notes.txt", b"hello world");
    index.set_unavailable(true);

    let err = ingestor.process(note("alice/notes.txt")).await.unwrap_err();
    assert!(err.is_retryable());

    // After the index recovers, the same notification succeeds.
    index.set_unavailable(false);
    let outcome = ingestor.process(note("alice/notes.txt")).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Indexed(_)));
}

#[tokio::test]
async fn test_drop_does_not_block_later_notifications() {
    let (ingestor, index, store) = ingestor();
    store.insert("alice/good.txt", b"fine");

    let bad = ingestor.process(note("alice/bad.zip")).await.unwrap();
    assert!(matches!(bad, IngestOutcome::Dropped { .. }));

    let good = ingestor.process(note("alice/good.txt")).await.unwrap();
    let IngestOutcome::Indexed(receipt) = good else {
        panic!("expected indexed outcome");
    };
    assert_eq!(index.point_count(&receipt.partition), Some(1));
}

#[tokio::test]
async fn test_video_fragment_lands_in_video_partition() {
    let (ingestor, index, store) = ingestor();
    store.insert("bob/talk.mp4", &[0, 1, 2, 3]);

    let receipt = ingestor.ingest(&note("bob/talk.mp4")).await.unwrap();
    assert_eq!(receipt.modality, Modality::Video);
    assert_eq!(receipt.partition.as_str(), "bob__VIDEO");
    assert_eq!(index.point_count(&receipt.partition), Some(1));
}

#[test]
fn test_notification_deserializes_with_and_without_tag() {
    let bare: FragmentStored = serde_json::from_str(r#"{"key":"alice/a.txt"}"#).unwrap();
    assert!(bare.modality.is_none());

    let tagged: FragmentStored =
        serde_json::from_str(r#"{"key":"alice/a.png","modality":"PLOT"}"#).unwrap();
    assert_eq!(tagged.modality, Some(Modality::Plot));
}
