use super::client::VectorIndex;
use super::mock::{MockVectorIndex, cosine_similarity};
use super::partition::{PARTITION_SEPARATOR, partition_of};
use super::error::IndexError;
use crate::modality::Modality;

fn unit_vector(seed: u64, dim: usize) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut v: Vec<f32> = (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut v {
        *x /= norm;
    }
    v
}

#[test]
fn test_partition_injectivity() {
    // Pairwise distinctness over a grid of users and all modalities,
    // including users chosen to stress the separator.
    let users = [
        "alice", "bob", "a", "ab", "a_b", "a_", "_a", "user-1", "user.1", "ALICE",
    ];

    let mut seen = std::collections::HashMap::new();
    for user in users {
        for modality in Modality::ALL {
            let partition = partition_of(user, modality).expect("valid user");
            if let Some(prev) = seen.insert(partition.as_str().to_string(), (user, modality)) {
                panic!(
                    "partition collision: ({user}, {modality}) and ({}, {})",
                    prev.0, prev.1
                );
            }
        }
    }
}

#[test]
fn test_partition_is_deterministic() {
    let a = partition_of("alice", Modality::Text).unwrap();
    let b = partition_of("alice", Modality::Text).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "alice__TEXT");
}

#[test]
fn test_partition_rejects_invalid_users() {
    assert!(matches!(
        partition_of("", Modality::Text),
        Err(IndexError::InvalidUser { .. })
    ));
    assert!(matches!(
        partition_of(&format!("al{PARTITION_SEPARATOR}ice"), Modality::Text),
        Err(IndexError::InvalidUser { .. })
    ));
    assert!(matches!(
        partition_of("al/ice", Modality::Text),
        Err(IndexError::InvalidUser { .. })
    ));
}

#[tokio::test]
async fn test_upsert_creates_partition_lazily() {
    let index = MockVectorIndex::new();
    let partition = partition_of("alice", Modality::Text).unwrap();

    assert_eq!(index.point_count(&partition), None);

    index
        .upsert(&partition, "alice/notes.txt", unit_vector(1, 8))
        .await
        .unwrap();

    assert_eq!(index.point_count(&partition), Some(1));
    assert_eq!(index.partition_dim(&partition), Some(8));
}

#[tokio::test]
async fn test_upsert_same_key_is_idempotent() {
    let index = MockVectorIndex::new();
    let partition = partition_of("alice", Modality::Text).unwrap();

    let vector = unit_vector(1, 8);
    index
        .upsert(&partition, "alice/notes.txt", vector.clone())
        .await
        .unwrap();
    index
        .upsert(&partition, "alice/notes.txt", vector.clone())
        .await
        .unwrap();

    assert_eq!(index.point_count(&partition), Some(1));

    let once = index.search(&partition, vector, 10).await.unwrap();
    assert_eq!(once, vec!["alice/notes.txt".to_string()]);
}

#[tokio::test]
async fn test_upsert_rejects_dimension_mismatch() {
    let index = MockVectorIndex::new();
    let partition = partition_of("alice", Modality::Text).unwrap();

    index
        .upsert(&partition, "alice/a.txt", unit_vector(1, 8))
        .await
        .unwrap();

    let err = index
        .upsert(&partition, "alice/b.txt", unit_vector(2, 16))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IndexError::DimensionMismatch {
            expected: 8,
            actual: 16,
            ..
        }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_search_missing_partition_returns_empty() {
    let index = MockVectorIndex::new();
    let partition = partition_of("nobody", Modality::Image).unwrap();

    let results = index.search(&partition, unit_vector(1, 8), 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_orders_by_similarity_and_truncates() {
    let index = MockVectorIndex::new();
    let partition = partition_of("alice", Modality::Text).unwrap();

    let query = unit_vector(42, 8);
    // Close: the query vector itself. Far: unrelated random vectors.
    index
        .upsert(&partition, "alice/close.txt", query.clone())
        .await
        .unwrap();
    index
        .upsert(&partition, "alice/far1.txt", unit_vector(7, 8))
        .await
        .unwrap();
    index
        .upsert(&partition, "alice/far2.txt", unit_vector(9, 8))
        .await
        .unwrap();

    let results = index.search(&partition, query.clone(), 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], "alice/close.txt");

    let all = index.search(&partition, query, 10).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_partitions_are_isolated() {
    let index = MockVectorIndex::new();
    let alice_text = partition_of("alice", Modality::Text).unwrap();
    let bob_text = partition_of("bob", Modality::Text).unwrap();
    let alice_image = partition_of("alice", Modality::Image).unwrap();

    let vector = unit_vector(3, 8);
    index
        .upsert(&alice_text, "alice/notes.txt", vector.clone())
        .await
        .unwrap();

    assert!(index.search(&bob_text, vector.clone(), 5).await.unwrap().is_empty());
    assert!(
        index
            .search(&alice_image, vector, 5)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_unavailable_index_errors_are_retryable() {
    let index = MockVectorIndex::new();
    let partition = partition_of("alice", Modality::Text).unwrap();
    index.set_unavailable(true);

    let err = index
        .upsert(&partition, "alice/notes.txt", unit_vector(1, 8))
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let err = index
        .search(&partition, unit_vector(1, 8), 5)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(!index.is_ready().await);
}

#[test]
fn test_cosine_similarity() {
    let a = vec![1.0, 0.0];
    let b = vec![1.0, 0.0];
    let c = vec![0.0, 1.0];

    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&a, &c).abs() < 1e-6);
    assert_eq!(cosine_similarity(&a, &[1.0, 0.0, 0.0]), 0.0);
}
