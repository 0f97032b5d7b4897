use super::*;

fn stub_reranker() -> CrossEncoderReranker {
    CrossEncoderReranker::stub().expect("stub loads without model files")
}

fn candidates(texts: &[&str]) -> Vec<Vec<u8>> {
    texts.iter().map(|t| t.as_bytes().to_vec()).collect()
}

#[tokio::test]
async fn test_rerank_orders_by_relevance() {
    let reranker = stub_reranker();
    let cands = candidates(&[
        "completely unrelated content about weather",
        "rust async runtime internals",
        "cooking pasta at home",
    ]);

    let ranks = reranker
        .rerank("rust async runtime", &cands, 3)
        .await
        .unwrap();

    assert_eq!(ranks.len(), 3);
    assert_eq!(ranks[0], 1);
}

#[tokio::test]
async fn test_rerank_truncates_to_top_k() {
    let reranker = stub_reranker();
    let cands = candidates(&["a b", "a b c", "a", "d e f"]);

    let ranks = reranker.rerank("a b c", &cands, 2).await.unwrap();
    assert_eq!(ranks.len(), 2);
}

#[tokio::test]
async fn test_rerank_returns_valid_indices() {
    let reranker = stub_reranker();
    let cands = candidates(&["one", "two", "three"]);

    let ranks = reranker.rerank("two", &cands, 3).await.unwrap();
    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ranks.len());
    assert!(ranks.iter().all(|&i| i < cands.len()));
}

#[tokio::test]
async fn test_rerank_rejects_non_utf8_candidates() {
    let reranker = stub_reranker();
    let cands = vec![vec![0xff, 0xfe, 0x80]];

    let err = reranker.rerank("query", &cands, 1).await.unwrap_err();
    assert!(matches!(err, RerankerError::InvalidCandidate { .. }));
}

#[tokio::test]
async fn test_rerank_empty_candidates() {
    let reranker = stub_reranker();
    let ranks = reranker.rerank("query", &[], 5).await.unwrap();
    assert!(ranks.is_empty());
}

#[test]
fn test_stub_score_prefers_overlap() {
    let reranker = stub_reranker();
    let relevant = reranker.score("blue whale", "the blue whale is large").unwrap();
    let irrelevant = reranker.score("blue whale", "quarterly revenue report").unwrap();
    assert!(relevant > irrelevant);
}

#[test]
fn test_load_fails_for_missing_model_dir() {
    let config = RerankerConfig::new("/definitely/not/there");
    assert!(matches!(
        CrossEncoderReranker::load(config),
        Err(RerankerError::ModelNotFound { .. })
    ));
}

#[test]
fn test_stub_mode_has_no_model() {
    assert!(!stub_reranker().is_model_loaded());
}
