use super::*;
use crate::embedding::capability::EmbeddingCapability;

fn stub_embedder() -> GgufEmbedder {
    GgufEmbedder::load(GgufConfig::stub()).expect("stub loads without model files")
}

#[tokio::test]
async fn test_stub_embedding_is_deterministic() {
    let embedder = stub_embedder();

    let a = embedder.embed(b"hello world").await.unwrap();
    let b = embedder.embed(b"hello world").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_stub_embedding_has_configured_dim() {
    let embedder = stub_embedder();
    let v = embedder.embed(b"hello").await.unwrap();
    assert_eq!(v.len(), embedder.dim());
}

#[tokio::test]
async fn test_stub_embedding_is_unit_normalized() {
    let embedder = stub_embedder();
    let v = embedder.embed_query("some query").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_distinct_texts_embed_differently() {
    let embedder = stub_embedder();
    let a = embedder.embed(b"alpha").await.unwrap();
    let b = embedder.embed(b"beta").await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_embed_rejects_non_utf8_fragments() {
    let embedder = stub_embedder();
    let err = embedder.embed(&[0xff, 0xfe, 0x00, 0x80]).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidText { .. }));
}

#[tokio::test]
async fn test_prefixes_change_the_embedding() {
    let plain = stub_embedder();
    let prefixed = GgufEmbedder::load(
        GgufConfig::stub()
            .query_prefix("query: ")
            .document_prefix("passage: "),
    )
    .unwrap();

    let a = plain.embed_query("hello").await.unwrap();
    let b = prefixed.embed_query("hello").await.unwrap();
    assert_ne!(a, b);

    // Same fragment text with different roles embeds differently too.
    let doc = prefixed.embed(b"hello").await.unwrap();
    assert_ne!(b, doc);
}

#[tokio::test]
async fn test_custom_dimension() {
    let embedder = GgufEmbedder::load(GgufConfig::stub().embedding_dim(64)).unwrap();
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.embed(b"x").await.unwrap().len(), 64);
}

#[test]
fn test_validate_requires_model_path_without_stub() {
    let config = GgufConfig::default();
    assert!(matches!(
        config.validate(),
        Err(EmbeddingError::InvalidConfig { .. })
    ));
}

#[test]
fn test_load_fails_for_missing_model_file() {
    let config = GgufConfig::new("/definitely/not/there.gguf");
    assert!(matches!(
        GgufEmbedder::load(config),
        Err(EmbeddingError::ModelNotFound { .. })
    ));
}

#[test]
fn test_stub_flag_reported() {
    assert!(stub_embedder().is_stub());
}
