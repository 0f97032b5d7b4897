use super::*;
use crate::embedding::capability::EmbeddingCapability;

fn stub_clip() -> ClipEmbedder {
    ClipEmbedder::load(ClipEmbedderConfig::stub()).expect("stub loads without model files")
}

#[tokio::test]
async fn test_stub_image_embedding_is_deterministic() {
    let clip = stub_clip();
    let bytes = [0x89u8, 0x50, 0x4e, 0x47, 1, 2, 3, 4];

    let a = clip.embed(&bytes).await.unwrap();
    let b = clip.embed(&bytes).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), clip.dim());
}

#[tokio::test]
async fn test_stub_rejects_empty_image() {
    let clip = stub_clip();
    let err = clip.embed(&[]).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidImage { .. }));
}

#[tokio::test]
async fn test_text_and_image_share_a_dimension() {
    let clip = stub_clip();
    let image = clip.embed(&[1, 2, 3]).await.unwrap();
    let text = clip.embed_query("a photo of a cat").await.unwrap();
    assert_eq!(image.len(), text.len());
}

#[tokio::test]
async fn test_query_embedding_is_unit_normalized() {
    let clip = stub_clip();
    let v = clip.embed_query("sunset over water").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[test]
fn test_load_fails_for_missing_model_dir() {
    let config = ClipEmbedderConfig::new("/definitely/not/there");
    assert!(matches!(
        ClipEmbedder::load(config),
        Err(EmbeddingError::ModelNotFound { .. })
    ));
}

#[test]
fn test_preprocess_rejects_garbage_bytes() {
    let err =
        ClipEmbedder::preprocess_image(&[0, 1, 2, 3], &candle_core::Device::Cpu).unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidImage { .. }));
}
