use async_trait::async_trait;

use super::error::EmbeddingError;

/// One modality's embedding model.
///
/// A capability owns exactly one vector space: fragments stored in a
/// partition and the text queries against that partition must both embed
/// through the same capability, or similarity scores are meaningless.
/// Instances are constructed once (see
/// [`CapabilityRegistry`](super::registry::CapabilityRegistry)), are
/// read-only afterwards, and are shared across concurrent requests.
#[async_trait]
pub trait EmbeddingCapability: Send + Sync {
    /// Embeds one stored fragment body.
    async fn embed(&self, data: &[u8]) -> Result<Vec<f32>, EmbeddingError>;

    /// Projects a text query into this capability's vector space.
    ///
    /// For cross-modal spaces (CLIP) this runs the text tower; for
    /// text-proxy spaces (code, plot) it embeds the query as text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Fixed output dimension, stable for the capability's lifetime.
    fn dim(&self) -> usize;
}
