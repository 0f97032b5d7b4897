//! Plot embedding via transcription into the text space.
//!
//! A plot fragment is transcribed into its underlying data table, then
//! embedded with the same text embedder that serves the TEXT modality.
//! The text embedder is handed in as a shared `Arc`: one instance serves
//! both modalities, there is no second copy of the model.

pub mod transcriber;


pub use transcriber::{HttpPlotTranscriber, PlotTranscriber, StubPlotTranscriber};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::capability::EmbeddingCapability;
use crate::embedding::error::EmbeddingError;
use crate::embedding::gguf::GgufEmbedder;

/// Composite capability for the PLOT modality.
pub struct PlotEmbedder {
    transcriber: Arc<dyn PlotTranscriber>,
    text: Arc<GgufEmbedder>,
}

impl PlotEmbedder {
    /// Creates a plot embedder over a transcriber and the shared text model.
    pub fn new(transcriber: Arc<dyn PlotTranscriber>, text: Arc<GgufEmbedder>) -> Self {
        Self { transcriber, text }
    }
}

impl std::fmt::Debug for PlotEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotEmbedder")
            .field("text", &self.text)
            .finish()
    }
}

#[async_trait]
impl EmbeddingCapability for PlotEmbedder {
    async fn embed(&self, data: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        let table = self.transcriber.transcribe(data).await?;
        debug!(table_len = table.len(), "Transcribed plot to data table");
        self.text.embed(table.as_bytes()).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.text.embed_query(text).await
    }

    fn dim(&self) -> usize {
        self.text.dim()
    }
}
