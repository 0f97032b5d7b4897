use std::path::PathBuf;

/// Cross-encoders have a fixed maximum sequence length.
pub const MAX_SEQ_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct RerankerConfig {
    /// Model directory (BERT safetensors + tokenizer). `None` means stub mode.
    pub model_path: Option<PathBuf>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self { model_path: None }
    }
}

impl RerankerConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
        }
    }

    pub fn stub() -> Self {
        Self { model_path: None }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
