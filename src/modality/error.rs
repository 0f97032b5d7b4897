use thiserror::Error;

#[derive(Debug, Error)]
/// Errors from key classification and parsing.
pub enum ModalityError {
    /// The key's file-type suffix has no modality mapping.
    #[error("no modality mapping for key suffix: {key}")]
    UnknownSuffix {
        /// Offending key.
        key: String,
    },

    /// A modality tag string was not recognized.
    #[error("unknown modality tag: {tag}")]
    UnknownTag {
        /// Offending tag.
        tag: String,
    },

    /// The key does not start with a `<user>/` segment.
    #[error("key has no user prefix: {key}")]
    MissingUserPrefix {
        /// Offending key.
        key: String,
    },
}
