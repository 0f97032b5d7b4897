//! Content modalities and key classification.
//!
//! Keys follow the `"<user>/<path>.<ext>"` convention: the first path
//! segment names the owning user and the file-type suffix determines the
//! modality. Plots carry no dedicated suffix and are only reachable
//! through an explicit tag on the stored-fragment notification.

pub mod error;


pub use error::ModalityError;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A category of content with its own embedding space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Plain text fragments.
    Text,
    /// Raster images.
    Image,
    /// Chart/plot images, embedded through their transcribed data table.
    Plot,
    /// Source code fragments.
    Code,
    /// Video fragments (share the image embedding space).
    Video,
}

impl Modality {
    /// Every modality, in the canonical (response) order.
    pub const ALL: [Modality; 5] = [
        Modality::Text,
        Modality::Image,
        Modality::Plot,
        Modality::Code,
        Modality::Video,
    ];

    /// Stable uppercase tag used in partitions, notifications and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
            Modality::Plot => "PLOT",
            Modality::Code => "CODE",
            Modality::Video => "VIDEO",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modality {
    type Err = ModalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Modality::Text),
            "IMAGE" => Ok(Modality::Image),
            "PLOT" => Ok(Modality::Plot),
            "CODE" => Ok(Modality::Code),
            "VIDEO" => Ok(Modality::Video),
            _ => Err(ModalityError::UnknownTag { tag: s.to_string() }),
        }
    }
}

/// File-type suffix to modality mapping.
///
/// Extending the modality set means adding entries here AND registering a
/// capability for the new modality in the dispatch table; the registry's
/// startup check enforces the pairing.
const SUFFIX_MODALITIES: &[(&str, Modality)] = &[
    ("txt", Modality::Text),
    ("md", Modality::Text),
    ("png", Modality::Image),
    ("jpg", Modality::Image),
    ("jpeg", Modality::Image),
    ("mp4", Modality::Video),
    ("py", Modality::Code),
    ("rs", Modality::Code),
    ("js", Modality::Code),
    ("ts", Modality::Code),
    ("java", Modality::Code),
    ("go", Modality::Code),
    ("c", Modality::Code),
    ("cpp", Modality::Code),
];

/// Maps a key to its modality via the file-type suffix.
///
/// Pure function; fails with [`ModalityError::UnknownSuffix`] when the
/// suffix has no mapping entry. Callers must treat that as a
/// fragment-specific, non-retryable condition.
pub fn classify(key: &str) -> Result<Modality, ModalityError> {
    let suffix = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ModalityError::UnknownSuffix {
            key: key.to_string(),
        })?;

    let suffix = suffix.to_ascii_lowercase();
    SUFFIX_MODALITIES
        .iter()
        .find(|(s, _)| *s == suffix)
        .map(|(_, m)| *m)
        .ok_or_else(|| ModalityError::UnknownSuffix {
            key: key.to_string(),
        })
}

/// Extracts the owning user from a key's first path segment.
pub fn user_from_key(key: &str) -> Result<&str, ModalityError> {
    match key.split_once('/') {
        Some((user, rest)) if !user.is_empty() && !rest.is_empty() => Ok(user),
        _ => Err(ModalityError::MissingUserPrefix {
            key: key.to_string(),
        }),
    }
}

/// The set of modalities [`classify`] can produce, plus those reachable
/// through explicit notification tags.
///
/// Used by the dispatch registry's startup consistency check: this set
/// must be a subset of the registered capability keys.
pub fn classifiable_modalities() -> BTreeSet<Modality> {
    let mut set: BTreeSet<Modality> = SUFFIX_MODALITIES.iter().map(|(_, m)| *m).collect();
    // Reachable via explicit tag only.
    set.insert(Modality::Plot);
    set
}
