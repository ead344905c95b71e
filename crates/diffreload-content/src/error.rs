#![forbid(unsafe_code)]

use thiserror::Error;

use crate::canonical::EncodeError;

pub type Result<T> = std::result::Result<T, ContentError>;

/// Failure while building an [`EncodedFingerprint`](crate::EncodedFingerprint).
#[derive(Debug, Error)]
pub enum ContentError {
    /// A selected field could not be serialized (its `Serialize` impl returned an error).
    #[error("field #{index} could not be encoded: {source}")]
    Encode {
        index: usize,
        #[source]
        source: EncodeError,
    },
}

impl ContentError {
    /// Zero-based position of the offending field.
    #[must_use]
    pub fn field_index(&self) -> usize {
        match self {
            Self::Encode { index, .. } => *index,
        }
    }
}
