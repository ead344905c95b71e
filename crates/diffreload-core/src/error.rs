#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApplyError>;

/// Structural misuse of an [`Arrangement`](crate::Arrangement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrangementError {
    #[error("section identifier already present in the arrangement")]
    DuplicateSection,

    #[error("item identifier already present in the arrangement")]
    DuplicateItem,

    #[error("section identifier not found in the arrangement")]
    UnknownSection,

    #[error("item identifier not found in the arrangement")]
    UnknownItem,

    #[error("arrangement has no sections to append items to")]
    NoSections,

    #[error("an item or section cannot be moved relative to itself")]
    SelfAnchor,
}

/// Rejected call to [`ReloadingDataSource::apply_with_reload`](crate::ReloadingDataSource::apply_with_reload).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The caller pre-populated reload marks; reloads are derived from content.
    #[error(
        "arrangement carries {count} reload mark(s); apply_with_reload derives reloads from content changes"
    )]
    ReloadMarksInArrangement { count: usize },

    #[error(transparent)]
    Arrangement(#[from] ArrangementError),
}

/// Incomplete [`ReloadingDataSourceBuilder`](crate::ReloadingDataSourceBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("a content provider is required to detect changed rows")]
    MissingContentProvider,

    #[error("a row provider is required to bind rows")]
    MissingRowProvider,
}
