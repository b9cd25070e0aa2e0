use subchannel_schema::SubdirError;

use crate::encode::EncodeError;
use crate::graph::Unresolved;
use crate::index::IndexError;
use crate::matchspec::SpecError;
use crate::time::TimeError;

/// Fatal errors of a filtering run. None of them leaves partial output behind.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// A user-supplied match spec did not parse.
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    /// `after` or `before` did not parse.
    #[error("Invalid {field} time: {source}")]
    InvalidTime {
        /// `after` or `before`.
        field: &'static str,
        /// Underlying parse error.
        source: TimeError,
    },

    /// A requested subdir name is not a valid identifier.
    #[error(transparent)]
    InvalidSubdir(#[from] SubdirError),

    /// No keep, keep-tree, prune, remove or time filter was given.
    #[error("No filters given: pass at least one of keep, keep-tree, prune, remove, after or before")]
    NoFilters,

    /// The index could not be assembled.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Strict mode found dependencies that the output cannot satisfy.
    #[error(
        "{} unresolved dependencies (first: {})",
        .0.len(),
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    UnresolvedDependencies(Vec<Unresolved>),

    /// Serializing a subdir failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
