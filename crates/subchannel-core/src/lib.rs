//! The subchannel filtering engine.
//!
//! Given an [`Index`] of a channel and a [`FilterRequest`], decide which
//! records survive and render them as CEP-15 repodata documents:
//!
//! 1. [`select`]: union of the `keep_tree` closure, `keep` matches and the
//!    timestamp window
//! 2. [`prune`]: per-name constraints, then blanket removals
//! 3. [`rewrite`]: regroup per subdir and inject `base_url`
//! 4. [`encode`]: JSON, zstd and bzip2 bytes of each document
//!
//! [`pipeline::run`] chains the first three.

pub mod encode;
pub mod error;
pub mod graph;
pub mod index;
pub mod matchspec;
pub mod pipeline;
pub mod prune;
pub mod reporter;
pub mod request;
pub mod rewrite;
pub mod select;
pub mod summary;
pub mod time;

pub use encode::{EncodeError, EncodedRepoData, Encoding};
pub use error::FilterError;
pub use graph::{Unresolved, UnresolvedReason};
pub use index::{Index, IndexBuilder, IndexError, RecordId, RecordSet, SubdirInfo};
pub use matchspec::{MatchSpec, SpecError, SpecErrorKind};
pub use pipeline::{FilterOutcome, Warning, run};
pub use reporter::{NullReporter, Reporter};
pub use request::{FilterOptions, FilterRequest, UnresolvedPolicy};
pub use rewrite::RewrittenSubdir;
pub use summary::{ChannelSummary, FailedSubdir, SUMMARY_FN, SubdirSummary};
pub use time::{Edge, TimeError};
