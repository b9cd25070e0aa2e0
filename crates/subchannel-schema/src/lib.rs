//! Shared types and wire format for subchannel.
//!
//! Everything here is a plain value: records, their identity, conda version
//! ordering and the `repodata.json` document. The filtering engine lives in
//! `subchannel-core`.

pub mod hash;
pub mod record;
pub mod repodata;
pub mod subdir;
pub mod types;
pub mod version;

// Re-exports
pub use hash::{Blake3Hash, Sha256Hash};
pub use record::{PackageRecord, RecordError};
pub use repodata::{ChannelInfo, RepoData};
pub use subdir::{Subdir, SubdirError};
pub use types::RecordKey;
pub use version::{Version, VersionError};

/// File name of the canonical index document inside a subdir.
pub const REPODATA_FN: &str = "repodata.json";

/// `repodata_version` emitted for documents carrying `info.base_url` (CEP-15).
pub const CEP15_REPODATA_VERSION: u32 = 2;

/// Magic bytes for ZSTD compression (Little Endian: 0xFD2FB528 -> 28 B5 2F FD)
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Magic bytes for bzip2 streams (`BZh`).
pub const BZIP2_MAGIC: [u8; 3] = *b"BZh";
