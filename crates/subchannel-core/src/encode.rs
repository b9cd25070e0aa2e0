//! Serialized forms of a repodata document.
//!
//! Every subdir is published as plain JSON plus two compressed copies of the
//! exact same bytes. Readers pick whichever they support; all decode to the
//! same document.

use std::io::{Read, Write};

use bzip2::Compression;
use subchannel_schema::{BZIP2_MAGIC, REPODATA_FN, RepoData, ZSTD_MAGIC};

/// zstd level used for `repodata.json.zst`.
pub const ZSTD_LEVEL: i32 = 16;

/// Errors raised while encoding or decoding a document.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A compressor or decompressor failed.
    #[error("Compression error: {0}")]
    Io(#[from] std::io::Error),
}

/// One output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    /// `repodata.json`
    Json,
    /// `repodata.json.zst`
    Zstd,
    /// `repodata.json.bz2`
    Bzip2,
}

impl Encoding {
    /// Every encoding, in publishing order.
    pub const ALL: [Self; 3] = [Self::Json, Self::Zstd, Self::Bzip2];

    /// File name inside the subdir directory.
    pub fn file_name(self) -> String {
        match self {
            Self::Json => REPODATA_FN.to_string(),
            Self::Zstd => format!("{REPODATA_FN}.zst"),
            Self::Bzip2 => format!("{REPODATA_FN}.bz2"),
        }
    }

    /// Guess the encoding of a byte stream from its magic number.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZSTD_MAGIC) {
            Self::Zstd
        } else if bytes.starts_with(&BZIP2_MAGIC) {
            Self::Bzip2
        } else {
            Self::Json
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Zstd => "zstd",
            Self::Bzip2 => "bzip2",
        })
    }
}

/// A document rendered in every [`Encoding`].
#[derive(Debug, Clone)]
pub struct EncodedRepoData {
    /// Canonical JSON bytes.
    pub json: Vec<u8>,
    /// zstd-compressed JSON.
    pub zstd: Vec<u8>,
    /// bzip2-compressed JSON.
    pub bzip2: Vec<u8>,
}

impl EncodedRepoData {
    /// Bytes for one encoding.
    pub fn get(&self, encoding: Encoding) -> &[u8] {
        match encoding {
            Encoding::Json => &self.json,
            Encoding::Zstd => &self.zstd,
            Encoding::Bzip2 => &self.bzip2,
        }
    }

    /// `(encoding, bytes)` pairs in publishing order.
    pub fn iter(&self) -> impl Iterator<Item = (Encoding, &[u8])> {
        Encoding::ALL.into_iter().map(|e| (e, self.get(e)))
    }
}

/// Render `repodata` as canonical JSON and compress it.
///
/// # Errors
///
/// Returns an error if serialization or compression fails.
pub fn encode(repodata: &RepoData) -> Result<EncodedRepoData, EncodeError> {
    let json = repodata.to_canonical_json()?;
    let zstd = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;

    let mut bz = bzip2::write::BzEncoder::new(Vec::new(), Compression::best());
    bz.write_all(&json)?;
    let bzip2 = bz.finish()?;

    Ok(EncodedRepoData { json, zstd, bzip2 })
}

/// Decompress bytes of any supported encoding back to JSON bytes.
///
/// # Errors
///
/// Returns an error if the stream is truncated or corrupt.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, EncodeError> {
    match Encoding::sniff(bytes) {
        Encoding::Json => Ok(bytes.to_vec()),
        Encoding::Zstd => Ok(zstd::decode_all(bytes)?),
        Encoding::Bzip2 => {
            let mut out = Vec::new();
            bzip2::read::BzDecoder::new(bytes).read_to_end(&mut out)?;
            Ok(out)
        }
    }
}

/// Decode bytes of any supported encoding into a document.
///
/// # Errors
///
/// Returns an error if decompression or JSON parsing fails.
pub fn decode(bytes: &[u8]) -> Result<RepoData, EncodeError> {
    let json = decompress(bytes)?;
    Ok(RepoData::from_json_slice(&json)?)
}
