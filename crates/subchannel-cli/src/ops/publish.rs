//! Writing a filtered channel to disk.
//!
//! Each subdir is encoded and written on the blocking pool. Every file goes
//! through a temporary file in its destination directory and is renamed into
//! place, so readers never observe a half-written `repodata.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use subchannel_core::encode::encode;
use subchannel_core::{ChannelSummary, FilterOutcome, Reporter, RewrittenSubdir, SUMMARY_FN};
use subchannel_schema::{Blake3Hash, Sha256Hash, Subdir};
use tempfile::NamedTempFile;

/// Name of the human-readable listing in the channel and each subdir.
pub const INDEX_MD: &str = "index.md";

/// Where and how to publish.
#[derive(Debug, Clone)]
pub struct PublishTarget {
    /// Output channel directory.
    pub output: PathBuf,
    /// Source channel URL, linked from the channel `index.md`.
    pub source_url: String,
    /// URL the output will be served at, if known.
    pub served_at: Option<String>,
}

/// One written file, as listed in a subdir `index.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub sha256: Sha256Hash,
    pub blake3: Blake3Hash,
}

/// Write every subdir of `outcome`, the channel `index.md` and the summary.
///
/// # Errors
///
/// Returns an error if any subdir or the channel-level files could not be
/// written. Subdirs that were written before the failure are left in place.
pub async fn publish(
    outcome: FilterOutcome,
    target: &PublishTarget,
    summary: &ChannelSummary,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.section("Writing");
    std::fs::create_dir_all(&target.output)
        .with_context(|| format!("Failed to create {}", target.output.display()))?;

    let subdirs: Vec<Subdir> = outcome.subdirs.iter().map(|s| s.subdir.clone()).collect();
    let tasks = outcome.subdirs.into_iter().map(|rewritten| {
        let dir = target.output.join(rewritten.subdir.as_str());
        tokio::task::spawn_blocking(move || write_subdir(&dir, &rewritten))
    });
    let results = join_all(tasks).await;

    for (subdir, joined) in subdirs.iter().zip(results) {
        let files = joined
            .context("Writer task panicked")?
            .with_context(|| format!("Failed to write {subdir}"))?;
        let bytes: u64 = files.iter().map(|f| f.size).sum();
        reporter.written(subdir, files.len(), bytes);
    }

    let page = render_channel_index(target, &subdirs, summary);
    write_atomic(&target.output.join(INDEX_MD), page.as_bytes())?;

    let json = summary.to_json().context("Failed to serialize summary")?;
    write_atomic(&target.output.join(SUMMARY_FN), &json)?;

    tracing::debug!(output = %target.output.display(), "Published channel");
    Ok(())
}

/// Encode one subdir and write its repodata files plus `index.md`.
fn write_subdir(dir: &Path, rewritten: &RewrittenSubdir) -> Result<Vec<PublishedFile>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let encoded = encode(&rewritten.repodata)?;

    let mut files = Vec::new();
    for (encoding, bytes) in encoded.iter() {
        let name = encoding.file_name();
        let path = dir.join(&name);
        write_atomic(&path, bytes)?;
        files.push(describe(&path, name, bytes));
    }

    let page = render_subdir_index(&rewritten.subdir, &files);
    write_atomic(&dir.join(INDEX_MD), page.as_bytes())?;
    Ok(files)
}

fn describe(path: &Path, name: String, bytes: &[u8]) -> PublishedFile {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
    PublishedFile {
        name,
        size: bytes.len() as u64,
        modified,
        sha256: Sha256Hash::compute(bytes),
        blake3: Blake3Hash::compute(bytes),
    }
}

/// Write `bytes` to `path` via a temporary file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("No parent directory for {}", path.display()))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Listing of a subdir's files with sizes and digests.
pub fn render_subdir_index(subdir: &Subdir, files: &[PublishedFile]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {subdir}\n");
    let _ = writeln!(out, "| Filename | Size (bytes) | Last modified | SHA256 | BLAKE3 |");
    let _ = writeln!(out, "|----------|--------------|---------------|--------|--------|");
    for file in files {
        let _ = writeln!(
            out,
            "| [{name}](./{name}) | {size} | {modified} | `{sha256}` | `{blake3}` |",
            name = file.name,
            size = file.size,
            modified = file.modified.format("%Y-%m-%d %H:%M:%S UTC"),
            sha256 = file.sha256,
            blake3 = file.blake3,
        );
    }
    out
}

/// Channel landing page: where it came from, where it lives, what it holds.
pub fn render_channel_index(
    target: &PublishTarget,
    subdirs: &[Subdir],
    summary: &ChannelSummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# subchannel\n");
    let _ = writeln!(
        out,
        "Derived from [{source}]({source}) by {generator} on {date}.\n",
        source = target.source_url,
        generator = summary.generator,
        date = summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if let Some(url) = &target.served_at {
        let _ = writeln!(out, "Served at [{url}]({url}).\n");
    }
    let _ = writeln!(
        out,
        "{} of {} records kept.\n",
        summary.records_after(),
        summary.records_before()
    );

    let _ = writeln!(out, "## Subdirs\n");
    for subdir in subdirs {
        let _ = writeln!(out, "- [{subdir}](./{subdir}/)");
    }

    if let Ok(filters) = toml::to_string(&summary.filters) {
        let _ = writeln!(out, "\n## Filters\n\n```toml\n{filters}```");
    }
    out
}
