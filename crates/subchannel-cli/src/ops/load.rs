//! Channel loading.
//!
//! Reads each requested subdir of a local channel on the blocking pool and
//! assembles one [`Index`]. A subdir that fails to load is reported and left
//! out; a missing `noarch` is treated as empty.

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use subchannel_core::encode::decode;
use subchannel_core::{Encoding, FailedSubdir, Index, Reporter, SubdirInfo};
use subchannel_schema::{RepoData, Subdir};

/// A loaded source channel.
#[derive(Debug)]
pub struct LoadedChannel {
    /// Records of every subdir that loaded.
    pub index: Index,
    /// `file://` URL of the channel directory.
    pub source_url: String,
    /// Subdirs that could not be loaded, with the reason.
    pub failed: Vec<FailedSubdir>,
}

/// Reject remote channels and return the `file://` URL of a local one.
///
/// # Errors
///
/// Returns an error for `http(s)://` locations or missing directories.
pub fn local_channel_url(channel: &Path) -> Result<String> {
    let display = channel.to_string_lossy();
    if display.starts_with("http://") || display.starts_with("https://") {
        bail!(
            "Remote channels are not supported: download '{display}' first and pass the local directory (use --source-url to keep its public URL)"
        );
    }
    let absolute = std::fs::canonicalize(channel)
        .with_context(|| format!("Channel directory not found: {}", channel.display()))?;
    if !absolute.is_dir() {
        bail!("Channel is not a directory: {}", absolute.display());
    }
    Ok(format!("file://{}", absolute.display()))
}

/// Find the repodata file of a subdir, preferring plain JSON.
fn find_repodata(dir: &Path) -> Option<PathBuf> {
    Encoding::ALL
        .iter()
        .map(|encoding| dir.join(encoding.file_name()))
        .find(|path| path.is_file())
}

/// Read and decode one subdir. `Ok(None)` means the subdir has no repodata.
fn read_subdir(dir: &Path) -> Result<Option<RepoData>> {
    let Some(path) = find_repodata(dir) else {
        return Ok(None);
    };
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let repodata = decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = repodata.len(), "Read repodata");
    Ok(Some(repodata))
}

/// Load `subdirs` of the channel at `channel`.
///
/// # Errors
///
/// Returns an error if the channel is not a local directory, or if no
/// requested subdir could be loaded.
pub async fn load_channel(
    channel: &Path,
    subdirs: &[Subdir],
    reporter: &dyn Reporter,
) -> Result<LoadedChannel> {
    let source_url = local_channel_url(channel)?;
    reporter.info(&format!("Reading {source_url}"));

    let tasks = subdirs.iter().map(|subdir| {
        let dir = channel.join(subdir.as_str());
        tokio::task::spawn_blocking(move || read_subdir(&dir))
    });
    let results = join_all(tasks).await;

    let mut builder = Index::builder();
    let mut failed = Vec::new();
    let mut loaded = 0usize;

    for (subdir, joined) in subdirs.iter().zip(results) {
        let result = joined
            .context("Loader task panicked")
            .and_then(|r| r);
        match result {
            Ok(Some(repodata)) => {
                let total = repodata.len();
                let skipped = builder.add_repodata(subdir, repodata)?;
                if !skipped.is_empty() {
                    reporter.warning(&format!(
                        "{subdir}: skipped {} unreadable record(s)",
                        skipped.len()
                    ));
                }
                reporter.loaded(subdir, total - skipped.len());
                loaded += 1;
            }
            Ok(None) if subdir.is_noarch() => {
                tracing::info!("No noarch repodata; publishing an empty noarch");
                builder.add_subdir(subdir.clone(), SubdirInfo::default());
                reporter.loaded(subdir, 0);
            }
            Ok(None) => {
                let reason = format!("no repodata found in {}", channel.join(subdir.as_str()).display());
                reporter.warning(&format!("Skipping {subdir}: {reason}"));
                failed.push(FailedSubdir {
                    subdir: subdir.clone(),
                    reason,
                });
            }
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::warn!(%subdir, error = %reason, "Failed to load subdir");
                reporter.warning(&format!("Skipping {subdir}: {reason}"));
                if subdir.is_noarch() {
                    builder.add_subdir(subdir.clone(), SubdirInfo::default());
                }
                failed.push(FailedSubdir {
                    subdir: subdir.clone(),
                    reason,
                });
            }
        }
    }

    if loaded == 0 {
        bail!(
            "None of the requested subdirs could be loaded from {}",
            channel.display()
        );
    }

    Ok(LoadedChannel {
        index: builder.build(),
        source_url,
        failed,
    })
}
