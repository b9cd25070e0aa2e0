//! Regroup the kept records per subdir and inject CEP-15 metadata.

use serde_json::Value;
use subchannel_schema::{CEP15_REPODATA_VERSION, ChannelInfo, RepoData, Subdir};

use crate::index::{Index, RecordSet};

/// Placeholder substituted in a `base_url` override.
pub const SUBDIR_PLACEHOLDER: &str = "{subdir}";

/// Output document for one subdir.
#[derive(Debug, Clone)]
pub struct RewrittenSubdir {
    /// Subdir this document describes.
    pub subdir: Subdir,
    /// The filtered document with `info.base_url` set.
    pub repodata: RepoData,
    /// Records loaded for this subdir.
    pub source_count: usize,
}

impl RewrittenSubdir {
    /// Records kept for this subdir.
    pub fn kept_count(&self) -> usize {
        self.repodata.len()
    }
}

/// Build one document per loaded subdir (and always `noarch`), in subdir order.
///
/// `source_url` is the channel the records came from; `base_url_override`
/// replaces it as the place clients fetch packages from.
pub fn rewrite(
    kept: &RecordSet<'_>,
    source_url: &str,
    base_url_override: Option<&str>,
) -> Vec<RewrittenSubdir> {
    let index = kept.index();
    let mut subdirs: Vec<Subdir> = index.subdirs().map(|(s, _)| s.clone()).collect();
    if !subdirs.iter().any(Subdir::is_noarch) {
        subdirs.push(Subdir::noarch());
        subdirs.sort();
    }

    subdirs
        .into_iter()
        .map(|subdir| {
            let base_url = base_url_for(index, &subdir, source_url, base_url_override);
            let mut repodata = RepoData {
                info: Some(ChannelInfo {
                    base_url: Some(base_url),
                    subdir: Some(subdir.to_string()),
                }),
                repodata_version: Some(CEP15_REPODATA_VERSION),
                ..RepoData::default()
            };
            for record in kept.in_subdir(&subdir) {
                repodata.insert(record.filename(), Value::Object(record.body().clone()));
            }
            let source_count = index.subdir_info(&subdir).map_or(0, |i| i.record_count);
            tracing::debug!(
                %subdir,
                kept = repodata.len(),
                source = source_count,
                "Rewrote subdir"
            );
            RewrittenSubdir {
                subdir,
                repodata,
                source_count,
            }
        })
        .collect()
}

/// Where clients of the output fetch `subdir`'s packages from.
///
/// An override wins and is used as given, with any `{subdir}` in it
/// substituted. Without one, the source's own `info.base_url` is used
/// (resolved against the source subdir if relative), falling back to the
/// source subdir itself.
pub fn base_url_for(
    index: &Index,
    subdir: &Subdir,
    source_url: &str,
    base_url_override: Option<&str>,
) -> String {
    if let Some(url) = base_url_override {
        return url.replace(SUBDIR_PLACEHOLDER, subdir.as_str());
    }

    let source_subdir = subdir_url(source_url, subdir);
    match index
        .subdir_info(subdir)
        .and_then(|info| info.source_base_url.as_deref())
    {
        Some(declared) => resolve_relative(&source_subdir, declared),
        None => source_subdir,
    }
}

fn subdir_url(channel: &str, subdir: &Subdir) -> String {
    format!("{}/{subdir}/", channel.trim_end_matches('/'))
}

/// Resolve `reference` against a directory URL ending in `/`.
fn resolve_relative(base: &str, reference: &str) -> String {
    if reference.contains("://") {
        return reference.to_string();
    }

    let (origin, path) = match base.split_once("://") {
        Some((scheme, rest)) => {
            let slash = rest.find('/').unwrap_or(rest.len());
            (format!("{scheme}://{}", &rest[..slash]), &rest[slash..])
        }
        None => (String::new(), base),
    };

    if reference.starts_with('/') {
        return format!("{origin}{reference}");
    }

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for part in reference.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let trailing = if reference.ends_with('/') || reference.ends_with("..") || reference == "." {
        "/"
    } else {
        ""
    };
    format!("{origin}/{}{trailing}", segments.join("/"))
}
