//! The filter run: load, select, publish

use anyhow::{Result, bail};
use std::time::Instant;
use subchannel_core::{FilterError, FilterRequest, Reporter};

use crate::FilterArgs;
use crate::config::{ConfigFile, Settings};
use crate::ops::{PublishTarget, load_channel, publish};
use crate::ui::ConsoleReporter;

/// Build a subchannel from `args`.
pub async fn filter(args: &FilterArgs, dry_run: bool, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let reporter = ConsoleReporter::new(quiet);

    let file = match &args.config {
        Some(path) => ConfigFile::load(path).await?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(args, file)?;

    let mut options = settings.filters.clone();
    if !options.has_filters() {
        return Err(FilterError::NoFilters.into());
    }
    // Only prune/remove given: start from the whole channel.
    if !options.has_selection_criteria() {
        options.keep.push("*".to_string());
    }
    let request = FilterRequest::from_options(&options)?;

    reporter.section("Loading");
    let channel = load_channel(&settings.channel, &request.subdirs, &reporter).await?;
    let source_url = settings.source_url.clone().unwrap_or(channel.source_url);

    let outcome = match subchannel_core::run(&channel.index, &request, &source_url, &reporter) {
        Ok(outcome) => outcome,
        Err(FilterError::UnresolvedDependencies(list)) => {
            for unresolved in &list {
                reporter.error(&unresolved.to_string());
            }
            bail!(
                "{} dependencies cannot be satisfied by the output (run without --strict to publish anyway)",
                list.len()
            );
        }
        Err(err) => return Err(err.into()),
    };

    if !outcome.filtered_any() {
        bail!("Didn't filter any records: every record of the source matched");
    }

    let kept = outcome.records_after();
    let total = outcome.records_before();
    let mut summary = outcome.summary(&crate::generator(), &source_url, &settings.filters);
    summary.failed = channel.failed;

    if dry_run {
        reporter.info(&format!(
            "Dry run: would write {} subdirs to {}",
            outcome.subdirs.len(),
            settings.output.display()
        ));
    } else {
        let target = PublishTarget {
            output: settings.output.clone(),
            source_url,
            served_at: settings.served_at.clone(),
        };
        publish(outcome, &target, &summary, &reporter).await?;
        reporter.info(&format!("Wrote {}", settings.output.display()));
    }

    reporter.summary(kept, total, start.elapsed().as_secs_f64());
    Ok(())
}
