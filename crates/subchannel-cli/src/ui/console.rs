//! Console implementation of [`Reporter`].

use crossterm::style::Stylize;
use subchannel_core::Reporter;
use subchannel_schema::Subdir;

use super::theme::{Theme, format_size};

/// Prints progress to stdout and problems to stderr.
///
/// In quiet mode only warnings and errors are shown.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    quiet: bool,
    theme: Theme,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            theme: Theme::default(),
        }
    }

    fn subdir(&self, subdir: &Subdir) -> String {
        format!("{:<14}", subdir.as_str())
            .with(self.theme.colors.subdir)
            .to_string()
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {}",
            title.white().bold(),
            "─".repeat(40).with(self.theme.colors.header)
        );
    }

    fn loaded(&self, subdir: &Subdir, records: usize) {
        if self.quiet {
            return;
        }
        println!(
            "  {} {}",
            self.subdir(subdir),
            format!("{records} records").with(self.theme.colors.secondary)
        );
    }

    fn filtered(&self, subdir: &Subdir, before: usize, after: usize) {
        if self.quiet {
            return;
        }
        println!(
            "  {} {} {}",
            self.subdir(subdir),
            format!("{after:>7}").white().bold(),
            format!("of {before} kept").with(self.theme.colors.secondary)
        );
    }

    fn written(&self, subdir: &Subdir, files: usize, bytes: u64) {
        if self.quiet {
            return;
        }
        println!(
            "  {} {}",
            self.subdir(subdir),
            format!("{files} files, {}", format_size(bytes)).with(self.theme.colors.secondary)
        );
    }

    fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("  {} {}", self.theme.icons.info, msg);
    }

    fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("{} {}", self.theme.icons.success.green(), msg.green());
    }

    fn warning(&self, msg: &str) {
        eprintln!("{} {}", self.theme.icons.warning.yellow(), msg.yellow());
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {}", self.theme.icons.error.red(), msg.red());
    }

    fn summary(&self, kept: usize, total: usize, elapsed_secs: f64) {
        if self.quiet {
            return;
        }
        println!();
        let msg = format!(
            "Kept {kept} of {total} record{} in {elapsed_secs:.1}s",
            if total == 1 { "" } else { "s" }
        );
        self.success(&msg);
    }
}
