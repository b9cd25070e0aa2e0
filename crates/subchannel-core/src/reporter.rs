//! Reporter trait for dependency injection
//!
//! This trait allows the engine and the publishing steps to report progress
//! without being coupled to a specific console implementation.

use subchannel_schema::Subdir;

/// Progress sink for a filtering run.
pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Loading", "Filtering").
    fn section(&self, title: &str);

    /// A subdir's source index was read.
    fn loaded(&self, subdir: &Subdir, records: usize);

    /// A subdir's filtered document is ready.
    fn filtered(&self, subdir: &Subdir, before: usize, after: usize);

    /// A subdir's files were written.
    fn written(&self, subdir: &Subdir, files: usize, bytes: u64);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of the run.
    fn summary(&self, kept: usize, total: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn loaded(&self, subdir: &Subdir, records: usize) {
        (**self).loaded(subdir, records);
    }
    fn filtered(&self, subdir: &Subdir, before: usize, after: usize) {
        (**self).filtered(subdir, before, after);
    }
    fn written(&self, subdir: &Subdir, files: usize, bytes: u64) {
        (**self).written(subdir, files, bytes);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, kept: usize, total: usize, elapsed_secs: f64) {
        (**self).summary(kept, total, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., dry runs in tests).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn loaded(&self, _: &Subdir, _: usize) {}
    fn filtered(&self, _: &Subdir, _: usize, _: usize) {}
    fn written(&self, _: &Subdir, _: usize, _: u64) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: usize, _: f64) {}
}
