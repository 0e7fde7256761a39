//! Byte-count progress for stream commands

use ferrozst_types::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Spinner showing how many bytes a stream command has written
pub struct ByteProgress {
    progress_bar: Option<ProgressBar>,
}

impl ByteProgress {
    /// Create a tracker; `quiet` disables all output
    pub fn new(quiet: bool, label: &str) -> Self {
        let progress_bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {bytes} written ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb.set_message(label.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        };

        Self { progress_bar }
    }

    /// Callback to hand to the pipeline; it receives cumulative bytes written
    pub fn reporter(&self) -> Option<ProgressCallback> {
        let pb = self.progress_bar.clone()?;
        Some(Arc::new(move |total: u64| pb.set_position(total)))
    }

    /// Stop the spinner, leaving `message` on screen
    pub fn finish(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Stop the spinner and erase it
    pub fn finish_and_clear(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrozst_types::ProgressReporter;

    #[test]
    fn test_quiet_has_no_reporter() {
        let progress = ByteProgress::new(true, "Compressing");
        assert!(progress.reporter().is_none());
        progress.finish("done");
    }

    #[test]
    fn test_reporter_moves_position() {
        let progress = ByteProgress::new(false, "Compressing");
        let reporter = progress.reporter().unwrap();
        reporter.report_progress(4096);

        assert_eq!(progress.progress_bar.as_ref().unwrap().position(), 4096);
        progress.finish_and_clear();
    }
}
