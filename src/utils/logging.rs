use crate::error::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Builds the per-run [`Dispatch`] handed to the pipeline.
///
/// Nothing is installed globally; the processor enters the dispatch on each
/// worker thread for the length of a run.
#[derive(Debug, Clone)]
pub struct LogSettings {
    level: &'static str,
    log_file: Option<PathBuf>,
    quiet: bool,
}

impl LogSettings {
    pub fn new(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" },
            log_file: None,
            quiet: false,
        }
    }

    /// Also append plain-text log lines to `path`.
    pub fn with_log_file(mut self, path: Option<&Path>) -> Self {
        self.log_file = path.map(Path::to_path_buf);
        self
    }

    /// Quiet runs write nothing to stderr; a log file still receives output.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn build_dispatch(&self) -> Result<Dispatch> {
        // RUST_LOG wins over -v
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("precip_audit={}", self.level)));

        let stderr_layer = (!self.quiet).then(|| {
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr)
        });

        let file_layer = match &self.log_file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(false)
                        .with_level(true)
                        .with_writer(Mutex::new(file)),
                )
            }
            None => None,
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer);

        Ok(Dispatch::new(subscriber))
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(false)
    }
}
