// src/logging.rs
// =============================================================================
// Sets up structured logging with `tracing`.
//
// - Log lines always go to stderr (stdout stays clean for --json output)
// - --verbose switches our own events from INFO to DEBUG; dependencies
//   (chromiumoxide, hyper, reqwest...) stay at INFO
// - --log-file additionally appends every line (without colours) to a file
// =============================================================================

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

// Installs the global tracing subscriber
//
// Parameters:
//   verbose: enable debug-level events
//   log_file: optional file that receives a copy of every log line
//
// Returns: Err if the log file can't be opened or a subscriber is already set
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    registry()
        .with(log_filter(verbose))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

// Debug output is limited to this crate's own targets
fn log_filter(verbose: bool) -> Targets {
    let own_level = if verbose { Level::DEBUG } else { Level::INFO };
    Targets::new()
        .with_default(LevelFilter::INFO)
        .with_target(env!("CARGO_CRATE_NAME"), own_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_only_affects_own_events() {
        let filter = log_filter(true);
        assert!(filter.would_enable("snpsht::generate", &Level::DEBUG));
        assert!(!filter.would_enable("chromiumoxide::handler", &Level::DEBUG));
        assert!(!filter.would_enable("hyper::proto", &Level::DEBUG));
        assert!(filter.would_enable("reqwest::connect", &Level::INFO));
    }

    #[test]
    fn test_default_level_is_info() {
        let filter = log_filter(false);
        assert!(filter.would_enable("snpsht::sitemap", &Level::INFO));
        assert!(!filter.would_enable("snpsht::sitemap", &Level::DEBUG));
        assert!(!filter.would_enable("tokio", &Level::TRACE));
    }
}
