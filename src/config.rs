// src/config.rs
// =============================================================================
// Run configuration.
//
// A Config is built once per run and never changes afterwards. It is made
// by layering overrides on top of the defaults:
//
//   defaults  <-  config file (--config, TOML)  <-  command-line flags
//
// Each layer is a ConfigOverrides where every field is optional, so a layer
// only replaces the values it actually sets.
//
// Rust concepts:
// - Default trait: gives us Config::default()
// - Option<T>: "maybe set" fields in the override layers
// - serde rename_all: map camelCase keys in the TOML file onto snake_case fields
// =============================================================================

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Browser viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

// Parses "1280x720" (also accepts an uppercase X)
impl FromStr for Viewport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || ConfigError::ViewportSyntax(s.to_string());
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(syntax)?;
        let width = width.trim().parse().map_err(|_| syntax())?;
        let height = height.trim().parse().map_err(|_| syntax())?;
        Ok(Self { width, height })
    }
}

/// The immutable configuration of one snapshot run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prefix for site-relative sitemap locations
    pub base_url: String,
    /// Local path or http(s) URL of the sitemap
    pub sitemap_url: String,
    /// Root directory for every snapshot written
    pub out_dir: PathBuf,
    /// Maximum number of URLs rendered and stored at the same time
    pub concurrency: usize,
    /// Per-render time limit
    pub timeout: Duration,
    /// Wait for network idle instead of the basic load event
    pub wait_for_network_idle: bool,
    /// CSS selectors that must be visible before the HTML is captured
    pub wait_for_selectors: Vec<String>,
    /// Fixed extra delay after the page has loaded
    pub additional_wait: Option<Duration>,
    pub pretty_html: bool,
    pub include_metadata: bool,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub viewport: Viewport,
    /// Explicit Chrome/Chromium executable
    pub chrome_bin: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            sitemap_url: String::new(),
            out_dir: PathBuf::from("./snapshots"),
            concurrency: 4,
            timeout: Duration::from_millis(30_000),
            wait_for_network_idle: true,
            wait_for_selectors: Vec::new(),
            additional_wait: None,
            pretty_html: false,
            include_metadata: true,
            verbose: false,
            log_file: None,
            user_agent: None,
            viewport: Viewport::default(),
            chrome_bin: None,
        }
    }
}

/// One layer of user-supplied settings. Unset fields keep the lower layer's value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub sitemap_url: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    /// Milliseconds
    pub timeout: Option<u64>,
    pub wait_for_network_idle: Option<bool>,
    pub wait_for_selectors: Option<Vec<String>>,
    pub additional_wait_ms: Option<u64>,
    pub pretty_html: Option<bool>,
    pub include_metadata: Option<bool>,
    pub verbose: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub viewport: Option<Viewport>,
    pub chrome_bin: Option<PathBuf>,
}

impl ConfigOverrides {
    // Loads an override layer from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    // Stacks `upper` on top of `self`; values set in `upper` win
    pub fn merge(self, upper: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            base_url: upper.base_url.or(self.base_url),
            sitemap_url: upper.sitemap_url.or(self.sitemap_url),
            out_dir: upper.out_dir.or(self.out_dir),
            concurrency: upper.concurrency.or(self.concurrency),
            timeout: upper.timeout.or(self.timeout),
            wait_for_network_idle: upper.wait_for_network_idle.or(self.wait_for_network_idle),
            wait_for_selectors: upper.wait_for_selectors.or(self.wait_for_selectors),
            additional_wait_ms: upper.additional_wait_ms.or(self.additional_wait_ms),
            pretty_html: upper.pretty_html.or(self.pretty_html),
            include_metadata: upper.include_metadata.or(self.include_metadata),
            verbose: upper.verbose.or(self.verbose),
            log_file: upper.log_file.or(self.log_file),
            user_agent: upper.user_agent.or(self.user_agent),
            viewport: upper.viewport.or(self.viewport),
            chrome_bin: upper.chrome_bin.or(self.chrome_bin),
        }
    }
}

impl Config {
    // Applies an override layer to the defaults and validates the result
    //
    // Returns: Err if concurrency is 0, the sitemap source is empty,
    // or the viewport has a zero dimension
    pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let config = Config {
            base_url: overrides.base_url.unwrap_or(defaults.base_url),
            sitemap_url: overrides.sitemap_url.unwrap_or(defaults.sitemap_url),
            out_dir: overrides.out_dir.unwrap_or(defaults.out_dir),
            concurrency: overrides.concurrency.unwrap_or(defaults.concurrency),
            timeout: overrides
                .timeout
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            wait_for_network_idle: overrides
                .wait_for_network_idle
                .unwrap_or(defaults.wait_for_network_idle),
            wait_for_selectors: overrides
                .wait_for_selectors
                .unwrap_or(defaults.wait_for_selectors),
            // 0 means "no extra wait", same as leaving it unset
            additional_wait: overrides
                .additional_wait_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            pretty_html: overrides.pretty_html.unwrap_or(defaults.pretty_html),
            include_metadata: overrides
                .include_metadata
                .unwrap_or(defaults.include_metadata),
            verbose: overrides.verbose.unwrap_or(defaults.verbose),
            log_file: overrides.log_file.or(defaults.log_file),
            user_agent: overrides.user_agent.or(defaults.user_agent),
            viewport: overrides.viewport.unwrap_or(defaults.viewport),
            chrome_bin: overrides.chrome_bin.or(defaults.chrome_bin),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        if self.sitemap_url.trim().is_empty() {
            return Err(ConfigError::MissingSitemap);
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        Ok(())
    }
}
