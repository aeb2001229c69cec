// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
//
// Every flag is optional at the clap level: a value that isn't given on the
// command line may still come from the --config file or the defaults. The
// flags are turned into a ConfigOverrides layer, which main.rs stacks on top
// of the file layer.
// =============================================================================

use clap::{Parser, Subcommand};
use snpsht::{ConfigOverrides, Viewport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "snpsht",
    version,
    about = "Render the pages of a sitemap in headless Chrome and save static HTML snapshots",
    long_about = "snpsht loads a sitemap, renders every page it lists in a headless browser \
                  (so JavaScript-built content is included) and writes the final HTML to disk. \
                  The snapshots can be served to crawlers or used as a static fallback."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate HTML snapshots for every URL in a sitemap
    ///
    /// Example: snpsht generate -s https://example.com/sitemap.xml -o ./snapshots
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Base URL prepended to site-relative sitemap locations
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Sitemap location: a local file or an http(s) URL
    #[arg(short, long)]
    pub sitemap: Option<String>,

    /// Directory the snapshots are written to [default: ./snapshots]
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Number of pages rendered at the same time [default: 4]
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// CSS selector that must be visible before capture (repeatable)
    #[arg(short, long = "wait", value_name = "SELECTOR", num_args = 1..)]
    pub wait: Vec<String>,

    /// Per-page timeout in milliseconds [default: 30000]
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Extra delay after the page has loaded, in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub additional_wait: Option<u64>,

    /// Wait for the network to go idle before capture (default)
    #[arg(short = 'n', long, conflicts_with = "no_network_idle")]
    pub network_idle: bool,

    /// Only wait for the load event
    #[arg(long)]
    pub no_network_idle: bool,

    /// Reflow the HTML so every tag starts on its own line
    #[arg(short, long)]
    pub pretty: bool,

    /// Write a .meta.json file next to each snapshot (default)
    #[arg(short, long, conflicts_with = "no_metadata")]
    pub metadata: bool,

    /// Don't write metadata files
    #[arg(long)]
    pub no_metadata: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// User agent string for every page
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Browser viewport, e.g. 1920x1080 [default: 1280x720]
    #[arg(long, value_name = "WxH")]
    pub viewport: Option<Viewport>,

    /// Path to the Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    pub chrome_bin: Option<PathBuf>,

    /// TOML file with default options; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    // Converts the flags into an override layer
    //
    // Switches that weren't passed stay None so the config file (or the
    // default) decides.
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            sitemap_url: self.sitemap.clone(),
            out_dir: self.out_dir.clone(),
            concurrency: self.concurrency,
            timeout: self.timeout,
            wait_for_network_idle: flag(self.network_idle, self.no_network_idle),
            wait_for_selectors: (!self.wait.is_empty()).then(|| self.wait.clone()),
            additional_wait_ms: self.additional_wait,
            pretty_html: self.pretty.then_some(true),
            include_metadata: flag(self.metadata, self.no_metadata),
            verbose: self.verbose.then_some(true),
            log_file: self.log_file.clone(),
            user_agent: self.user_agent.clone(),
            viewport: self.viewport,
            chrome_bin: self.chrome_bin.clone(),
        }
    }
}

// Maps an --x / --no-x pair onto an optional override
fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        match cli.command {
            Commands::Generate(args) => args,
        }
    }

    #[test]
    fn test_parses_short_flags() {
        let args = parse(&[
            "snpsht", "generate", "-s", "sitemap.xml", "-b", "https://example.com", "-c", "2",
            "-t", "5000", "-a", "300", "-w", "#app", "main", "-p",
        ]);
        let overrides = args.to_overrides();
        assert_eq!(overrides.sitemap_url.as_deref(), Some("sitemap.xml"));
        assert_eq!(overrides.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(overrides.concurrency, Some(2));
        assert_eq!(overrides.timeout, Some(5000));
        assert_eq!(overrides.additional_wait_ms, Some(300));
        assert_eq!(
            overrides.wait_for_selectors,
            Some(vec!["#app".to_string(), "main".to_string()])
        );
        assert_eq!(overrides.pretty_html, Some(true));
    }

    #[test]
    fn test_unset_switches_leave_overrides_empty() {
        let overrides = parse(&["snpsht", "generate"]).to_overrides();
        assert_eq!(overrides, ConfigOverrides::default());
    }

    #[test]
    fn test_negative_switches() {
        let overrides =
            parse(&["snpsht", "generate", "--no-network-idle", "--no-metadata"]).to_overrides();
        assert_eq!(overrides.wait_for_network_idle, Some(false));
        assert_eq!(overrides.include_metadata, Some(false));
    }

    #[test]
    fn test_conflicting_switches_are_rejected() {
        assert!(Cli::try_parse_from(["snpsht", "generate", "-m", "--no-metadata"]).is_err());
    }

    #[test]
    fn test_viewport_flag() {
        let overrides = parse(&["snpsht", "generate", "--viewport", "800x600"]).to_overrides();
        assert_eq!(overrides.viewport, Some(Viewport { width: 800, height: 600 }));
        assert!(Cli::try_parse_from(["snpsht", "generate", "--viewport", "big"]).is_err());
    }
}
