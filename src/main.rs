// src/main.rs
// =============================================================================
// Entry point of the snpsht binary.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the Config: defaults <- --config file <- flags
// 3. Set up logging
// 4. Run the snapshot generation, and always close the browser afterwards
// 5. Print the summary and exit with the proper code
//    (0 = every page saved, 1 = some pages failed, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, GenerateArgs};
use snpsht::logging::init_logging;
use snpsht::{Config, ConfigOverrides, RunSummary, Snapshotter};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every URL was snapshotted
//   Ok(1) = at least one URL failed
//   Err   = fatal error (config, sitemap, browser launch)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => handle_generate(args).await,
    }
}

async fn handle_generate(args: GenerateArgs) -> Result<i32> {
    let config = build_config(&args)?;
    init_logging(config.verbose, config.log_file.as_deref())?;

    let mut snapshotter = Snapshotter::with_chrome(config);
    let result = snapshotter.generate().await;

    // The browser must go away even when generate() failed
    if let Err(e) = snapshotter.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    let summary = result.context("snapshot generation failed")?;
    print_results(&summary, args.json)?;

    if summary.is_ok() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Stacks the optional config file and the flags on top of the defaults
fn build_config(args: &GenerateArgs) -> Result<Config> {
    let file_layer = match &args.config {
        Some(path) => ConfigOverrides::from_toml_file(path)?,
        None => ConfigOverrides::default(),
    };
    let config = Config::from_overrides(file_layer.merge(args.to_overrides()))?;
    Ok(config)
}

fn print_results(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print_table(summary);
    }
    Ok(())
}

fn print_table(summary: &RunSummary) {
    println!("{:<60} {:<10} {:<40}", "URL", "STATUS", "FILE / ERROR");
    println!("{}", "=".repeat(110));

    for result in &summary.results {
        let url_display = if result.url.chars().count() > 57 {
            format!("{}...", result.url.chars().take(57).collect::<String>())
        } else {
            result.url.clone()
        };

        let (status, detail) = if result.success {
            ("✅ OK", result.file_path.display().to_string())
        } else {
            ("❌ FAILED", result.error.clone().unwrap_or_default())
        };

        println!("{:<60} {:<10} {:<40}", url_display, status, detail);
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Saved: {}", summary.success);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   📋 Total: {}", summary.total);
}
