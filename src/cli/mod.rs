//! # CLI Module
//!
//! Command-line interface for the near-duplicate scan engine.
//!
//! ## Usage
//! ```bash
//! # Scan a picker selection exported as JSON
//! photo-prune scan selection.json
//!
//! # Read the request from stdin, emit machine-readable output
//! cat selection.json | photo-prune scan - --output json
//!
//! # Override the download host allowlist
//! photo-prune scan selection.json --allowed-hosts photos.google.com
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use photo_prune::config::{split_host_list, ScanSettings};
use photo_prune::core::normalize::{normalize_request, ScanRequest};
use photo_prune::core::scan::{run_scan_with_events, ScanResult};
use photo_prune::core::{DownloadManager, GroupResult};
use photo_prune::events::{Event, EventChannel, EventReceiver, ScanEvent};
use photo_prune::{Result, ScanEngineError};
use std::io::Read;
use std::path::PathBuf;
use std::thread;

/// Photo Prune - explainable near-duplicate detection for photo selections
#[derive(Parser, Debug)]
#[command(name = "photo-prune")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a selection request JSON for duplicates
    Scan {
        /// Path to the request JSON ("-" reads stdin)
        request: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Override the allowed download hosts (comma separated)
        #[arg(long)]
        allowed_hosts: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            request,
            output,
            allowed_hosts,
            verbose,
        } => run_scan_command(request, output, allowed_hosts, verbose),
    }
}

fn run_scan_command(
    request_path: PathBuf,
    output: OutputFormat,
    allowed_hosts: Option<String>,
    verbose: bool,
) -> Result<()> {
    init_tracing(verbose);

    let mut settings = ScanSettings::from_env();
    if let Some(hosts) = allowed_hosts {
        settings.scan_allowed_download_hosts = split_host_list(&hosts);
    }

    let request = read_request(&request_path)?;
    let items = normalize_request(&request)?;
    enforce_scan_policy(&settings, items.len(), request.consent_confirmed)?;

    let downloads = DownloadManager::over_https(&settings)?;
    let (sender, receiver) = EventChannel::new();
    let show_progress = matches!(output, OutputFormat::Pretty);
    let listener = thread::spawn(move || listen_for_events(receiver, show_progress));

    let result = run_scan_with_events(items, &settings, downloads, &sender);
    drop(sender);
    let _ = listener.join();
    let result = result?;

    match output {
        OutputFormat::Pretty => print_pretty(&result),
        OutputFormat::Json => print_json(&result)?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "photo_prune=debug" } else { "photo_prune=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    // A second init in the same process is fine to ignore
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_request(path: &PathBuf) -> Result<ScanRequest> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| ScanEngineError::Config(format!("failed to read stdin: {e}")))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            ScanEngineError::Config(format!("failed to read {}: {e}", path.display()))
        })?
    };
    serde_json::from_str(&raw)
        .map_err(|e| ScanEngineError::Config(format!("invalid request JSON: {e}")))
}

/// Caller-side policy: size limits and consent gating before the engine runs
fn enforce_scan_policy(
    settings: &ScanSettings,
    item_count: usize,
    consent_confirmed: bool,
) -> Result<()> {
    if settings.enforce_scan_limits() && item_count > settings.scan_max_photos {
        return Err(ScanEngineError::Config(format!(
            "selection has {item_count} photos, above the limit of {}",
            settings.scan_max_photos
        )));
    }
    if item_count > settings.scan_consent_threshold && !consent_confirmed {
        return Err(ScanEngineError::Config(format!(
            "selections above {} photos require consentConfirmed",
            settings.scan_consent_threshold
        )));
    }
    Ok(())
}

fn listen_for_events(receiver: EventReceiver, show_progress: bool) {
    if !show_progress {
        for _ in receiver.iter() {}
        return;
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    for event in receiver.iter() {
        match event {
            Event::Scan(ScanEvent::Started { total_items, .. }) => {
                bar.set_message(format!("scanning {total_items} photos"));
            }
            Event::Scan(ScanEvent::StageStarted { stage }) => {
                bar.set_message(stage.to_string());
            }
            Event::Scan(ScanEvent::HashProgress {
                stage,
                completed,
                total,
            }) => {
                bar.set_message(format!("{stage} {completed}/{total}"));
                bar.tick();
            }
            Event::Scan(ScanEvent::StageCompleted { stage, elapsed_ms }) => {
                bar.println(format!("  {} {stage} ({elapsed_ms} ms)", style("✓").green()));
            }
            Event::Scan(ScanEvent::Completed { groups_found }) => {
                bar.finish_and_clear();
                eprintln!("  {} {groups_found} group(s) found", style("✓").green());
            }
        }
    }
}

fn print_json(result: &ScanResult) -> Result<()> {
    let rendered = serde_json::to_string_pretty(result)
        .map_err(|e| ScanEngineError::Config(format!("failed to render result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn print_pretty(result: &ScanResult) {
    let counts = &result.stage_metrics.counts;
    println!();
    println!(
        "{} {}",
        style("Scan").bold(),
        style(&result.run_id).dim()
    );
    println!(
        "  {} photos in, {} candidate set(s) covering {} item(s)",
        counts.selected_images, counts.candidate_sets, counts.candidate_items
    );
    println!(
        "  {} download(s), {} byte hash(es), {} perceptual hash(es), {} comparison(s)",
        counts.downloads_performed,
        counts.byte_hashes,
        counts.perceptual_hashes,
        counts.comparisons_executed
    );
    println!(
        "  estimated cost: ${:.6}",
        result.cost_estimate.total_cost
    );

    print_category(style("Exact duplicates").red().bold().to_string(), &result.groups_exact);
    print_category(
        style("Very similar").yellow().bold().to_string(),
        &result.groups_very_similar,
    );
    print_category(
        style("Possibly similar").cyan().bold().to_string(),
        &result.groups_possibly_similar,
    );

    if result.total_groups() == 0 {
        println!();
        println!("{}", style("No duplicates found.").green());
    }
}

fn print_category(heading: String, groups: &[GroupResult]) {
    if groups.is_empty() {
        return;
    }
    println!();
    println!("{heading} ({} group(s))", groups.len());
    for group in groups {
        println!("  {} {}", style("▸").bold(), style(&group.group_id).dim());
        println!("    {}", group.explanation);
        for item in &group.items {
            let name = item.filename.as_deref().unwrap_or("(no filename)");
            println!("    - {} {}", item.id, style(name).dim());
        }
        let pair = &group.representative_pair;
        println!(
            "    earliest {} · latest {} · +{} more",
            pair.earliest.id, pair.latest.id, group.more_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_allows_small_selections_without_consent() {
        let settings = ScanSettings::default();
        assert!(enforce_scan_policy(&settings, 10, false).is_ok());
    }

    #[test]
    fn policy_requires_consent_above_threshold() {
        let settings = ScanSettings::default();

        assert!(enforce_scan_policy(&settings, 201, false).is_err());
        assert!(enforce_scan_policy(&settings, 201, true).is_ok());
    }

    #[test]
    fn policy_enforces_max_photos_only_in_prod() {
        let mut settings = ScanSettings::default();

        assert!(enforce_scan_policy(&settings, 300, true).is_ok());

        settings.environment = "prod".to_string();
        assert!(enforce_scan_policy(&settings, 300, true).is_err());
    }

    #[test]
    fn cli_parses_scan_subcommand() {
        let cli = Cli::try_parse_from(["photo-prune", "scan", "request.json", "--output", "json"])
            .unwrap();
        match cli.command {
            Commands::Scan { request, output, .. } => {
                assert_eq!(request, PathBuf::from("request.json"));
                assert!(matches!(output, OutputFormat::Json));
            }
        }
    }
}
