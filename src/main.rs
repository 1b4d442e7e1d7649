use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod analysis;
mod charts;
mod export;
mod models;
mod report;
mod stats;

#[derive(Parser, Debug)]
#[command(name = "patient-satisfaction-report")]
#[command(about = "Quarterly patient satisfaction analysis with charts and recommendations", long_about = None)]
struct Cli {
    /// Directory for chart images and exports (defaults to the working directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// TrueType/OpenType font for chart text (common system fonts are tried otherwise)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Also write the quarterly table as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Also write the summary statistics as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }
    let font = charts::fonts::install(cli.font.as_deref())?;

    let options = analysis::RunOptions {
        out_dir: cli.out_dir,
        export_csv: cli.export_csv,
        stats_json: cli.stats_json,
        font_available: font.is_some(),
    };
    let dataset = models::Dataset::patient_satisfaction_2024();
    let stdout = io::stdout();
    let charts = analysis::run_full_analysis(&dataset, &options, &mut stdout.lock())?;
    info!("Report finished with {} charts", charts.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn runs_with_no_arguments() {
        let cli = Cli::try_parse_from(["patient-satisfaction-report"]).unwrap();
        assert!(cli.out_dir.is_none());
        assert!(cli.export_csv.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn accepts_optional_outputs() {
        let cli = Cli::try_parse_from([
            "patient-satisfaction-report",
            "--out-dir",
            "reports",
            "--stats-json",
            "stats.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.out_dir, Some(PathBuf::from("reports")));
        assert_eq!(cli.stats_json, Some(PathBuf::from("stats.json")));
        assert!(cli.verbose);
    }
}
