use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::charts::{self, ChartKind};
use crate::export;
use crate::models::Dataset;
use crate::report;
use crate::stats::{self, SummaryStats};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub out_dir: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    pub stats_json: Option<PathBuf>,
    /// A chart font was registered, so legends can be laid out.
    pub font_available: bool,
}

/// Chart files land next to each other in `out_dir`, or under their bare
/// names in the working directory.
pub fn output_path(out_dir: Option<&Path>, file_name: &str) -> PathBuf {
    match out_dir {
        Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(".") => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Runs the whole report: statistics, the three charts, narrative and closing
/// notes, writing the text report to `out`. Returns the chart paths.
pub fn run_full_analysis<W: Write>(
    dataset: &Dataset,
    options: &RunOptions,
    out: &mut W,
) -> anyhow::Result<Vec<PathBuf>> {
    let summary = stats::summarize(dataset);

    write!(out, "{}", report::preamble(&summary))?;
    write!(out, "{}", report::analysis_header())?;
    write!(out, "{}", report::summary_table(&summary))?;

    writeln!(out)?;
    writeln!(out, "Generating visualizations...")?;
    let charts = render_charts(dataset, &summary, options, out)?;

    write_exports(dataset, &summary, options, out)?;

    write!(out, "{}", report::insights_section(dataset, &summary))?;
    write!(out, "{}", report::recommendations_section(dataset, &summary))?;
    write!(out, "{}", report::completion_banner())?;
    write!(out, "{}", report::closing_notes(&charts))?;
    out.flush()?;

    Ok(charts)
}

fn render_charts<W: Write>(
    dataset: &Dataset,
    summary: &SummaryStats,
    options: &RunOptions,
    out: &mut W,
) -> anyhow::Result<Vec<PathBuf>> {
    let out_dir = options.out_dir.as_deref();
    let mut written = Vec::with_capacity(ChartKind::ALL.len());
    for (idx, kind) in ChartKind::ALL.into_iter().enumerate() {
        let path = output_path(out_dir, kind.file_name());
        let plan = charts::plan(kind, dataset, summary);
        charts::render(&plan, &path, options.font_available)?;

        if idx == 0 {
            writeln!(out)?;
        }
        writeln!(out, "{} saved to: {}", kind.display_name(), path.display())?;
        written.push(path);
    }
    Ok(written)
}

fn write_exports<W: Write>(
    dataset: &Dataset,
    summary: &SummaryStats,
    options: &RunOptions,
    out: &mut W,
) -> anyhow::Result<()> {
    let out_dir = options.out_dir.as_deref();

    if let Some(csv_path) = &options.export_csv {
        let path = resolve(out_dir, csv_path);
        let rows = export::write_quarter_csv(&path, &stats::quarter_rows(dataset))?;
        info!("Exported {} quarterly rows to {}", rows, path.display());
        writeln!(out, "Quarterly data exported to: {}", path.display())?;
    }

    if let Some(json_path) = &options.stats_json {
        let path = resolve(out_dir, json_path);
        export::write_stats_json(&path, summary)?;
        info!("Exported summary statistics to {}", path.display());
        writeln!(out, "Summary statistics exported to: {}", path.display())?;
    }

    Ok(())
}

fn resolve(out_dir: Option<&Path>, path: &Path) -> PathBuf {
    if path.is_absolute() || path.components().count() > 1 {
        path.to_path_buf()
    } else {
        output_path(out_dir, &path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_into(options: &RunOptions) -> (String, Vec<PathBuf>) {
        let mut buffer = Vec::new();
        let charts = run_full_analysis(&Dataset::patient_satisfaction_2024(), options, &mut buffer)
            .unwrap();
        (String::from_utf8(buffer).unwrap(), charts)
    }

    #[test]
    fn bare_names_without_out_dir() {
        assert_eq!(output_path(None, "a.png"), PathBuf::from("a.png"));
        assert_eq!(output_path(Some(Path::new(".")), "a.png"), PathBuf::from("a.png"));
        assert_eq!(
            output_path(Some(Path::new("out")), "a.png"),
            Path::new("out").join("a.png")
        );
    }

    #[test]
    fn full_run_writes_every_chart_and_section() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            out_dir: Some(dir.path().to_path_buf()),
            ..RunOptions::default()
        };

        let (text, charts) = run_into(&options);

        assert_eq!(charts.len(), 3);
        for chart in &charts {
            assert!(std::fs::metadata(chart).unwrap().len() > 0);
        }

        let order = [
            "Average Patient Satisfaction Score: 4.03",
            "HEALTHCARE PERFORMANCE ANALYSIS",
            "SUMMARY STATISTICS",
            "Generating visualizations...",
            "Trend analysis saved to:",
            "Comparison chart saved to:",
            "Gap analysis saved to:",
            "KEY INSIGHTS & FINDINGS",
            "STRATEGIC RECOMMENDATIONS",
            "EXPECTED OUTCOMES",
            "Analysis complete! All visualizations have been saved.",
            "Analysis completed successfully!",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn repeated_runs_produce_identical_text() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            out_dir: Some(dir.path().to_path_buf()),
            ..RunOptions::default()
        };

        let (first, _) = run_into(&options);
        let (second, _) = run_into(&options);
        assert_eq!(first, second);
    }

    #[test]
    fn exports_are_written_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            out_dir: Some(dir.path().to_path_buf()),
            export_csv: Some(PathBuf::from("quarters.csv")),
            stats_json: Some(PathBuf::from("stats.json")),
            ..RunOptions::default()
        };

        let (text, _) = run_into(&options);

        assert!(dir.path().join("quarters.csv").is_file());
        assert!(dir.path().join("stats.json").is_file());
        assert!(text.contains("Quarterly data exported to:"));
        assert!(text.contains("Summary statistics exported to:"));
    }

    #[test]
    fn unwritable_out_dir_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            out_dir: Some(dir.path().join("does-not-exist")),
            ..RunOptions::default()
        };
        let mut buffer = Vec::new();
        let result = run_full_analysis(&Dataset::patient_satisfaction_2024(), &options, &mut buffer);
        assert!(result.is_err());
    }
}
