use std::path::Path;

use anyhow::Context;

use crate::models::QuarterRow;
use crate::stats::SummaryStats;

pub fn write_quarter_csv(path: &Path, rows: &[QuarterRow]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn write_stats_json(path: &Path, stats: &SummaryStats) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;
    use crate::stats::{quarter_rows, summarize};

    #[test]
    fn csv_export_has_header_and_one_row_per_quarter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarters.csv");
        let rows = quarter_rows(&Dataset::patient_satisfaction_2024());

        let written = write_quarter_csv(&path, &rows).unwrap();
        assert_eq!(written, 4);

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines[0],
            "quarter,period_start,satisfaction_score,target,gap,below_target"
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("Q2 2024,2024-04-01,-0.48,4.5,"));
        assert!(lines[2].ends_with(",true"));
        assert!(lines[3].ends_with(",false"));
    }

    #[test]
    fn json_export_round_trips_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stats = summarize(&Dataset::patient_satisfaction_2024());

        write_stats_json(&path, &stats).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["target"], 4.5);
        assert_eq!(value["minimum"], -0.48);
        assert!((value["average"].as_f64().unwrap() - 4.0275).abs() < 1e-9);
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("quarters.csv");
        let rows = quarter_rows(&Dataset::patient_satisfaction_2024());
        assert!(write_quarter_csv(&path, &rows).is_err());
    }
}
