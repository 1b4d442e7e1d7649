use serde::Serialize;

use crate::models::{Dataset, QuarterRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub range: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub gap_to_target: f64,
    pub target: f64,
}

impl SummaryStats {
    /// Statistics in report order, keyed by their display names.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("Average Score", self.average),
            ("Minimum Score", self.minimum),
            ("Maximum Score", self.maximum),
            ("Range", self.range),
            ("Standard Deviation", self.std_dev),
            ("Variance", self.variance),
            ("Gap to Target", self.gap_to_target),
        ]
    }
}

pub fn summarize(dataset: &Dataset) -> SummaryStats {
    let scores = dataset.scores();
    let count = scores.len() as f64;
    let average = mean(&scores);
    let minimum = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = scores.iter().map(|s| (s - average).powi(2)).sum::<f64>() / count;

    SummaryStats {
        average,
        minimum,
        maximum,
        range: maximum - minimum,
        std_dev: variance.sqrt(),
        variance,
        gap_to_target: dataset.target() - average,
        target: dataset.target(),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn is_below_target(score: f64, target: f64) -> bool {
    score < target
}

pub fn quarter_rows(dataset: &Dataset) -> Vec<QuarterRow> {
    dataset
        .records()
        .iter()
        .map(|record| QuarterRow {
            quarter: record.quarter.to_string(),
            period_start: record.quarter.start_date(),
            satisfaction_score: record.score,
            target: record.target,
            gap: record.score - record.target,
            below_target: is_below_target(record.score, record.target),
        })
        .collect()
}
