use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

pub const INDUSTRY_TARGET: f64 = 4.5;
pub const CONTACT: &str = "24f2006326@ds.study.iitm.ac.in";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub number: u32,
}

impl Quarter {
    pub fn new(year: i32, number: u32) -> Self {
        Self { year, number }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        let month = self.number.checked_sub(1)? * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.number, self.year)
    }
}

#[derive(Debug, Clone)]
pub struct QuarterlyRecord {
    pub quarter: Quarter,
    pub score: f64,
    pub target: f64,
}

/// The four quarters the report covers, in chronological order, all measured
/// against the same target.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: [QuarterlyRecord; 4],
}

impl Dataset {
    pub fn new(year: i32, scores: [f64; 4], target: f64) -> Self {
        let mut number = 0;
        let records = scores.map(|score| {
            number += 1;
            QuarterlyRecord {
                quarter: Quarter::new(year, number),
                score,
                target,
            }
        });
        Self { records }
    }

    pub fn patient_satisfaction_2024() -> Self {
        Self::new(2024, [2.32, -0.48, 8.2, 6.07], INDUSTRY_TARGET)
    }

    pub fn records(&self) -> &[QuarterlyRecord] {
        &self.records
    }

    pub fn target(&self) -> f64 {
        self.records[0].target
    }

    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(|r| r.quarter.to_string()).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.score).collect()
    }

    pub fn lowest(&self) -> &QuarterlyRecord {
        self.records
            .iter()
            .fold(&self.records[0], |low, r| if r.score < low.score { r } else { low })
    }

    pub fn highest(&self) -> &QuarterlyRecord {
        self.records
            .iter()
            .fold(&self.records[0], |high, r| if r.score > high.score { r } else { high })
    }
}

/// One row of the tabular export.
#[derive(Debug, Clone, Serialize)]
pub struct QuarterRow {
    pub quarter: String,
    pub period_start: Option<NaiveDate>,
    pub satisfaction_score: f64,
    pub target: f64,
    pub gap: f64,
    pub below_target: bool,
}
