use std::fmt::Write;
use std::path::PathBuf;

use crate::models::{Dataset, CONTACT};
use crate::stats::SummaryStats;

const RULE_WIDTH: usize = 60;

pub const PRIMARY_SOLUTION: &str = "🎯 PRIMARY SOLUTION: Improve service quality and wait times";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH PRIORITY",
            Priority::Medium => "MEDIUM PRIORITY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: &'static str,
    pub horizon: &'static str,
    pub actions: Vec<String>,
    pub expected_impact: String,
}

impl Recommendation {
    fn render(&self, rank: usize) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{}. {} - {} ({})",
            rank,
            self.priority.label(),
            self.title,
            self.horizon
        );
        for action in &self.actions {
            let _ = writeln!(output, "   • {}", action);
        }
        let _ = write!(output, "   • Expected Impact: {}", self.expected_impact);
        output
    }
}

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n{title}\n{rule}\n")
}

pub fn preamble(stats: &SummaryStats) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Average Patient Satisfaction Score: {:.2}",
        stats.average
    );
    let _ = writeln!(output, "Industry Target: {}", stats.target);
    let _ = writeln!(output, "Gap to Target: {:.2}", stats.gap_to_target);
    output
}

pub fn analysis_header() -> String {
    banner(&format!(
        "HEALTHCARE PERFORMANCE ANALYSIS\nContact: {}",
        CONTACT
    ))
}

pub fn summary_table(stats: &SummaryStats) -> String {
    let mut output = banner("SUMMARY STATISTICS");
    for (name, value) in stats.entries() {
        let _ = writeln!(output, "{name:.<40} {value:.2}");
    }
    output
}

pub fn insights(dataset: &Dataset, stats: &SummaryStats) -> Vec<String> {
    let lowest = dataset.lowest();
    let highest = dataset.highest();

    vec![
        format!(
            "1. CURRENT PERFORMANCE: Average satisfaction score is {:.2}, \
             which is {:.2} points below the industry target of {}.",
            stats.average, stats.gap_to_target, stats.target
        ),
        format!(
            "2. EXTREME VOLATILITY: Scores range from {:.2} to {:.2}, \
             indicating highly inconsistent service delivery across quarters.",
            stats.minimum, stats.maximum
        ),
        format!(
            "3. CRITICAL CONCERN: {} recorded the lowest satisfaction score ({}), \
             suggesting severe service failures and potential crisis situations.",
            lowest.quarter, lowest.score
        ),
        format!(
            "4. PROVEN CAPABILITY: {} achieved the highest score of {}, \
             demonstrating that the organization CAN exceed targets when properly managed.",
            highest.quarter, highest.score
        ),
        "5. BUSINESS IMPACT: Below-target performance risks patient retention, \
         regulatory compliance, and revenue generation."
            .to_string(),
    ]
}

pub fn recommendations(dataset: &Dataset, stats: &SummaryStats) -> Vec<Recommendation> {
    let best = dataset.highest();

    vec![
        Recommendation {
            priority: Priority::Critical,
            title: "REDUCE WAIT TIMES",
            horizon: "0-3 months",
            actions: vec![
                "Implement triage optimization system".to_string(),
                "Expand urgent care capacity".to_string(),
                "Target: 30% reduction in average wait time".to_string(),
            ],
            expected_impact: "+0.3 to +0.5 score improvement".to_string(),
        },
        Recommendation {
            priority: Priority::Critical,
            title: "ENHANCE SERVICE QUALITY",
            horizon: "0-6 months",
            actions: vec![
                "Launch comprehensive staff training program".to_string(),
                "Focus on patient communication and bedside manner".to_string(),
                "Implement quality assurance protocols".to_string(),
            ],
            expected_impact: "+0.2 to +0.4 score improvement".to_string(),
        },
        Recommendation {
            priority: Priority::High,
            title: "STANDARDIZE CARE DELIVERY",
            horizon: "3-6 months",
            actions: vec![
                "Develop consistent care protocols across departments".to_string(),
                "Reduce performance volatility".to_string(),
                format!("Implement best practices from {} success", best.quarter),
            ],
            expected_impact: format!("Sustained performance above {}", stats.target),
        },
        Recommendation {
            priority: Priority::Medium,
            title: "REAL-TIME FEEDBACK",
            horizon: "1-3 months",
            actions: vec![
                "Deploy digital feedback collection at point-of-care".to_string(),
                "Enable immediate issue identification and resolution".to_string(),
                "Create accountability dashboards".to_string(),
            ],
            expected_impact: "Faster problem detection and resolution".to_string(),
        },
    ]
}

pub fn expected_outcomes() -> Vec<&'static str> {
    vec![
        "• 3 Months:  Score improvement to 4.2-4.3",
        "• 6 Months:  Achieve target of 4.5+",
        "• 12 Months: Sustained performance at 4.7+",
    ]
}

pub fn insights_section(dataset: &Dataset, stats: &SummaryStats) -> String {
    let mut output = banner("KEY INSIGHTS & FINDINGS");
    let blocks = insights(dataset, stats);
    let _ = writeln!(output, "{}", blocks.join("\n\n"));
    output
}

pub fn recommendations_section(dataset: &Dataset, stats: &SummaryStats) -> String {
    let mut output = banner("STRATEGIC RECOMMENDATIONS");
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", PRIMARY_SOLUTION);
    for (idx, recommendation) in recommendations(dataset, stats).iter().enumerate() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", recommendation.render(idx + 1));
    }

    output.push_str(&banner("EXPECTED OUTCOMES"));
    for outcome in expected_outcomes() {
        let _ = writeln!(output, "{}", outcome);
    }
    output
}

pub fn completion_banner() -> String {
    banner("Analysis complete! All visualizations have been saved.")
}

pub fn closing_notes(charts: &[PathBuf]) -> String {
    let mut output = String::new();
    let _ = writeln!(output);
    let _ = writeln!(output, "✅ Analysis completed successfully!");
    let _ = writeln!(output, "📊 Review the generated visualizations:");
    for chart in charts {
        let _ = writeln!(output, "   - {}", chart.display());
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "📧 Contact: {}", CONTACT);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::summarize;

    fn fixture() -> (Dataset, SummaryStats) {
        let dataset = Dataset::patient_satisfaction_2024();
        let stats = summarize(&dataset);
        (dataset, stats)
    }

    #[test]
    fn summary_table_pads_names_with_dots() {
        let (_, stats) = fixture();
        let table = summary_table(&stats);
        let average_line = format!("Average Score{} 4.03", ".".repeat(40 - "Average Score".len()));
        assert!(table.contains(&average_line));
        assert!(table.contains("Standard Deviation"));
        assert!(table.lines().any(|l| l.starts_with("Gap to Target.") && l.ends_with(" 0.47")));
        assert!(table.lines().any(|l| l.starts_with("Range.") && l.ends_with(" 8.68")));
    }

    #[test]
    fn preamble_reports_average_target_and_gap() {
        let (_, stats) = fixture();
        let text = preamble(&stats);
        assert_eq!(
            text,
            "Average Patient Satisfaction Score: 4.03\nIndustry Target: 4.5\nGap to Target: 0.47\n"
        );
    }

    #[test]
    fn insights_always_have_five_blocks() {
        let (dataset, stats) = fixture();
        let blocks = insights(&dataset, &stats);
        assert_eq!(blocks.len(), 5);
        assert!(blocks[0].contains("4.03"));
        assert!(blocks[0].contains("0.47 points below the industry target of 4.5"));
        assert!(blocks[1].contains("-0.48 to 8.20"));
        assert!(blocks[2].contains("Q2 2024") && blocks[2].contains("(-0.48)"));
        assert!(blocks[3].contains("Q3 2024") && blocks[3].contains("8.2"));

        let other = Dataset::new(2025, [9.0, 9.5, 9.9, 9.1], 4.5);
        let other_stats = summarize(&other);
        assert_eq!(insights(&other, &other_stats).len(), 5);
    }

    #[test]
    fn extreme_quarter_insights_do_not_assume_a_negative_score() {
        let dataset = Dataset::new(2025, [9.0, 9.5, 9.9, 9.1], 4.5);
        let blocks = insights(&dataset, &summarize(&dataset));
        assert!(blocks.iter().all(|block| !block.contains("negative")));
        assert!(blocks[2].contains("Q1 2025 recorded the lowest satisfaction score (9)"));
        assert!(blocks[3].contains("Q3 2025 achieved the highest score of 9.9"));
    }

    #[test]
    fn recommendations_always_have_four_priorities() {
        let (dataset, stats) = fixture();
        let recs = recommendations(&dataset, &stats);
        assert_eq!(recs.len(), 4);
        let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![
                Priority::Critical,
                Priority::Critical,
                Priority::High,
                Priority::Medium
            ]
        );
        assert!(recs.iter().all(|r| r.actions.len() == 3));
        assert_eq!(recs[2].expected_impact, "Sustained performance above 4.5");

        let other = Dataset::new(2025, [1.0, 1.0, 1.0, 1.0], 4.5);
        assert_eq!(recommendations(&other, &summarize(&other)).len(), 4);
    }

    #[test]
    fn recommendation_block_renders_heading_and_bullets() {
        let (dataset, stats) = fixture();
        let rendered = recommendations(&dataset, &stats)[0].render(1);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "1. CRITICAL - REDUCE WAIT TIMES (0-3 months)");
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[4],
            "   • Expected Impact: +0.3 to +0.5 score improvement"
        );
    }

    #[test]
    fn recommendations_section_ends_with_single_outcomes_footer() {
        let (dataset, stats) = fixture();
        let section = recommendations_section(&dataset, &stats);
        assert_eq!(section.matches("EXPECTED OUTCOMES").count(), 1);
        assert!(section.contains(PRIMARY_SOLUTION));
        assert!(section.trim_end().ends_with("Sustained performance at 4.7+"));
        assert_eq!(expected_outcomes().len(), 3);
    }

    #[test]
    fn banner_wraps_title_in_rules() {
        let text = banner("TITLE");
        let rule = "=".repeat(60);
        assert_eq!(text, format!("\n{rule}\nTITLE\n{rule}\n"));
    }

    #[test]
    fn closing_notes_list_each_chart() {
        let charts = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let notes = closing_notes(&charts);
        assert!(notes.contains("   - a.png\n   - b.png\n"));
        assert!(notes.contains(CONTACT));
    }
}
