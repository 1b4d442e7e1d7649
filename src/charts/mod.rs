//! Chart planning and rendering.
//!
//! Every chart goes through the same two steps: [`plan`] turns the dataset
//! into plain geometry (bars, markers, reference lines, value labels) driven by
//! the chart kind's color and label rules, and [`render`] draws a plan onto a
//! PNG. Tests exercise the planning step directly.

pub mod backend;
pub mod fonts;

use std::ops::Range;
use std::path::Path;

use anyhow::Context;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use tracing::{debug, info};

use crate::models::Dataset;
use crate::stats::{is_below_target, SummaryStats};
use backend::LabelSafeBackend;

const DPI: f64 = 300.0;
const FIGURE_INCHES: (f64, f64) = (12.0, 7.0);
const PX_PER_PT: f64 = DPI / 72.0;

pub const SERIES_BLUE: RGBColor = RGBColor(0x34, 0x98, 0xdb);
pub const TARGET_GREEN: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
pub const ALERT_RED: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const HALO_RED: RGBColor = RGBColor(255, 0, 0);

const GROUPED_BAR_WIDTH: f64 = 0.35;
const SINGLE_BAR_WIDTH: f64 = 0.8;

pub fn figure_size() -> (u32, u32) {
    (
        (FIGURE_INCHES.0 * DPI).round() as u32,
        (FIGURE_INCHES.1 * DPI).round() as u32,
    )
}

fn pt(points: f64) -> f64 {
    points * PX_PER_PT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Trend,
    Comparison,
    Gap,
}

/// How the per-quarter bars or markers pick their color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorRule {
    /// Series color, switched to `flagged` when the score is under target.
    FlagBelowTarget { normal: RGBColor, flagged: RGBColor },
    /// Color by the sign of the plotted value.
    BySign {
        non_negative: RGBColor,
        negative: RGBColor,
    },
}

impl ColorRule {
    pub fn pick(&self, value: f64, target: f64) -> (RGBColor, bool) {
        match *self {
            ColorRule::FlagBelowTarget { normal, flagged } => {
                if is_below_target(value, target) {
                    (flagged, true)
                } else {
                    (normal, false)
                }
            }
            ColorRule::BySign {
                non_negative,
                negative,
            } => {
                if value >= 0.0 {
                    (non_negative, false)
                } else {
                    (negative, true)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    Above,
    /// Above positive values, below everything else.
    BySign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    Above,
    Below,
}

impl LabelRule {
    pub fn place(&self, value: f64) -> LabelPlacement {
        match self {
            LabelRule::Above => LabelPlacement::Above,
            LabelRule::BySign if value > 0.0 => LabelPlacement::Above,
            LabelRule::BySign => LabelPlacement::Below,
        }
    }
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Trend, ChartKind::Comparison, ChartKind::Gap];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::Trend => "trend_analysis.png",
            ChartKind::Comparison => "comparison_chart.png",
            ChartKind::Gap => "gap_analysis.png",
        }
    }

    /// Name used in the "saved to" line of the report.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Trend => "Trend analysis",
            ChartKind::Comparison => "Comparison chart",
            ChartKind::Gap => "Gap analysis",
        }
    }

    pub fn color_rule(&self) -> ColorRule {
        match self {
            ChartKind::Trend | ChartKind::Comparison => ColorRule::FlagBelowTarget {
                normal: SERIES_BLUE,
                flagged: ALERT_RED,
            },
            ChartKind::Gap => ColorRule::BySign {
                non_negative: TARGET_GREEN,
                negative: ALERT_RED,
            },
        }
    }

    pub fn label_rule(&self) -> LabelRule {
        match self {
            ChartKind::Trend | ChartKind::Comparison => LabelRule::Above,
            ChartKind::Gap => LabelRule::BySign,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub left: f64,
    pub right: f64,
    pub value: f64,
    pub color: RGBColor,
    pub opacity: f64,
    pub outlined: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub y: f64,
    pub color: RGBColor,
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub placement: LabelPlacement,
    pub offset_pt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Swatch {
    Line { dashed: bool },
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub text: String,
    pub color: RGBColor,
    pub swatch: Swatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub title: String,
    pub subtitle: String,
    pub x_desc: &'static str,
    pub y_desc: String,
    pub categories: Vec<String>,
    pub y_range: Range<f64>,
    pub line: Option<Vec<(f64, f64)>>,
    pub markers: Vec<Marker>,
    pub bars: Vec<Bar>,
    pub reference_lines: Vec<ReferenceLine>,
    pub labels: Vec<ValueLabel>,
    pub legend: Vec<LegendEntry>,
    pub x_grid: bool,
}

pub fn plan(kind: ChartKind, dataset: &Dataset, stats: &SummaryStats) -> ChartPlan {
    let categories = dataset.labels();
    let scores = dataset.scores();
    let target = stats.target;
    let color_rule = kind.color_rule();
    let label_rule = kind.label_rule();

    let mut plan = ChartPlan {
        kind,
        title: String::new(),
        subtitle: String::new(),
        x_desc: "Quarter",
        y_desc: "Satisfaction Score".to_string(),
        categories,
        y_range: 0.0..1.0,
        line: None,
        markers: Vec::new(),
        bars: Vec::new(),
        reference_lines: Vec::new(),
        labels: Vec::new(),
        legend: Vec::new(),
        x_grid: false,
    };

    match kind {
        ChartKind::Trend => {
            plan.title = "Quarterly Patient Satisfaction Trend Analysis".to_string();
            plan.subtitle = format!(
                "Current Average: {:.2} | Target: {}",
                stats.average, target
            );
            plan.x_grid = true;

            let points: Vec<(f64, f64)> = scores
                .iter()
                .enumerate()
                .map(|(idx, score)| (idx as f64, *score))
                .collect();
            for &(x, y) in &points {
                let (_, flagged) = color_rule.pick(y, target);
                plan.markers.push(Marker { x, y, flagged });
                plan.labels.push(ValueLabel {
                    x,
                    y,
                    text: format!("{:.2}", y),
                    placement: label_rule.place(y),
                    offset_pt: 10.0,
                });
            }
            plan.line = Some(points);

            plan.reference_lines.push(ReferenceLine {
                y: target,
                color: TARGET_GREEN,
                dashed: true,
            });
            plan.reference_lines.push(ReferenceLine {
                y: stats.average,
                color: ALERT_RED,
                dashed: true,
            });
            plan.legend = vec![
                LegendEntry {
                    text: "Actual Satisfaction Score".to_string(),
                    color: SERIES_BLUE,
                    swatch: Swatch::Line { dashed: false },
                },
                LegendEntry {
                    text: format!("Industry Target ({})", target),
                    color: TARGET_GREEN,
                    swatch: Swatch::Line { dashed: true },
                },
                LegendEntry {
                    text: format!("Current Average ({:.2})", stats.average),
                    color: ALERT_RED,
                    swatch: Swatch::Line { dashed: true },
                },
            ];

            let mut values = scores.clone();
            values.extend([target, stats.average]);
            plan.y_range = padded_range(&values, false);
        }
        ChartKind::Comparison => {
            plan.title = "Actual vs Target Patient Satisfaction Scores".to_string();
            plan.subtitle = format!("Average: {:.2} | Target: {}", stats.average, target);

            for (idx, score) in scores.iter().enumerate() {
                let center = idx as f64;
                let (color, flagged) = color_rule.pick(*score, target);
                plan.bars.push(Bar {
                    left: center - GROUPED_BAR_WIDTH,
                    right: center,
                    value: *score,
                    color,
                    opacity: 0.8,
                    outlined: false,
                    flagged,
                });
                plan.bars.push(Bar {
                    left: center,
                    right: center + GROUPED_BAR_WIDTH,
                    value: target,
                    color: TARGET_GREEN,
                    opacity: 0.8,
                    outlined: false,
                    flagged: false,
                });
            }
            plan.labels = plan
                .bars
                .iter()
                .map(|bar| ValueLabel {
                    x: (bar.left + bar.right) / 2.0,
                    y: bar.value,
                    text: format!("{:.2}", bar.value),
                    placement: label_rule.place(bar.value),
                    offset_pt: 3.0,
                })
                .collect();
            plan.legend = vec![
                LegendEntry {
                    text: "Actual Score".to_string(),
                    color: SERIES_BLUE,
                    swatch: Swatch::Block,
                },
                LegendEntry {
                    text: "Target Score".to_string(),
                    color: TARGET_GREEN,
                    swatch: Swatch::Block,
                },
            ];

            let mut values = scores.clone();
            values.push(target);
            plan.y_range = padded_range(&values, true);
        }
        ChartKind::Gap => {
            plan.title = "Performance Gap Analysis by Quarter".to_string();
            plan.subtitle = "Negative = Below Target | Positive = Above Target".to_string();
            plan.y_desc = format!("Gap to Target (Score - {})", target);

            let gaps: Vec<f64> = scores.iter().map(|score| score - target).collect();
            for (idx, gap) in gaps.iter().enumerate() {
                let center = idx as f64;
                let (color, flagged) = color_rule.pick(*gap, 0.0);
                plan.bars.push(Bar {
                    left: center - SINGLE_BAR_WIDTH / 2.0,
                    right: center + SINGLE_BAR_WIDTH / 2.0,
                    value: *gap,
                    color,
                    opacity: 0.7,
                    outlined: true,
                    flagged,
                });
                plan.labels.push(ValueLabel {
                    x: center,
                    y: *gap,
                    text: format!("{:.2}", gap),
                    placement: label_rule.place(*gap),
                    offset_pt: 3.0,
                });
            }
            plan.reference_lines.push(ReferenceLine {
                y: 0.0,
                color: BLACK,
                dashed: false,
            });
            plan.y_range = padded_range(&gaps, true);
        }
    }

    plan
}

/// Value range with headroom for labels; bar charts always include zero.
fn padded_range(values: &[f64], include_zero: bool) -> Range<f64> {
    let mut low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if include_zero {
        low = low.min(0.0);
        high = high.max(0.0);
    }
    let span = (high - low).max(1.0);
    (low - span * 0.12)..(high + span * 0.12)
}

fn font(size_pt: f64, bold: bool) -> FontDesc<'static> {
    let style = if bold {
        FontStyle::Bold
    } else {
        FontStyle::Normal
    };
    FontDesc::new(FontFamily::SansSerif, pt(size_pt), style)
}

fn text_style(size_pt: f64, bold: bool) -> TextStyle<'static> {
    font(size_pt, bold).color(&BLACK)
}

fn dashes(x_range: &Range<f64>, y: f64) -> Vec<Vec<(f64, f64)>> {
    let dash = (x_range.end - x_range.start) / 60.0;
    let mut segments = Vec::new();
    let mut x = x_range.start;
    while x < x_range.end {
        let end = (x + dash).min(x_range.end);
        segments.push(vec![(x, y), (end, y)]);
        x += dash * 1.6;
    }
    segments
}

/// Swatch length and the legend column reserved for it, in pixels.
fn legend_swatch() -> (i32, i32) {
    let swatch_len = pt(18.0) as i32;
    (swatch_len, swatch_len + pt(6.0) as i32)
}

/// Renders `plan` as a PNG at `path`, replacing any existing file.
///
/// Without a registered font the legend is left out; every other label is
/// skipped by [`LabelSafeBackend`].
pub fn render(plan: &ChartPlan, path: &Path, font_available: bool) -> anyhow::Result<()> {
    let size = figure_size();
    let root = LabelSafeBackend::new(BitMapBackend::new(path, size)).into_drawing_area();
    draw_plan(root, plan, font_available)
        .with_context(|| format!("failed to render chart {}", path.display()))?;
    info!("Rendered {:?} chart to {} ({}x{})", plan.kind, path.display(), size.0, size.1);
    Ok(())
}

fn draw_plan<DB>(
    root: DrawingArea<DB, Shift>,
    plan: &ChartPlan,
    font_available: bool,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let margin = pt(12.0) as i32;
    let area = root.margin(margin, margin, margin, margin);
    let area = area.titled(&plan.title, text_style(14.0, true))?;
    let area = area.titled(&plan.subtitle, text_style(14.0, true))?;

    let x_range = -0.5..(plan.categories.len() as f64 - 0.5);
    let mut chart = ChartBuilder::on(&area)
        .margin(pt(8.0) as i32)
        .x_label_area_size(pt(40.0) as i32)
        .y_label_area_size(pt(55.0) as i32)
        .build_cartesian_2d(x_range.clone(), plan.y_range.clone())?;

    let categories = plan.categories.clone();
    let category_label = move |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    };
    let value_label = |v: &f64| format!("{:.1}", v);

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(plan.categories.len() * 2 + 1)
        .x_label_formatter(&category_label)
        .y_label_formatter(&value_label)
        .x_desc(plan.x_desc)
        .y_desc(plan.y_desc.as_str())
        .label_style(text_style(10.0, false))
        .axis_desc_style(text_style(12.0, true))
        .bold_line_style(BLACK.mix(0.12))
        .light_line_style(BLACK.mix(0.0));
    if !plan.x_grid {
        mesh.disable_x_mesh();
    }
    mesh.draw()?;

    for line in &plan.reference_lines {
        let style = ShapeStyle::from(&line.color).stroke_width(pt(2.0) as u32);
        if line.dashed {
            chart.draw_series(
                dashes(&x_range, line.y)
                    .into_iter()
                    .map(|segment| PathElement::new(segment, style)),
            )?;
        } else {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x_range.start, line.y), (x_range.end, line.y)],
                ShapeStyle::from(&line.color).stroke_width(pt(1.0) as u32),
            )))?;
        }
    }

    for bar in &plan.bars {
        let upper_left = (bar.left, bar.value.max(0.0));
        let lower_right = (bar.right, bar.value.min(0.0));
        chart.draw_series(std::iter::once(Rectangle::new(
            [upper_left, lower_right],
            bar.color.mix(bar.opacity).filled(),
        )))?;
        if bar.outlined {
            chart.draw_series(std::iter::once(Rectangle::new(
                [upper_left, lower_right],
                BLACK.stroke_width(pt(0.8).max(1.0) as u32),
            )))?;
        }
    }

    if let Some(points) = &plan.line {
        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            ShapeStyle::from(&SERIES_BLUE).stroke_width(pt(2.5) as u32),
        ))?;
    }

    let marker_radius = pt(5.0) as u32;
    let halo_radius = pt(8.0) as u32;
    for marker in &plan.markers {
        if marker.flagged {
            chart.draw_series(std::iter::once(Circle::new(
                (marker.x, marker.y),
                halo_radius,
                HALO_RED.mix(0.3).filled(),
            )))?;
        }
        chart.draw_series(std::iter::once(Circle::new(
            (marker.x, marker.y),
            marker_radius,
            SERIES_BLUE.filled(),
        )))?;
    }

    for label in &plan.labels {
        let offset = pt(label.offset_pt) as i32;
        let (dy, anchor) = match label.placement {
            LabelPlacement::Above => (-offset, VPos::Bottom),
            LabelPlacement::Below => (offset, VPos::Top),
        };
        let style = text_style(9.0, true).pos(Pos::new(HPos::Center, anchor));
        chart.draw_series(std::iter::once(
            EmptyElement::at((label.x, label.y)) + Text::new(label.text.clone(), (0, dy), style),
        ))?;
    }

    if font_available && !plan.legend.is_empty() {
        let (swatch_len, legend_column) = legend_swatch();
        let swatch_half = pt(4.0) as i32;
        let stroke = pt(2.0) as u32;
        for entry in &plan.legend {
            let color = entry.color;
            let annotation = chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(entry.text.clone());
            match entry.swatch {
                Swatch::Line { dashed: false } => {
                    annotation.legend(move |(x, y)| {
                        PathElement::new(
                            vec![(x, y), (x + swatch_len, y)],
                            ShapeStyle::from(&color).stroke_width(stroke),
                        )
                    });
                }
                Swatch::Line { dashed: true } => {
                    annotation.legend(move |(x, y)| {
                        let style = ShapeStyle::from(&color).stroke_width(stroke);
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(0, 0), (swatch_len / 3, 0)], style)
                            + PathElement::new(vec![(swatch_len * 2 / 3, 0), (swatch_len, 0)], style)
                    });
                }
                Swatch::Block => {
                    annotation.legend(move |(x, y)| {
                        Rectangle::new(
                            [(x, y - swatch_half), (x + swatch_len, y + swatch_half)],
                            color.mix(0.8).filled(),
                        )
                    });
                }
            }
        }

        chart
            .configure_series_labels()
            .label_font(font(10.0, false))
            .legend_area_size(legend_column)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }

    root.present()?;
    debug!(
        "Chart {:?} drawn with {} bars ({} flagged) and {} markers",
        plan.kind,
        plan.bars.len(),
        plan.bars.iter().filter(|bar| bar.flagged).count(),
        plan.markers.len()
    );
    Ok(())
}
