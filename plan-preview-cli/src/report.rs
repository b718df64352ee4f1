//! Report generation
//!
//! Generates TXT and JSON reports from the sink calls recorded for each plan.

use crate::config::OutputFormat;
use anyhow::Result;
use chrono::{DateTime, Utc};
use plan_preview::{PreviewOutcome, SinkCall, TriggerPoints};
use serde::Serialize;
use std::fmt::Write;

/// Summary of how a preview finished
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeSummary {
    Completed { segments: usize, end: f64 },
    Halted { segment: String, at: f64 },
    Aborted { reason: String },
}

impl From<&PreviewOutcome> for OutcomeSummary {
    fn from(outcome: &PreviewOutcome) -> Self {
        match outcome {
            PreviewOutcome::Completed { segments, end } => OutcomeSummary::Completed {
                segments: *segments,
                end: *end,
            },
            PreviewOutcome::Halted { segment, at } => OutcomeSummary::Halted {
                segment: segment.clone(),
                at: *at,
            },
            PreviewOutcome::Aborted(e) => OutcomeSummary::Aborted {
                reason: e.to_string(),
            },
        }
    }
}

/// Everything reported for one plan
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub plan: String,
    pub generated_at: DateTime<Utc>,
    pub outcome: OutcomeSummary,
    pub calls: Vec<SinkCall>,
}

impl PreviewReport {
    pub fn new(plan: impl Into<String>, outcome: &PreviewOutcome, calls: Vec<SinkCall>) -> Self {
        Self {
            plan: plan.into(),
            generated_at: Utc::now(),
            outcome: outcome.into(),
            calls,
        }
    }
}

/// Render reports in the requested format
pub fn render(reports: &[PreviewReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(render_txt(reports)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
    }
}

fn render_txt(reports: &[PreviewReport]) -> String {
    let mut out = String::new();
    for report in reports {
        // Writing to a String cannot fail
        let _ = write_txt(&mut out, report);
    }
    out
}

fn write_txt(out: &mut String, report: &PreviewReport) -> std::fmt::Result {
    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "  Plan: {}", report.plan)?;
    writeln!(out, "  Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "═══════════════════════════════════════════════")?;

    match &report.outcome {
        OutcomeSummary::Completed { segments, end } => {
            writeln!(out, "Status: completed ({} segments, ends at {:.4} min)", segments, end)?
        }
        OutcomeSummary::Halted { segment, at } => {
            writeln!(out, "Status: halted at '{}' ({:.4} min)", segment, at)?
        }
        OutcomeSummary::Aborted { reason } => {
            writeln!(out, "Status: aborted - {}", reason)?;
            writeln!(out)?;
            return Ok(());
        }
    }
    writeln!(out, "───────────────────────────────────────────────")?;

    for call in &report.calls {
        match call {
            SinkCall::MarkSegmentEnd { name, x } => {
                writeln!(out, "{:<24} segment end   x={:.4}", name, x)?
            }
            SinkCall::Flag { name, kind, x } => {
                writeln!(out, "{:<24} {:<13} x={:.4}", name, kind.to_string(), x)?
            }
            SinkCall::PlotTriggerPoints { name, points } => match points {
                TriggerPoints::Single { x, y } => {
                    writeln!(out, "{:<24} trigger       x={:.4} y={:.4}", name, x, y)?
                }
                TriggerPoints::Multiple { xs, ys } => {
                    writeln!(out, "{:<24} trigger x{}", name, xs.len())?;
                    for (x, y) in xs.iter().zip(ys) {
                        writeln!(out, "{:<24}   x={:.4} y={:.4}", "", x, y)?;
                    }
                }
            },
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_preview::{FlagKind, PreviewError};

    fn sample_report() -> PreviewReport {
        let outcome = PreviewOutcome::Completed {
            segments: 2,
            end: 1.5,
        };
        let calls = vec![
            SinkCall::MarkSegmentEnd {
                name: "heat".to_string(),
                x: 1.0,
            },
            SinkCall::PlotTriggerPoints {
                name: "snapshot".to_string(),
                points: TriggerPoints::Multiple {
                    xs: vec![0.5, 1.0],
                    ys: vec![70.0, 120.0],
                },
            },
            SinkCall::Flag {
                name: "hold".to_string(),
                kind: FlagKind::ZeroWidthSegment,
                x: 1.0,
            },
        ];
        PreviewReport::new("anneal", &outcome, calls)
    }

    #[test]
    fn test_txt_report() {
        let text = render(&[sample_report()], OutputFormat::Txt).unwrap();

        assert!(text.contains("Plan: anneal"));
        assert!(text.contains("Status: completed (2 segments"));
        assert!(text.contains("segment end   x=1.0000"));
        assert!(text.contains("trigger x2"));
        assert!(text.contains("x=0.5000 y=70.0000"));
        assert!(text.contains("ZERO_WIDTH_SEGMENT"));
    }

    #[test]
    fn test_txt_report_aborted() {
        let outcome = PreviewOutcome::Aborted(PreviewError::UnresolvedSignal {
            owner: "heat".to_string(),
            signal: "Unknown".to_string(),
        });
        let report = PreviewReport::new("bad", &outcome, Vec::new());
        let text = render(&[report], OutputFormat::Txt).unwrap();

        assert!(text.contains("Status: aborted"));
        assert!(text.contains("Unknown"));
    }

    #[test]
    fn test_json_report() {
        let json = render(&[sample_report()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["plan"], "anneal");
        assert_eq!(value[0]["outcome"]["status"], "completed");
        assert_eq!(value[0]["calls"][0]["call"], "mark_segment_end");
        assert_eq!(value[0]["calls"][1]["xs"][1], 1.0);
        assert_eq!(value[0]["calls"][2]["kind"], "ZERO_WIDTH_SEGMENT");
    }
}
