//! Human-readable run report.

use crate::runner::summary::{RunStatus, RunSummary};
use crate::steps::StepStatus;
use std::io::{self, Write};
use std::time::Duration;

/// Format a duration rounded to whole milliseconds.
///
/// Produces `0s`, `250ms`, `1.5s`, `1m5.25s`, `1h0m0s`.
pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = (duration.as_micros() + 500) / 1000;
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{}ms", total_ms);
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h{}m", hours, minutes));
    } else if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }

    out.push_str(&seconds.to_string());
    if millis > 0 {
        let frac = format!("{:03}", millis);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push('s');
    out
}

/// Final line of a run.
pub fn trailer(summary: &RunSummary) -> String {
    format!("Time: {}", format_elapsed(summary.elapsed))
}

/// One status line per step.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    summary
        .results
        .iter()
        .map(|r| match r.status {
            StepStatus::Succeeded => format!(
                "#{} {} {} ({})",
                r.ordinal,
                r.label,
                r.status,
                format_elapsed(r.duration)
            ),
            StepStatus::Failed => format!(
                "#{} {} {}: {}",
                r.ordinal,
                r.label,
                r.status,
                r.error.as_deref().unwrap_or("unknown error")
            ),
            _ => format!("#{} {} {}", r.ordinal, r.label, r.status),
        })
        .collect()
}

/// Process exit code for a run.
pub fn exit_code(summary: &RunSummary) -> i32 {
    match summary.status() {
        RunStatus::Success => 0,
        RunStatus::Failure => 1,
    }
}

/// Write the report that follows the progress lines.
///
/// Verbose mode adds the start timestamp and a per-step summary.
pub fn write_report(summary: &RunSummary, sink: &mut dyn Write, verbose: bool) -> io::Result<()> {
    writeln!(sink)?;

    if verbose {
        writeln!(
            sink,
            "Started: {}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        for line in summary_lines(summary) {
            writeln!(sink, "  {}", line)?;
        }
    }

    if let Some(failed) = summary.failed_step() {
        writeln!(
            sink,
            "Run failed at step #{} ({}); {} step(s) skipped",
            failed.ordinal,
            failed.label,
            summary.count(StepStatus::Skipped)
        )?;
    } else {
        writeln!(
            sink,
            "{} step(s) completed",
            summary.count(StepStatus::Succeeded)
        )?;
    }

    writeln!(sink, "{}", trailer(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataFile;
    use crate::steps::{Step, StepResult};
    use chrono::Utc;
    use serde_json::json;

    fn step(ordinal: usize, path: &str) -> Step {
        Step::from_value(
            ordinal,
            &json!({"kind": "mkdir", "path": path}),
            &DataFile::default(),
        )
        .unwrap()
    }

    fn failed_summary() -> RunSummary {
        RunSummary {
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1500),
            results: vec![
                StepResult::succeeded(&step(1, "a"), Duration::from_millis(3), None),
                StepResult::failed(&step(2, "b"), Duration::from_millis(1), "denied".into()),
                StepResult::skipped(&step(3, "c")),
            ],
        }
    }

    #[test]
    fn format_elapsed_rounds_to_milliseconds() {
        assert_eq!(format_elapsed(Duration::ZERO), "0s");
        assert_eq!(format_elapsed(Duration::from_micros(400)), "0s");
        assert_eq!(format_elapsed(Duration::from_micros(250_600)), "251ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_elapsed(Duration::from_secs(2)), "2s");
        assert_eq!(format_elapsed(Duration::from_millis(65_250)), "1m5.25s");
        assert_eq!(format_elapsed(Duration::from_secs(3600)), "1h0m0s");
    }

    #[test]
    fn trailer_shows_time() {
        assert_eq!(trailer(&failed_summary()), "Time: 1.5s");
    }

    #[test]
    fn summary_lines_follow_ordinal_order() {
        let lines = summary_lines(&failed_summary());
        assert_eq!(lines[0], "#1 mkdir a succeeded (3ms)");
        assert_eq!(lines[1], "#2 mkdir b failed: denied");
        assert_eq!(lines[2], "#3 mkdir c skipped");
    }

    #[test]
    fn exit_code_reflects_status() {
        assert_eq!(exit_code(&failed_summary()), 1);

        let ok = RunSummary {
            results: vec![],
            ..failed_summary()
        };
        assert_eq!(exit_code(&ok), 0);
    }

    #[test]
    fn write_report_names_failed_step() {
        let mut out = Vec::new();
        write_report(&failed_summary(), &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Run failed at step #2 (mkdir b); 1 step(s) skipped"));
        assert!(text.ends_with("Time: 1.5s\n"));
        assert!(!text.contains("Started:"));
    }

    #[test]
    fn verbose_report_lists_steps() {
        let mut out = Vec::new();
        write_report(&failed_summary(), &mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Started: "));
        assert!(text.contains("  #3 mkdir c skipped"));
    }
}
