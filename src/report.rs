//! Human readable rendering of secret scan results.
//!
//! The scanner hands over structured [`SecretFinding`] records and the time
//! the scan took; this module only turns them into output lines for the push
//! hook response. Blank lines separate the blocks for readability.

use std::time::Duration;

use colored::Colorize;

use crate::models::SecretFinding;

pub fn render_scan_report(
    findings: &[SecretFinding],
    multiple_refs: bool,
    duration: Duration,
) -> Vec<String> {
    let elapsed = format_duration(duration);

    if findings.is_empty() {
        return vec![
            format!("{} in {}", "No secrets found".bright_green().bold(), elapsed),
            String::new(),
            String::new(),
        ];
    }

    let noun = secret_or_secrets(findings.len());
    let mut lines = vec![
        format!("Push contains {}:", noun).bright_white().underline().to_string(),
        String::new(),
    ];

    for finding in findings {
        let mut header = format!("{} in {}:{}", finding.rule_id, finding.file, finding.start_line);
        if finding.start_line != finding.end_line {
            header.push_str(&format!("-{}", finding.end_line));
        }
        if multiple_refs {
            header.push_str(&format!(" [{}]", finding.ref_name));
        }

        lines.push(format!("  {}", header));
        lines.push(format!("      Secret:   {}", finding.secret));
        lines.push(format!("      Commit:   {}", finding.commit));
        lines.push(format!("      Details:  {}", finding.description));
        lines.push(String::new());
    }

    lines.push(format!(
        "{} in {}",
        format!("{} {} found", findings.len(), noun).bright_red().bold(),
        elapsed
    ));
    lines.push(String::new());
    lines.push(String::new());
    lines
}

fn secret_or_secrets(count: usize) -> &'static str {
    if count > 1 { "secrets" } else { "secret" }
}

/// Rounds a duration to a precision that suits its magnitude: sub-millisecond
/// values are kept as is, under a second to milliseconds, under a minute to
/// tenths of a second, anything longer to whole seconds.
pub fn format_duration(d: Duration) -> String {
    if d <= Duration::from_millis(1) {
        return format!("{:?}", d);
    }

    let unit_ms: u128 = if d < Duration::from_secs(1) {
        1
    } else if d < Duration::from_secs(60) {
        100
    } else {
        1000
    };
    let micros = d.as_micros();
    let unit_us = unit_ms * 1000;
    let total_ms = (micros + unit_us / 2) / unit_us * unit_ms;

    if total_ms < 1000 {
        return format!("{}ms", total_ms);
    }

    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = format_seconds(total_ms % 60_000);

    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, m) => format!("{}m{}s", m, seconds),
        (h, m) => format!("{}h{}m{}s", h, m, seconds),
    }
}

fn format_seconds(ms: u128) -> String {
    let whole = ms / 1000;
    let fraction = ms % 1000;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:03}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
