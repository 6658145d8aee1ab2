//! Formatting utilities for sizes, durations, and build summaries.

use console::Term;
use owo_colors::{OwoColorize, Stream::Stderr};
use std::time::Duration;

/// Format file size in human-readable format.
///
/// ```
/// use sprout_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use sprout_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the per-stage summary table to stderr.
///
/// Entries are `(stage, bytes, duration)`.
pub fn print_build_summary(entries: &[(String, u64, Duration)]) {
    if entries.is_empty() {
        return;
    }

    let width = (Term::stderr().size().1 as usize).clamp(20, 80);
    let name_width = entries.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);

    eprintln!(
        "\n{}",
        "Build Summary".if_supports_color(Stderr, |t| t.bold())
    );
    eprintln!("{}", "─".repeat(width));

    for (name, size, duration) in entries {
        eprintln!(
            "  {:<name_width$}  {:>10}  {}",
            name,
            format_size(*size),
            format!("({})", format_duration(*duration)).if_supports_color(Stderr, |t| t.dimmed()),
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total_size: u64 = entries.iter().map(|(_, s, _)| s).sum();
    let total_time: Duration = entries.iter().map(|(_, _, d)| d).sum();
    eprintln!(
        "  Total: {} in {}",
        format_size(total_size).if_supports_color(Stderr, |t| t.green()),
        format_duration(total_time).if_supports_color(Stderr, |t| t.green())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_print_build_summary() {
        print_build_summary(&[
            ("client".to_string(), 15_234, Duration::from_millis(450)),
            ("server".to_string(), 234_567, Duration::from_millis(1200)),
        ]);
        print_build_summary(&[]);
    }
}
