//! Display formatting for trace analysis output.

use super::analyze::{TraceStats, by_total_duration, slowest};
use super::state::StatsMap;
use std::fmt::Write as _;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const NAME_WIDTH: usize = 50;
const SLOW_LINE_WIDTH: usize = 100;

/// How much of each section to show.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Rows in the slowest-operations list.
    pub top: usize,
    /// Rows in each stats table.
    pub limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { top: 10, limit: 20 }
    }
}

/// Render the complete analysis to a string.
pub fn render(stats: &TraceStats, options: &RenderOptions) -> String {
    let mut out = String::new();

    render_header(&mut out);
    render_slowest(&mut out, stats, options.top);
    render_table(&mut out, "COMMAND STATS", &stats.command_stats, options.limit);
    render_table(&mut out, "INTERNAL STATS", &stats.internal_stats, options.limit);

    out
}

fn render_header(out: &mut String) {
    out.push_str("============================================================\n");
    out.push_str("              TRACE PERFORMANCE ANALYSIS\n");
    out.push_str("============================================================\n");
}

fn render_slowest(out: &mut String, stats: &TraceStats, top: usize) {
    let title = format!("TOP {top} SLOWEST OPERATIONS");
    writeln!(out, "\n{title}\n{}", "-".repeat(title.len())).unwrap();

    let slow = slowest(stats);
    if slow.is_empty() {
        out.push_str("(none)\n");
        return;
    }

    for op in slow.into_iter().take(top) {
        let line = match &op.resource {
            Some(resource) => format!("{}  {}", op.name, resource),
            None => op.name.clone(),
        };
        writeln!(
            out,
            "{:>9.1}ms  {}",
            op.duration_ms,
            truncate(&line, SLOW_LINE_WIDTH)
        )
        .unwrap();
    }
}

fn render_table(out: &mut String, title: &str, stats: &StatsMap, limit: usize) {
    writeln!(out, "\n{title}\n{}", "-".repeat(title.len())).unwrap();

    if stats.is_empty() {
        out.push_str("(none)\n");
        return;
    }

    writeln!(
        out,
        "{} {:>6} {:>10} {:>9} {:>9}",
        pad("Operation", NAME_WIDTH),
        "Count",
        "Total(ms)",
        "Avg(ms)",
        "Max(ms)"
    )
    .unwrap();
    let rule = format!(
        "{} {} {} {} {}",
        "-".repeat(NAME_WIDTH),
        "-".repeat(6),
        "-".repeat(10),
        "-".repeat(9),
        "-".repeat(9)
    );
    writeln!(out, "{rule}").unwrap();

    let sorted = by_total_duration(stats);
    for stat in sorted.iter().take(limit) {
        let key = match &stat.resource {
            Some(resource) => format!("{}: {}", stat.name, resource),
            None => stat.name.clone(),
        };
        writeln!(
            out,
            "{} {:>6} {:>10.1} {:>9.1} {:>9.1}",
            pad(&truncate(&key, NAME_WIDTH), NAME_WIDTH),
            stat.count,
            stat.total_duration / 1000.0,
            stat.average() / 1000.0,
            stat.max_duration / 1000.0,
        )
        .unwrap();
    }
    if sorted.len() > limit {
        writeln!(out, "... {} more", sorted.len() - limit).unwrap();
    }

    let count: u64 = stats.values().map(|s| s.count).sum();
    let total: f64 = stats.values().map(|s| s.total_duration).sum();
    writeln!(out, "{rule}").unwrap();
    writeln!(
        out,
        "{} {:>6} {:>10.1}",
        pad("TOTAL", NAME_WIDTH),
        count,
        total / 1000.0
    )
    .unwrap();
}

/// Shorten to `max_width` display columns, marking the cut with `...`.
fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Pad to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    format!("{s}{}", " ".repeat(width.saturating_sub(s.width())))
}
