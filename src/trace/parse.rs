//! Decode trace log lines into structured events.
//!
//! Trace logs are a JSON array written one element per line:
//!
//! ```text
//! [
//! {"name":"request","ph":"M","ts":1000,"pid":1,"tid":1,"args":{"seq":1,"command":"completion"}},
//! {"name":"findSourceFile","ph":"X","ts":1200,"dur":340,"pid":1,"tid":1,"args":{"fileName":"/src/a.ts"}},
//! ]
//! ```
//!
//! Each line is decoded on its own. Array delimiters, blank lines, and anything
//! that isn't valid JSON are skipped, so a truncated log still yields every
//! complete event before the cut.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Open-ended argument bag attached to an event.
pub type Args = Map<String, Value>;

/// Event kind discriminator (the `ph` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Phase {
    #[serde(rename = "M")]
    Metadata,
    #[serde(rename = "B")]
    Begin,
    #[serde(rename = "E")]
    End,
    #[serde(rename = "X")]
    Complete,
    #[serde(rename = "i", alias = "I")]
    Instant,
    /// Any phase we don't interpret.
    #[serde(other)]
    Other,
}

/// One instrumentation record from the traced process.
///
/// Timestamps and durations are microseconds. They are kept as `f64` because
/// emitters commonly write fractional microseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceEvent {
    pub name: String,
    #[serde(default)]
    pub cat: Option<String>,
    pub ph: Phase,
    pub ts: f64,
    #[serde(default)]
    pub pid: u64,
    #[serde(default)]
    pub tid: u64,
    #[serde(default)]
    pub dur: Option<f64>,
    #[serde(default, deserialize_with = "args_or_empty")]
    pub args: Args,
}

impl TraceEvent {
    /// Look up a string argument.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    /// Look up a sequence-number argument (`seq`, `request_seq`).
    ///
    /// Accepts unsigned integers, integral floats, and numeric strings.
    pub fn arg_seq(&self, key: &str) -> Option<u64> {
        match self.args.get(key)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// End of the event's span, or its timestamp when it has no duration.
    pub fn end(&self) -> f64 {
        self.ts + self.dur.unwrap_or(0.0)
    }

    /// Whether `ts` falls inside `[self.ts, self.ts + dur]`.
    pub fn spans(&self, ts: f64) -> bool {
        ts >= self.ts && ts <= self.end()
    }
}

// `"args": null` shows up in some emitters; treat it like a missing bag.
fn args_or_empty<'de, D>(deserializer: D) -> Result<Args, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Args>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a single log line. Returns `None` for anything that isn't an event.
pub fn parse_line(line: &str) -> Option<TraceEvent> {
    let line = line.trim();
    if line.is_empty() || line == "[" || line == "]" {
        return None;
    }

    let line = line.strip_suffix(',').unwrap_or(line);
    serde_json::from_str(line).ok()
}

/// Parse every event in a multi-line log, skipping non-event lines.
pub fn parse_lines(input: &str) -> Vec<TraceEvent> {
    input.lines().filter_map(parse_line).collect()
}
