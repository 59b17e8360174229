//! Fold trace events into per-operation performance statistics.
//!
//! The [`Analyzer`] is a single reactive reducer. Each event is routed by
//! name and shape:
//!
//! - `request` with a `seq`: remember when it started.
//! - `response` with a `seq`: pair it with its request and record the latency
//!   under the command name.
//! - anything else with a `dur`: record the span under the event name.
//!
//! Nothing here fails. Unmatched responses and missing fields leave the
//! state untouched or fall back to the bare operation name.

use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use super::enrich::{FIND_SOURCE_FILE, enrich, is_inferred_project_update};
use super::parse::{Phase, TraceEvent, parse_line};
use super::resource::{extract_resource, is_chat_code_block};
use super::state::{
    AnalyzerState, PerformanceStat, SlowOperation, StatsMap, is_slow, record_stat, stats_key,
};

const REQUEST: &str = "request";
const RESPONSE: &str = "response";
const UNKNOWN_COMMAND: &str = "unknown";

/// The aggregates a report is built from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceStats {
    pub command_stats: StatsMap,
    pub internal_stats: StatsMap,
    pub slow_operations: Vec<SlowOperation>,
}

impl TraceStats {
    pub fn is_empty(&self) -> bool {
        self.command_stats.is_empty()
            && self.internal_stats.is_empty()
            && self.slow_operations.is_empty()
    }
}

/// Stateful event processor for one trace stream.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    state: AnalyzerState,
}

impl Analyzer {
    /// Create an analyzer. `path_mapped_files` are path-alias fragments used
    /// to flag `findSourceFile` calls caused by tsconfig `paths`.
    pub fn new(path_mapped_files: Vec<String>) -> Self {
        Self {
            state: AnalyzerState::new(path_mapped_files),
        }
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    /// Advance the state by one event.
    ///
    /// `dur` is what makes an event an internal span. Emitters only attach it
    /// to complete (`X`) events, so the phase itself isn't checked.
    pub fn process(&mut self, event: &TraceEvent) {
        self.observe(event);

        match event.name.as_str() {
            REQUEST if event.arg_seq("seq").is_some() => self.on_request(event),
            RESPONSE if event.arg_seq("seq").is_some() => self.on_response(event),
            _ => {
                if let Some(duration) = event.dur {
                    if event.ph != Phase::Complete {
                        log::debug!(
                            "{} has dur but phase {:?}; recording as a span",
                            event.name,
                            event.ph
                        );
                    }
                    self.on_internal(event, duration);
                }
            }
        }
    }

    /// Snapshot of the aggregates so far.
    pub fn stats(&self) -> TraceStats {
        TraceStats {
            command_stats: self.state.command_stats.clone(),
            internal_stats: self.state.internal_stats.clone(),
            slow_operations: self.state.slow_operations.clone(),
        }
    }

    /// Consume the analyzer, returning its aggregates.
    pub fn finish(self) -> TraceStats {
        let AnalyzerState {
            command_stats,
            internal_stats,
            slow_operations,
            ..
        } = self.state;
        TraceStats {
            command_stats,
            internal_stats,
            slow_operations,
        }
    }

    /// Forget everything except the path-alias configuration.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Side-channel facts every event may carry, regardless of dispatch.
    fn observe(&mut self, event: &TraceEvent) {
        if let (Some(project), Some(files)) = (
            event.arg_str("projectName"),
            event.args.get("fileNames").and_then(|v| v.as_array()),
        ) {
            let files = files
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect();
            self.state
                .inferred_project_files
                .insert(project.to_string(), files);
        }

        if extract_resource(&event.args).is_some_and(|r| is_chat_code_block(&r)) {
            self.state.observe_chat_block(event.ts);
        }
    }

    fn on_request(&mut self, event: &TraceEvent) {
        if let Some(seq) = event.arg_seq("seq") {
            self.state.pending_requests.insert(seq, event.ts);
        }
    }

    fn on_response(&mut self, event: &TraceEvent) {
        // Some emitters put the correlation key in the response's own `seq`.
        let Some(seq) = event.arg_seq("request_seq").or_else(|| event.arg_seq("seq")) else {
            return;
        };
        let Some(started) = self.state.pending_requests.remove(&seq) else {
            log::debug!("No pending request for response seq={seq}");
            return;
        };

        let mut duration = event.ts - started;
        if duration < 0.0 {
            log::debug!("Response seq={seq} precedes its request by {}us", -duration);
            duration = 0.0;
        }

        let command = event.arg_str("command").unwrap_or(UNKNOWN_COMMAND);
        let resource = extract_resource(&event.args);
        record_stat(
            &mut self.state.command_stats,
            stats_key(command, resource.as_deref()),
            command,
            resource.as_deref(),
            duration,
        );

        if is_slow(duration) {
            self.record_slow(format!("Command: {command}"), resource, duration, event);
        }
    }

    fn on_internal(&mut self, event: &TraceEvent, duration: f64) {
        let raw = extract_resource(&event.args);
        let resource = raw.as_deref().map(|r| {
            if event.name == FIND_SOURCE_FILE || is_inferred_project_update(event, r) {
                enrich(event, &self.state, r)
            } else {
                r.to_string()
            }
        });

        record_stat(
            &mut self.state.internal_stats,
            stats_key(&event.name, resource.as_deref()),
            &event.name,
            resource.as_deref(),
            duration,
        );

        if event.name == FIND_SOURCE_FILE
            && let Some(file) = raw
        {
            self.state.push_find_source_file(event.ts, file);
        }

        if is_slow(duration) {
            self.record_slow(format!("Internal: {}", event.name), resource, duration, event);
        }
    }

    fn record_slow(
        &mut self,
        name: String,
        resource: Option<String>,
        duration: f64,
        event: &TraceEvent,
    ) {
        log::debug!("Slow operation {name}: {:.1}ms", duration / 1000.0);
        self.state.slow_operations.push(SlowOperation {
            name,
            resource,
            duration_ms: duration / 1000.0,
            timestamp: event.ts,
            args: event.args.clone(),
        });
    }
}

/// Stream a trace log through a fresh analyzer.
pub fn analyze_reader(
    reader: impl BufRead,
    path_mapped_files: Vec<String>,
) -> std::io::Result<TraceStats> {
    let mut analyzer = Analyzer::new(path_mapped_files);
    // Split on bytes so a line of invalid UTF-8 is skipped like any other junk.
    for line in reader.split(b'\n') {
        if let Some(event) = parse_line(&String::from_utf8_lossy(&line?)) {
            analyzer.process(&event);
        }
    }
    Ok(analyzer.finish())
}

/// Analyze a trace log file.
pub fn analyze_file(path: &Path, path_mapped_files: Vec<String>) -> anyhow::Result<TraceStats> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = std::io::BufReader::new(file);
    analyze_reader(reader, path_mapped_files)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Stats sorted by total duration, descending.
pub fn by_total_duration(stats: &StatsMap) -> Vec<&PerformanceStat> {
    let mut sorted: Vec<_> = stats.values().collect();
    sorted.sort_by(|a, b| b.total_duration.total_cmp(&a.total_duration));
    sorted
}

/// Slow operations sorted by duration, descending.
pub fn slowest(stats: &TraceStats) -> Vec<&SlowOperation> {
    let mut sorted: Vec<_> = stats.slow_operations.iter().collect();
    sorted.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));
    sorted
}
