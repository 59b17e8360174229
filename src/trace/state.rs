//! Accumulated analyzer state and the records it aggregates.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use serde::Serialize;

use super::parse::Args;

/// Operations slower than this (microseconds, strict `>`) are reported.
pub const SLOW_THRESHOLD_US: f64 = 500_000.0;

/// How far back `findSourceFile` events are remembered (microseconds).
pub const FIND_SOURCE_FILE_WINDOW_US: f64 = 10_000_000.0;

/// Stats keyed by operation name, optionally suffixed with a resource.
pub type StatsMap = IndexMap<String, PerformanceStat>;

/// Running statistics for one operation key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStat {
    pub name: String,
    pub resource: Option<String>,
    pub count: u64,
    /// Microseconds.
    pub total_duration: f64,
    /// Microseconds.
    pub max_duration: f64,
}

impl PerformanceStat {
    fn empty(name: &str, resource: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            resource: resource.map(str::to_string),
            count: 0,
            total_duration: 0.0,
            max_duration: 0.0,
        }
    }

    /// Mean duration in microseconds.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_duration / self.count as f64
        }
    }
}

/// A completed operation that exceeded [`SLOW_THRESHOLD_US`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowOperation {
    /// Tagged name, e.g. `Command: completion` or `Internal: updateGraph`.
    pub name: String,
    pub resource: Option<String>,
    pub duration_ms: f64,
    pub timestamp: f64,
    pub args: Args,
}

/// A recently seen `findSourceFile` span.
#[derive(Debug, Clone, PartialEq)]
pub struct FindSourceFileEntry {
    pub timestamp: f64,
    pub file: String,
}

/// Everything the analyzer has learned from one event stream.
///
/// Owned by exactly one sequential processing path; correlation and the
/// `findSourceFile` window both depend on arrival order.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerState {
    /// Outstanding requests: sequence number to start timestamp.
    pub pending_requests: HashMap<u64, f64>,
    /// Most recent chat code block sighting. Never decreases.
    pub last_chat_block_timestamp: Option<f64>,
    /// Path-alias fragments from the project config. Fixed for the state's lifetime.
    pub path_mapped_files: Vec<String>,
    /// Project name to member files, from project info events.
    pub inferred_project_files: HashMap<String, Vec<String>>,
    /// `findSourceFile` spans from the trailing window, oldest first.
    pub recent_find_source_files: VecDeque<FindSourceFileEntry>,
    pub command_stats: StatsMap,
    pub internal_stats: StatsMap,
    pub slow_operations: Vec<SlowOperation>,
}

impl AnalyzerState {
    pub fn new(path_mapped_files: Vec<String>) -> Self {
        Self {
            path_mapped_files,
            ..Self::default()
        }
    }

    /// Clear everything learned from events, keeping the path-alias config.
    pub fn reset(&mut self) {
        let path_mapped_files = std::mem::take(&mut self.path_mapped_files);
        *self = Self::new(path_mapped_files);
    }

    pub(crate) fn observe_chat_block(&mut self, ts: f64) {
        self.last_chat_block_timestamp = Some(match self.last_chat_block_timestamp {
            Some(prev) => prev.max(ts),
            None => ts,
        });
    }

    pub(crate) fn push_find_source_file(&mut self, timestamp: f64, file: String) {
        self.recent_find_source_files
            .push_back(FindSourceFileEntry { timestamp, file });
        self.prune_find_source_files(timestamp);
    }

    /// Drop window entries older than `now - FIND_SOURCE_FILE_WINDOW_US`.
    ///
    /// Entries are pushed in arrival order, which for well-formed traces is
    /// timestamp order, so stale entries sit at the front. A full `retain`
    /// catches the rest when input timestamps go backwards.
    fn prune_find_source_files(&mut self, now: f64) {
        let cutoff = now - FIND_SOURCE_FILE_WINDOW_US;
        while self
            .recent_find_source_files
            .front()
            .is_some_and(|entry| entry.timestamp < cutoff)
        {
            self.recent_find_source_files.pop_front();
        }
        self.recent_find_source_files
            .retain(|entry| entry.timestamp >= cutoff);
    }
}

/// Compose the key stats are bucketed under.
pub fn stats_key(name: &str, resource: Option<&str>) -> String {
    match resource {
        Some(resource) => format!("{name}: {resource}"),
        None => name.to_string(),
    }
}

/// Fold one duration into the stat stored under `key`.
pub fn record_stat(
    map: &mut StatsMap,
    key: String,
    name: &str,
    resource: Option<&str>,
    duration: f64,
) {
    let stat = map
        .entry(key)
        .or_insert_with(|| PerformanceStat::empty(name, resource));
    stat.count += 1;
    stat.total_duration += duration;
    stat.max_duration = stat.max_duration.max(duration);
}

/// Whether a duration counts as slow.
pub fn is_slow(duration: f64) -> bool {
    duration > SLOW_THRESHOLD_US
}
