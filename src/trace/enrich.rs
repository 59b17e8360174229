//! Annotate generic resources with hints about what triggered the work.
//!
//! `updateGraph` on an inferred project says nothing about *why* the project
//! was rebuilt. Events seen just before (chat code blocks, project info,
//! `findSourceFile` spans) usually do, so we borrow their details.

use std::path::Path;

use indexmap::IndexSet;

use super::parse::TraceEvent;
use super::state::AnalyzerState;

/// Project-graph rebuild operation.
pub const UPDATE_GRAPH: &str = "updateGraph";

/// Source file resolution operation.
pub const FIND_SOURCE_FILE: &str = "findSourceFile";

/// Substring naming an inferred (config-less) project.
pub const INFERRED_PROJECT_MARKER: &str = "inferredProject";

const TRIGGERED_BY_CHAT: &str = " (Triggered by Chat Code Block)";
const TRIGGERED_BY_PATHS: &str = " (Triggered by tsconfig paths)";

/// Whether the event is an inferred-project graph update, the one case the
/// enrichment cascade applies to.
pub fn is_inferred_project_update(event: &TraceEvent, resource: &str) -> bool {
    event.name == UPDATE_GRAPH && resource.contains(INFERRED_PROJECT_MARKER)
}

/// Return `resource` with any applicable annotation appended.
pub fn enrich(event: &TraceEvent, state: &AnalyzerState, resource: &str) -> String {
    if event.name == FIND_SOURCE_FILE {
        return annotate_path_mapping(state, resource);
    }

    if !is_inferred_project_update(event, resource) {
        return resource.to_string();
    }

    if state
        .last_chat_block_timestamp
        .is_some_and(|ts| event.spans(ts))
    {
        return format!("{resource}{TRIGGERED_BY_CHAT}");
    }

    if let Some(files) = state.inferred_project_files.get(resource)
        && !files.is_empty()
    {
        return format!("{resource}{}", contains_suffix(files.iter().map(|f| basename(f))));
    }

    let matched: IndexSet<&str> = state
        .recent_find_source_files
        .iter()
        .filter(|entry| event.spans(entry.timestamp))
        .map(|entry| basename(&entry.file))
        .collect();
    if !matched.is_empty() {
        return format!("{resource}{}", contains_suffix(matched.into_iter()));
    }

    resource.to_string()
}

fn annotate_path_mapping(state: &AnalyzerState, resource: &str) -> String {
    if state
        .path_mapped_files
        .iter()
        .any(|fragment| resource.contains(fragment.as_str()))
    {
        format!("{resource}{TRIGGERED_BY_PATHS}")
    } else {
        resource.to_string()
    }
}

/// ` (Contains: first.ts)` or ` (Contains: first.ts + N more)`.
fn contains_suffix<'a>(mut names: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = names.next() else {
        return String::new();
    };
    match names.count() {
        0 => format!(" (Contains: {first})"),
        more => format!(" (Contains: {first} + {more} more)"),
    }
}

/// Final path component, falling back to the whole string.
fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}
