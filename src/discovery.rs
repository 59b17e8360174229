//! Locate language server trace logs on disk.
//!
//! Editors write tsserver traces under their log directory, e.g.
//! `~/.config/Code/logs/<session>/window1/exthost/vscode.typescript-language-features/tsserver-log-XYZ/trace.1234.json`.
//! We walk every known editor's log root and keep files that look like traces,
//! newest first.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Editors whose log directories are searched, by config-dir subdirectory.
const EDITOR_DIRS: [&str; 4] = ["Code", "Code - Insiders", "Cursor", "VSCodium"];

/// Directory components that mark a TypeScript server log location.
const TSSERVER_LOG_PREFIX: &str = "tsserver-log-";
const TS_EXTENSION_DIR: &str = "vscode.typescript-language-features";

/// Default roots: `<config dir>/<editor>/logs` for each known editor that exists.
pub fn default_roots() -> Vec<PathBuf> {
    let Some(config_dir) = dirs::config_dir() else {
        log::debug!("No platform config directory; skipping log discovery");
        return Vec::new();
    };

    EDITOR_DIRS
        .iter()
        .map(|editor| config_dir.join(editor).join("logs"))
        .filter(|root| root.is_dir())
        .collect()
}

/// Whether `path` looks like a tsserver trace file.
pub fn is_trace_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !(name.starts_with("trace") && name.ends_with(".json")) {
        return false;
    }

    path.components().any(|component| {
        component.as_os_str().to_str().is_some_and(|c| {
            c.starts_with(TSSERVER_LOG_PREFIX) || c == TS_EXTENSION_DIR
        })
    })
}

/// Find trace files under `roots`, newest modification time first.
///
/// Unreadable directories are skipped.
pub fn find_trace_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<(SystemTime, PathBuf)> = roots
        .iter()
        .flat_map(|root| WalkDir::new(root).follow_links(false))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable log entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_trace_file(entry.path()))
        .map(|entry| {
            let path = entry.into_path();
            (modified(&path), path)
        })
        .collect();

    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    log::debug!("Found {} trace file(s)", found.len());
    found.into_iter().map(|(_, path)| path).collect()
}

/// The most recently modified of `paths`; the earliest listed wins ties.
///
/// Paths that can't be stat'ed (including `-` for stdin) sort as oldest.
pub fn newest(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths
        .into_iter()
        .min_by_key(|path| std::cmp::Reverse(modified(path)))
}

fn modified(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Path for user-facing output, with the home directory shown as `~`.
pub fn display_path(path: &Path) -> String {
    let relative = home::home_dir()
        .and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf));
    match relative {
        Some(rel) if rel.as_os_str().is_empty() => "~".to_string(),
        Some(rel) => Path::new("~").join(rel).display().to_string(),
        None => path.display().to_string(),
    }
}

/// Expand user-supplied paths: files are taken as-is, directories are searched.
pub fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                find_trace_files(std::slice::from_ref(path))
            } else {
                vec![path.clone()]
            }
        })
        .collect()
}
