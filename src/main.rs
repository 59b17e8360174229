use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use color_print::cformat;
use rayon::prelude::*;
use serde::Serialize;
use tsperf::config::PathMappings;
use tsperf::discovery::{default_roots, display_path, expand_paths, find_trace_files, newest};
use tsperf::styling::{eprintln, format_error_chain, hint_message, println, warning_message};
use tsperf::trace::{RenderOptions, TraceStats, analyze_file, analyze_reader, render};

#[derive(Parser)]
#[command(name = "tsperf")]
#[command(about = "Summarize TypeScript language server trace logs", long_about = None)]
#[command(version)]
struct Cli {
    /// Trace files or directories to analyze, `-` for stdin (default: search editor log directories)
    paths: Vec<PathBuf>,

    /// Project directory whose tsconfig.json path aliases annotate findSourceFile spans
    /// (default: current directory)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Number of slow operations to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Rows shown per stats table
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Only analyze the most recently modified trace among those found or given
    #[arg(long)]
    latest: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    stats: &'a TraceStats,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn load_mappings(project: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let project_dir = match project {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match PathMappings::load(&project_dir) {
        Ok(mappings) => {
            if let Some(source) = &mappings.source {
                log::info!(
                    "Using {} path mapping(s) from {}",
                    mappings.fragments.len(),
                    display_path(source)
                );
            }
            Ok(mappings.fragments)
        }
        Err(e) => {
            // Analysis still works without path mappings, just with fewer annotations.
            let err = anyhow::Error::from(e);
            eprintln!(
                "{}",
                warning_message(format!("{err:#}; tsconfig paths will not be annotated"))
            );
            Ok(Vec::new())
        }
    }
}

fn analyze_path(path: &Path, path_mappings: Vec<String>) -> anyhow::Result<TraceStats> {
    if path == Path::new("-") {
        return analyze_reader(std::io::stdin().lock(), path_mappings)
            .context("Failed to read trace from stdin");
    }
    analyze_file(path, path_mappings)
}

/// Returns whether every trace was analyzed.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let path_mappings = load_mappings(cli.project.as_deref())?;

    let mut files = if cli.paths.is_empty() {
        find_trace_files(&default_roots())
    } else {
        expand_paths(&cli.paths)
    };
    if cli.latest {
        files = newest(files).into_iter().collect();
    }

    if files.is_empty() {
        eprintln!("{}", warning_message("No trace files found"));
        eprintln!(
            "{}",
            hint_message(
                "Enable tracing with the typescript.tsserver.enableTracing setting, or pass trace files directly"
            )
        );
        return Ok(false);
    }

    // Each file gets its own analyzer; streams never share state.
    let results: Vec<(&PathBuf, anyhow::Result<TraceStats>)> = files
        .par_iter()
        .map(|path| (path, analyze_path(path, path_mappings.clone())))
        .collect();

    let options = RenderOptions {
        top: cli.top,
        limit: cli.limit,
    };
    let mut all_ok = true;
    let mut reports = Vec::new();

    for (path, result) in &results {
        match result {
            Ok(stats) => {
                if stats.is_empty() {
                    log::warn!("No trace events found in {}", display_path(path));
                }
                match cli.format {
                    OutputFormat::Text => {
                        println!("{}", cformat!("<bold>{}</>", display_path(path)));
                        println!("{}", render(stats, &options));
                    }
                    OutputFormat::Json => reports.push(FileReport {
                        path: path.as_path(),
                        stats,
                    }),
                }
            }
            Err(e) => {
                all_ok = false;
                eprintln!("{}", format_error_chain(e));
            }
        }
    }

    if cli.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialize report")?;
        println!("{json}");
    }

    Ok(all_ok)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}", format_error_chain(&e));
            process::exit(1);
        }
    }
}
