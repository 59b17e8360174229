//! Trace log parsing and performance analysis.
//!
//! Reads the JSON trace a TypeScript language server writes when tracing is
//! enabled, and answers "where did the time go": request latency per command,
//! time per internal operation, and every single operation slower than 500ms.
//!
//! Generic buckets such as `updateGraph` on an inferred project are annotated
//! with what most likely triggered them (see [`enrich`]).
//!
//! # Usage
//!
//! ```ignore
//! use tsperf::trace::{RenderOptions, analyze_file, render};
//!
//! let stats = analyze_file(&path, path_mappings)?;
//! println!("{}", render(&stats, &RenderOptions::default()));
//! ```

pub mod analyze;
pub mod display;
pub mod enrich;
pub mod parse;
pub mod resource;
pub mod state;

// Re-export main types for convenience
pub use analyze::{Analyzer, TraceStats, analyze_file, analyze_reader};
pub use display::{RenderOptions, render};
pub use parse::{Phase, TraceEvent, parse_line, parse_lines};
pub use resource::extract_resource;
pub use state::{AnalyzerState, PerformanceStat, SlowOperation};
