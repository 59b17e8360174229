pub mod config;
pub mod discovery;
pub mod styling;
pub mod trace;

// Re-export the engine entry points for convenience
pub use trace::{Analyzer, TraceStats, analyze_file};
