//! Styling for terminal messages.
//!
//! Output goes through anstream, which strips colors when stdout/stderr
//! isn't a terminal and respects NO_COLOR / CLICOLOR_FORCE. Messages use
//! `cformat!` tags:
//!
//! - Errors: `<red>...</>`
//! - Warnings: `<yellow>...</>`
//! - Hints: `<dim>...</>`
//!
//! Reports themselves are plain text so they can be diffed and piped.

use color_print::cformat;

/// Auto-detecting println that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::println;

/// Auto-detecting eprintln that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::eprintln;

/// Error emoji: `cformat!("{ERROR_EMOJI} <red>message</>")`
pub const ERROR_EMOJI: &str = "❌";

/// Warning emoji: `cformat!("{WARNING_EMOJI} <yellow>message</>")`
pub const WARNING_EMOJI: &str = "🟡";

/// Hint emoji: `cformat!("{HINT_EMOJI} <dim>message</>")`
pub const HINT_EMOJI: &str = "💡";

/// Format an error message with emoji and red styling
pub fn error_message(content: impl AsRef<str>) -> String {
    cformat!("{ERROR_EMOJI} <red>{}</>", content.as_ref())
}

/// Format a warning message with emoji and yellow styling
pub fn warning_message(content: impl AsRef<str>) -> String {
    cformat!("{WARNING_EMOJI} <yellow>{}</>", content.as_ref())
}

/// Format a hint message with emoji and dim styling
pub fn hint_message(content: impl AsRef<str>) -> String {
    cformat!("{HINT_EMOJI} <dim>{}</>", content.as_ref())
}

/// Render an error and its cause chain on one line each.
pub fn format_error_chain(err: &anyhow::Error) -> String {
    let mut out = error_message(err.to_string());
    for cause in err.chain().skip(1) {
        out.push('\n');
        out.push_str(&cformat!("   <dim>caused by: {}</>", cause));
    }
    out
}
