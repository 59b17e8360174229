//! Pick a human-readable resource (file, project, ...) out of an event's args.

use super::parse::Args;

/// Substring identifying the virtual documents backing chat code blocks.
pub const CHAT_CODE_BLOCK_MARKER: &str = "vscode-chat-code-block";

/// Label substituted for any chat code block resource.
pub const CHAT_CODE_BLOCK_LABEL: &str = "[Chat Code Block]";

/// Argument fields that may identify a resource, highest priority first.
const RESOURCE_FIELDS: [&str; 5] = ["name", "file", "fileName", "path", "projectName"];

/// Extract the best-effort resource identifier from an argument bag.
///
/// A chat code block in any resource field wins over everything else, so all
/// chat-triggered work lands in one bucket instead of one per virtual document.
pub fn extract_resource(args: &Args) -> Option<String> {
    let mut fields = RESOURCE_FIELDS
        .iter()
        .filter_map(|key| args.get(*key).and_then(|v| v.as_str()));

    if fields
        .clone()
        .any(|value| value.contains(CHAT_CODE_BLOCK_MARKER))
    {
        return Some(CHAT_CODE_BLOCK_LABEL.to_string());
    }

    fields.next().map(str::to_string)
}

/// Whether an extracted resource is the chat code block label.
pub fn is_chat_code_block(resource: &str) -> bool {
    resource == CHAT_CODE_BLOCK_LABEL
}
