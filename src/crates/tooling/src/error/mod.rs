//! Error chain helpers
//!
//! Used when an error has to be written to a log line: connection failures
//! usually wrap an I/O or protocol error several levels deep, and the
//! innermost message is the one worth reading.

use std::error::Error as StdError;

/// Format an error and all of its sources
///
/// The first line is the error itself; each source follows on its own line,
/// indented one step deeper than its parent.
pub fn format_error_chain(error: &dyn StdError) -> String {
    let mut result = format!("Error: {}", error);
    let mut current = error.source();
    let mut level = 1;

    while let Some(source) = current {
        result.push_str(&format!("\n{:indent$}Caused by: {}", "", source, indent = level * 2));
        current = source.source();
        level += 1;
    }

    result
}

/// Collapse an error chain into a single `outer: inner: root` line
pub fn flatten_error_chain(error: &dyn StdError) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        let text = source.to_string();
        // thiserror messages often already embed their source
        if !parts.last().is_some_and(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}

/// Innermost error of a chain
pub fn root_cause(error: &dyn StdError) -> &dyn StdError {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}
