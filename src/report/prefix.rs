use std::panic::Location;

/// Renders the context that precedes a report message, e.g. `[src/main.rs:12] `.
pub fn report_prefix(location: &Location<'_>) -> String {
    format!("[{}:{}] ", location.file(), location.line())
}
