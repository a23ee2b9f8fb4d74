//! Interactive prompting with bracketed defaults.
//!
//! Only the thin stdin wrappers live here; the resolution rules are
//! pure functions so they can be tested without a terminal.

use std::io::{self, Write};

use hive_core::HiveError;

/// Empty input keeps the default; anything else replaces it.
pub fn resolve_text(input: &str, default: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Empty input keeps the default; anything else must parse as an id.
pub fn resolve_id(input: &str, default: u32) -> Result<u32, HiveError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    trimmed
        .parse()
        .map_err(|_| HiveError::Format(format!("invalid id {trimmed:?}")))
}

fn read_reply(label: &str, shown_default: &str) -> Result<String, HiveError> {
    print!("{label} [{shown_default}]: ");
    io::stdout().flush().map_err(HiveError::Connection)?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(HiveError::Connection)?;
    Ok(line)
}

/// Prompt for a free-form value, echoing the default in brackets.
pub fn text(label: &str, default: &str) -> Result<String, HiveError> {
    let line = read_reply(label, default)?;
    Ok(resolve_text(&line, default))
}

/// Prompt for a numeric id, echoing the default in brackets.
pub fn id(label: &str, default: u32) -> Result<u32, HiveError> {
    let line = read_reply(label, &default.to_string())?;
    resolve_id(&line, default)
}
