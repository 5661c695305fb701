use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin, if any. An interactive terminal or empty pipe yields
/// `None` so the caller falls back to flags.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_str(trimmed).map_err(|e| format!("Invalid JSON on stdin: {e}"))?;
    tracing::debug!("read input from stdin");
    Ok(Some(value))
}
