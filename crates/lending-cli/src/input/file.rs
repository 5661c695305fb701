use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON loan or records file into a typed input.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (location, contents) = read_file(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid input in '{}': {}", location.display(), e).into())
}

/// Read a JSON file without committing to a shape yet.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    read_json(path)
}

fn read_file(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let location = resolve_path(path)?;
    let contents = fs::read_to_string(&location)
        .map_err(|e| format!("Failed to read '{}': {}", location.display(), e))?;
    tracing::debug!(path = %location.display(), bytes = contents.len(), "read input file");
    Ok((location, contents))
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let location = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !location.is_file() {
        return Err(format!("Input file not found: {}", location.display()).into());
    }
    Ok(location)
}
