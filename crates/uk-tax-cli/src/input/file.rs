use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a request file. `.yaml`/`.yml` files are parsed as YAML, anything
/// else as JSON.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let value: Value = if is_yaml(&resolved) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?
    };
    tracing::debug!(path = %resolved.display(), "request read from file");
    Ok(value)
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

pub(crate) fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if !resolved.is_file() {
        return Err(format!("File not found: {}", resolved.display()).into());
    }
    Ok(resolved)
}
