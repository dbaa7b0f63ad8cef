//! Format-specific read/write helpers (JSON, YAML, TOML).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::atomic::safe_write;

pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Write pretty-printed JSON with a trailing newline.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let mut json = serde_json::to_string_pretty(data)
        .with_context(|| format!("Failed to serialize JSON for: {}", path.display()))?;
    json.push('\n');

    safe_write(path, &json).with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

pub fn read_toml_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

pub fn write_toml_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let toml = toml::to_string_pretty(data)
        .with_context(|| format!("Failed to serialize data to TOML for: {}", path.display()))?;

    safe_write(path, &toml).with_context(|| format!("Failed to write TOML file: {}", path.display()))
}

pub fn write_yaml_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let yaml = serde_yaml::to_string(data)
        .with_context(|| format!("Failed to serialize data to YAML for: {}", path.display()))?;

    safe_write(path, &yaml).with_context(|| format!("Failed to write YAML file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_json_file_ends_with_newline() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sample.json");
        let sample = Sample {
            name: "x".to_string(),
            count: 2,
        };

        write_json_file(&path, &sample).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert_eq!(read_json_file::<Sample>(&path).unwrap(), sample);
    }

    #[test]
    fn test_read_json_file_reports_path_on_parse_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json_file::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_toml_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let sample = Sample {
            name: "cfg".to_string(),
            count: 7,
        };

        write_toml_file(&path, &sample).unwrap();
        assert_eq!(read_toml_file::<Sample>(&path).unwrap(), sample);
    }
}
