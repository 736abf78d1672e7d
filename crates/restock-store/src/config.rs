//! Raw access to `config.json`, a flat JSON object of settings.
//!
//! Typed views (agent settings, notify channels) deserialize from the same map.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use crate::write_atomic;

/// Read config. Returns an empty map if the file doesn't exist or isn't an object.
pub fn read_config(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let val: Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    match val {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

pub fn write_config(path: &Path, config: &Map<String, Value>) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Set one key and persist the whole map.
pub fn set_value(path: &Path, key: &str, value: Value) -> Result<()> {
    let mut config = read_config(path)?;
    config.insert(key.to_string(), value);
    write_config(path, &config)
}

/// Parse a CLI string into a JSON value: bool, number, JSON array/object, else string.
pub fn parse_value(s: &str) -> Value {
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else if s.trim_start().starts_with(['[', '{']) {
                serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
            } else {
                Value::String(s.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("60"), serde_json::json!(60));
        assert_eq!(parse_value("1.5"), serde_json::json!(1.5));
        assert_eq!(
            parse_value(r#"[{"type":"ntfy","url":"u","events":["*"]}]"#)[0]["type"],
            "ntfy"
        );
        assert_eq!(parse_value("[broken"), Value::String("[broken".into()));
        assert_eq!(
            parse_value("http://localhost:4444"),
            Value::String("http://localhost:4444".into())
        );
    }

    #[test]
    fn set_value_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set_value(&path, "round_interval_secs", serde_json::json!(30)).unwrap();
        set_value(&path, "webdriver_url", serde_json::json!("http://x")).unwrap();

        let map = read_config(&path).unwrap();
        assert_eq!(map["round_interval_secs"], 30);
        assert_eq!(map["webdriver_url"], "http://x");
    }

    #[test]
    fn non_object_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1,2]").unwrap();
        assert!(read_config(&path).unwrap().is_empty());
    }
}
