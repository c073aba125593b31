use std::path::Path;

use recollect_import::STRING_KEYS;
use recollect_store::RecollectPaths;

/// Keys whose values are masked by `get` and `list`.
const SECRET_KEYS: &[&str] = &["site_password", "auth_password", "progenitor_key"];

/// Read `.recollect/config.json`. Returns an empty map if the file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}

fn write_config(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    recollect_store::write_atomic(path, json.as_bytes())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

fn display_value(key: &str, val: &serde_json::Value) -> String {
    if SECRET_KEYS.contains(&key) {
        "********".to_string()
    } else {
        val.to_string()
    }
}

/// `recollect config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = RecollectPaths::discover(repo_root);
    let mut config = read_config(&paths.config_json)?;
    let parsed = if STRING_KEYS.contains(&key) {
        serde_json::Value::String(value.to_string())
    } else {
        parse_value(value)
    };
    println!("{key} = {}", display_value(key, &parsed));
    config.insert(key.to_string(), parsed);
    write_config(&paths.config_json, &config)
}

/// `recollect config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = RecollectPaths::discover(repo_root);
    let config = read_config(&paths.config_json)?;
    match config.get(key) {
        Some(val) => println!("{}", display_value(key, val)),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `recollect config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = RecollectPaths::discover(repo_root);
    let config = read_config(&paths.config_json)?;
    if config.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &config {
            println!("{k} = {}", display_value(k, v));
        }
    }
    Ok(())
}
