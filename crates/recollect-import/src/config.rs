use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);
pub const DEFAULT_PLATFORM: &str = "manual";

/// Config-file keys that always hold text, even when the value looks like a
/// number or a boolean.
pub const STRING_KEYS: &[&str] = &[
    "base_url",
    "platform",
    "idempotency_prefix",
    "site_password",
    "auth_email",
    "auth_password",
    "auth_name",
    "progenitor_key",
];

/// Credentials for the optional pre-import handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub site_password: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub progenitor_key: Option<String>,
}

impl AuthConfig {
    /// True when there is anything to send before the import.
    pub fn is_configured(&self) -> bool {
        self.site_password.is_some() || (self.email.is_some() && self.password.is_some())
    }
}

/// Settings for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub base_url: String,
    pub batch_size: usize,
    pub pause: Duration,
    pub platform: String,
    pub skip_system: bool,
    pub dry_run: bool,
    pub idempotency_prefix: Option<String>,
    pub auth: AuthConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            pause: DEFAULT_PAUSE,
            platform: DEFAULT_PLATFORM.to_string(),
            skip_system: false,
            dry_run: false,
            idempotency_prefix: None,
            auth: AuthConfig::default(),
        }
    }
}

/// Keys read from `.recollect/config.json`. Unknown keys are ignored so the
/// file can hold settings for other commands.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(deserialize_with = "text")]
    base_url: Option<String>,
    batch_size: Option<usize>,
    pause_ms: Option<u64>,
    #[serde(deserialize_with = "text")]
    platform: Option<String>,
    skip_system: Option<bool>,
    #[serde(deserialize_with = "text")]
    idempotency_prefix: Option<String>,
    #[serde(deserialize_with = "text")]
    site_password: Option<String>,
    #[serde(deserialize_with = "text")]
    auth_email: Option<String>,
    #[serde(deserialize_with = "text")]
    auth_password: Option<String>,
    #[serde(deserialize_with = "text")]
    auth_name: Option<String>,
    #[serde(deserialize_with = "text")]
    progenitor_key: Option<String>,
}

/// A text setting; numbers and booleans are taken in their JSON spelling.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid type: {other}, expected a string"
        ))),
    }
}

impl ImportConfig {
    /// Defaults overlaid with the config file at `path`, if it exists. Not
    /// validated: later layers may still correct a value, so call
    /// [`ImportConfig::validate`] once everything is applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        if let Some(v) = file.base_url {
            config.base_url = v;
        }
        if let Some(v) = file.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = file.pause_ms {
            config.pause = Duration::from_millis(v);
        }
        if let Some(v) = file.platform {
            config.platform = v;
        }
        if let Some(v) = file.skip_system {
            config.skip_system = v;
        }
        config.idempotency_prefix = file.idempotency_prefix;
        config.auth = AuthConfig {
            site_password: file.site_password,
            email: file.auth_email,
            password: file.auth_password,
            name: file.auth_name,
            progenitor_key: file.progenitor_key,
        };
        Ok(config)
    }

    /// File settings overlaid with `RECOLLECT_*` environment variables.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RECOLLECT_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("RECOLLECT_BATCH_SIZE") {
            self.batch_size = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "RECOLLECT_BATCH_SIZE".to_string(),
                detail: format!("{e}"),
            })?;
        }
        let auth = &mut self.auth;
        for (key, slot) in [
            ("RECOLLECT_SITE_PASSWORD", &mut auth.site_password),
            ("RECOLLECT_AUTH_EMAIL", &mut auth.email),
            ("RECOLLECT_AUTH_PASSWORD", &mut auth.password),
            ("RECOLLECT_AUTH_NAME", &mut auth.name),
            ("RECOLLECT_PROGENITOR_KEY", &mut auth.progenitor_key),
        ] {
            if let Some(v) = lookup(key) {
                *slot = Some(v);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size".to_string(),
                detail: "must be at least 1".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                detail: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
