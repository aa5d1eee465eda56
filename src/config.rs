//! Configuration management for papersum using the prefer crate.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. a config file (discovered by prefer, or given with `--config`)
//! 3. environment variables (`PAPERSUM_*` and `GEMINI_*`, `.env` included)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm::LlmConfig;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:5001";

/// Default cap on one uploaded paper (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Minimum paper length, in characters after trimming.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;

/// Paper text beyond this many characters is cut before prompting.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 30_000;

const UPLOAD_SUBDIR: &str = "papersum-uploads";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen address: PORT, HOST, or HOST:PORT.
    pub bind: String,
    /// Directory holding uploads while they are processed.
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
    /// Shortest accepted paper, in trimmed characters.
    pub min_text_chars: usize,
    /// Paper text is truncated to this many characters before prompting.
    pub max_text_chars: usize,
    /// Provider settings.
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            upload_dir: std::env::temp_dir().join(UPLOAD_SUBDIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            llm: LlmConfig::default(),
        }
    }
}

impl Settings {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = non_empty("PAPERSUM_BIND") {
            self.bind = bind.trim().to_string();
        }
        if let Some(dir) = non_empty("PAPERSUM_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(shellexpand::tilde(dir.trim()).as_ref());
        }
        self.llm = self.llm.with_overrides(&lookup);
        self
    }

    /// Create the upload directory if it does not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)
    }
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Upload directory; relative paths resolve against the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_text_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_text_chars: Option<usize>,
    pub llm: LlmConfig,

    /// Where this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    ///
    /// A missing config file is not an error; a discovered one that cannot
    /// be read or parsed is.
    pub async fn load() -> Result<Self, ConfigError> {
        let path = match prefer::load("papersum").await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            Err(e) => {
                debug!(error = %e, "No papersum config file found");
                None
            }
        };
        Self::load_discovered(path.as_deref()).await
    }

    async fn load_discovered(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory used to resolve relative paths: the config file's parent,
    /// or the current directory.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref dir) = self.upload_dir {
            settings.upload_dir = self.resolve_path(dir);
        }
        if let Some(n) = self.max_upload_bytes {
            settings.max_upload_bytes = n;
        }
        if let Some(n) = self.min_text_chars {
            settings.min_text_chars = n;
        }
        if let Some(n) = self.max_text_chars {
            settings.max_text_chars = n;
        }
        settings.llm = self.llm.clone();
    }
}

/// Build settings from defaults, the config file and the environment.
///
/// Any config file in play, explicit or discovered, must parse.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    if let Some(ref path) = config.source_path {
        debug!(path = %path.display(), "Loaded config file");
    }

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    Ok(settings.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind, "127.0.0.1:5001");
        assert_eq!(settings.max_upload_bytes, 10_485_760);
        assert_eq!(settings.min_text_chars, 100);
        assert_eq!(settings.max_text_chars, 30_000);
        assert!(settings.upload_dir.ends_with(UPLOAD_SUBDIR));
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::default().with_overrides(lookup(&[
            ("PAPERSUM_BIND", "0.0.0.0:8080"),
            ("PAPERSUM_UPLOAD_DIR", "/srv/uploads"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODELS", "gemini-1.5-pro"),
        ]));
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(settings.llm.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.llm.models, vec!["gemini-1.5-pro".to_string()]);
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let settings = Settings::default().with_overrides(lookup(&[("PAPERSUM_BIND", "  ")]));
        assert_eq!(settings.bind, DEFAULT_BIND);
    }

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("papersum.toml");
        std::fs::write(
            &path,
            r#"
bind = "0.0.0.0:9000"
upload_dir = "uploads"
max_text_chars = 5000

[llm]
models = ["gemini-1.5-flash"]
temperature = 0.2
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.upload_dir, dir.path().join("uploads"));
        assert_eq!(settings.max_text_chars, 5000);
        assert_eq!(settings.min_text_chars, DEFAULT_MIN_TEXT_CHARS);
        assert_eq!(settings.llm.models, vec!["gemini-1.5-flash".to_string()]);
        assert_eq!(settings.llm.temperature, 0.2);
        assert_eq!(settings.llm.max_output_tokens, 8192);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("papersum.yaml");
        std::fs::write(&yaml, "min_text_chars: 50\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.min_text_chars, Some(50));

        let json = dir.path().join("papersum.json");
        std::fs::write(&json, r#"{"max_upload_bytes": 1024}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.max_upload_bytes, Some(1024));
    }

    #[tokio::test]
    async fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = Config::load_from_path(&dir.path().join("nope.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "bind = [").unwrap();
        let err = Config::load_from_path(&bad).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));
    }

    #[tokio::test]
    async fn test_discovered_config_must_parse() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("papersum.yaml");
        std::fs::write(&bad, "bind: [unclosed").unwrap();

        let err = Config::load_discovered(Some(&bad)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "YAML", .. }));

        let config = Config::load_discovered(None).await.unwrap();
        assert!(config.source_path.is_none());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = Config {
            llm: LlmConfig::default().with_api_key("secret"),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
