use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TELEGRAM_TOKEN_KEY: &str = "TELEGRAM_TOKEN";
pub const CHAT_ID_KEY: &str = "CHAT_ID";
pub const PRODUCT_URL_KEY: &str = "PRODUCT_URL";
pub const CONFIG_PATH_KEY: &str = "CONFIG_PATH";

const ENV_FILE_NAME: &str = ".env";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub chat_id: Option<String>,
    pub product_url: Option<String>,
    pub webdriver_url: String,
    pub telegram_api_url: String,
    pub ledger_path: Option<PathBuf>,
    pub page_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: None,
            chat_id: None,
            product_url: None,
            webdriver_url: "http://localhost:9515".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            ledger_path: None,
            page_timeout_secs: 15,
            notify_timeout_secs: 10,
            currency_symbol: "R$".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let toml_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&toml_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// Loads the optional TOML file, falling back to defaults when it does not exist.
    pub fn from_optional_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Overrides the three required values with whatever `lookup` yields.
    /// Blank values count as absent.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(TELEGRAM_TOKEN_KEY) {
            self.telegram_token = Some(token);
        }
        if let Some(chat_id) = lookup(CHAT_ID_KEY) {
            self.chat_id = Some(chat_id);
        }
        if let Some(url) = lookup(PRODUCT_URL_KEY) {
            self.product_url = Some(url);
        }
        self.telegram_token = non_blank(self.telegram_token);
        self.chat_id = non_blank(self.chat_id);
        self.product_url = non_blank(self.product_url);
        self
    }

    /// Builds the run configuration from the directory holding the executable:
    /// `.env` seeds the environment, the TOML file supplies tuning values and
    /// the environment wins for the three required keys.
    /// Problems are returned rather than logged since logging isn't set up yet.
    pub fn load(base_dir: &Path) -> (Self, Vec<ConfigError>) {
        let mut errors = vec![];
        if let Err(e) = load_env_file(&base_dir.join(ENV_FILE_NAME)) {
            errors.push(e);
        }

        let config_path = std::env::var(CONFIG_PATH_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join(CONFIG_FILE_NAME));

        let config = Self::from_optional_file(&config_path).unwrap_or_else(|e| {
            errors.push(e);
            Self::default()
        });

        (config.with_overrides(|key| std::env::var(key).ok()), errors)
    }
}

/// Seeds the environment from a `.env` file. A missing file is not an error.
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Directory of the running executable, or the working directory if it can't be resolved.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tracing_unwrap::ResultExt;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap_or_log();
        let config = Config::from_optional_file(&dir.path().join("nope.toml")).unwrap_or_log();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_timeout_secs, 15);
        assert_eq!(config.notify_timeout_secs, 10);
    }

    #[test]
    fn test_from_file_partial_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_log();
        writeln!(
            file,
            "webdriver_url = \"http://127.0.0.1:4444\"\nproduct_url = \"https://shop.example/item\"\npage_timeout_secs = 30"
        )
        .unwrap_or_log();

        let config = Config::from_file(file.path()).unwrap_or_log();
        assert_eq!(config.webdriver_url, "http://127.0.0.1:4444");
        assert_eq!(config.product_url.as_deref(), Some("https://shop.example/item"));
        assert_eq!(config.page_timeout_secs, 30);
        assert_eq!(config.notify_timeout_secs, 10);
        assert_eq!(config.telegram_token, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_log();
        writeln!(file, "page_timeout_secs = \"soon\"").unwrap_or_log();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap_or_log();
        assert!(load_env_file(&dir.path().join(".env")).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap_or_log();
        let path = dir.path().join(".env");
        fs::write(&path, "PRICE_WATCH_BROKEN='unterminated\n").unwrap_or_log();

        assert!(matches!(
            load_env_file(&path),
            Err(ConfigError::EnvFile { .. })
        ));
    }

    #[test]
    fn test_overrides_win_and_blank_is_absent() {
        let env: HashMap<&str, &str> = HashMap::from([
            (TELEGRAM_TOKEN_KEY, "123:abc"),
            (CHAT_ID_KEY, "   "),
        ]);
        let base = Config {
            telegram_token: Some("from-file".to_string()),
            chat_id: Some("42".to_string()),
            product_url: Some("https://shop.example/item".to_string()),
            ..Config::default()
        };

        let config = base.with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.telegram_token.as_deref(), Some("123:abc"));
        assert_eq!(config.chat_id, None);
        assert_eq!(config.product_url.as_deref(), Some("https://shop.example/item"));
    }

    #[test]
    fn test_missing_keys_yield_absent_values() {
        let config = Config::default().with_overrides(|_| None);
        assert_eq!(config.telegram_token, None);
        assert_eq!(config.chat_id, None);
        assert_eq!(config.product_url, None);
    }
}
