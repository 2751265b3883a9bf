//! Read-only user configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bookconnect_core::Theme;
use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "config.json";
pub const CATALOG_ENV: &str = "BOOKCONNECT_CATALOG";
pub const LOG_ENV: &str = "BOOKCONNECT_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_path: Option<String>,
    pub theme: Option<Theme>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            theme: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Why the config file was ignored. Held until logging is up so the warning
/// reaches the log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    Unreadable { path: PathBuf, error: String },
    Invalid { path: PathBuf, error: String },
}

impl ConfigIssue {
    pub fn report(&self) {
        match self {
            ConfigIssue::Unreadable { path, error } => {
                warn!(path = %path.display(), error = %error, "config unreadable, using defaults");
            }
            ConfigIssue::Invalid { path, error } => {
                warn!(path = %path.display(), error = %error, "config invalid, using defaults");
            }
        }
    }
}

impl Config {
    /// Missing file gives defaults. An unreadable or malformed file also
    /// falls back to defaults and comes back as an issue to report.
    pub fn load(config_dir: &Path) -> (Self, Option<ConfigIssue>) {
        let path = config_dir.join(CONFIG_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return (Self::default(), None),
            Err(err) => {
                let issue = ConfigIssue::Unreadable {
                    path,
                    error: err.to_string(),
                };
                return (Self::default(), Some(issue));
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => (config, None),
            Err(err) => {
                let issue = ConfigIssue::Invalid {
                    path,
                    error: err.to_string(),
                };
                (Self::default(), Some(issue))
            }
        }
    }

    /// `BOOKCONNECT_CATALOG` wins over `catalog_path`.
    pub fn catalog_path(&self) -> Option<String> {
        std::env::var(CATALOG_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.catalog_path.clone())
    }

    /// `BOOKCONNECT_LOG` wins over `log_filter`.
    pub fn log_filter(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.log_filter.clone())
    }

    /// The configured theme, else the terminal's background.
    pub fn preferred_theme(&self) -> Theme {
        self.theme.unwrap_or_else(detect_terminal_theme)
    }
}

/// Reads `COLORFGBG` (`fg;bg` or `fg;default;bg`). Background colours 0-6
/// and 8 are dark.
pub fn detect_terminal_theme() -> Theme {
    let background = std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().map(str::to_string))
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        Some(0..=6 | 8) => Theme::Night,
        _ => Theme::Day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env_vars<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = env_lock().lock().unwrap();

        let prev = vars
            .iter()
            .map(|(key, _)| ((*key).to_string(), std::env::var_os(key)))
            .collect::<Vec<(String, Option<OsString>)>>();

        for (key, value) in vars {
            match value {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }

        let out = f();

        for (key, value) in prev {
            match value {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        out
    }

    fn temp_dir(name: &str) -> anyhow::Result<std::path::PathBuf> {
        let dir = std::env::temp_dir().join(format!(
            "bookconnect-config-{name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = temp_dir("missing")?;
        let (config, issue) = Config::load(&dir);
        assert_eq!(config, Config::default());
        assert_eq!(issue, None);
        assert_eq!(config.log_filter, "info");
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn partial_file_fills_defaults() -> anyhow::Result<()> {
        let dir = temp_dir("partial")?;
        fs::write(dir.join(CONFIG_FILE), r#"{ "theme": "night" }"#)?;
        let (config, issue) = Config::load(&dir);
        assert_eq!(issue, None);
        assert_eq!(config.theme, Some(Theme::Night));
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.log_filter, "info");
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn malformed_file_falls_back() -> anyhow::Result<()> {
        let dir = temp_dir("malformed")?;
        fs::write(dir.join(CONFIG_FILE), "{ not json")?;
        let (config, issue) = Config::load(&dir);
        assert_eq!(config, Config::default());
        match issue {
            Some(ConfigIssue::Invalid { path, error }) => {
                assert_eq!(path, dir.join(CONFIG_FILE));
                assert!(!error.is_empty());
            }
            other => panic!("expected an invalid-config issue, got {other:?}"),
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn env_overrides_catalog_and_log_filter() {
        let config = Config {
            catalog_path: Some("/srv/books.json".to_string()),
            theme: None,
            log_filter: "warn".to_string(),
        };

        with_env_vars(&[(CATALOG_ENV, None), (LOG_ENV, None)], || {
            assert_eq!(config.catalog_path().as_deref(), Some("/srv/books.json"));
            assert_eq!(config.log_filter(), "warn");
        });
        with_env_vars(
            &[(CATALOG_ENV, Some("/tmp/other.json")), (LOG_ENV, Some("debug"))],
            || {
                assert_eq!(config.catalog_path().as_deref(), Some("/tmp/other.json"));
                assert_eq!(config.log_filter(), "debug");
            },
        );
        with_env_vars(&[(CATALOG_ENV, Some("  ")), (LOG_ENV, Some(""))], || {
            assert_eq!(config.catalog_path().as_deref(), Some("/srv/books.json"));
            assert_eq!(config.log_filter(), "warn");
        });
    }

    #[test]
    fn colorfgbg_picks_theme() {
        with_env_vars(&[("COLORFGBG", Some("15;0"))], || {
            assert_eq!(detect_terminal_theme(), Theme::Night);
        });
        with_env_vars(&[("COLORFGBG", Some("0;default;15"))], || {
            assert_eq!(detect_terminal_theme(), Theme::Day);
        });
        with_env_vars(&[("COLORFGBG", Some("7;8"))], || {
            assert_eq!(detect_terminal_theme(), Theme::Night);
        });
        with_env_vars(&[("COLORFGBG", None)], || {
            assert_eq!(detect_terminal_theme(), Theme::Day);
        });
    }

    #[test]
    fn configured_theme_wins_over_terminal() {
        let config = Config {
            theme: Some(Theme::Day),
            ..Config::default()
        };
        with_env_vars(&[("COLORFGBG", Some("15;0"))], || {
            assert_eq!(config.preferred_theme(), Theme::Day);
            assert_eq!(Config::default().preferred_theme(), Theme::Night);
        });
    }
}
