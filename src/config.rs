use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable that supplies the TMDb API key when the config file doesn't.
pub const TMDB_KEY_ENV: &str = "SHELFMARK_TMDB_KEY";

/// Application configuration loaded from TOML config file.
/// Every field has a default; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// Insert one example item when the catalog is empty.
    pub seed_example: bool,
    /// Poster lookup settings.
    pub posters: PosterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            seed_example: true,
            posters: PosterConfig::default(),
        }
    }
}

/// TMDb poster lookup configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    /// Movie search endpoint.
    pub api_url: String,
    /// Prefix joined to a result's `poster_path`.
    pub image_base_url: String,
    pub timeout_secs: u64,
    /// Delay between lookups during an import, in milliseconds.
    pub rate_limit_ms: u64,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_url: "https://api.themoviedb.org/3/search/movie".into(),
            image_base_url: "https://image.tmdb.org/t/p/w342".into(),
            timeout_secs: 10,
            rate_limit_ms: 250,
        }
    }
}

impl PosterConfig {
    /// The configured key, else the environment's. Blank counts as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(TMDB_KEY_ENV).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

impl AppConfig {
    /// Load config from `~/.config/shelfmark/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Database path: explicit argument, then config, then the XDG default.
    pub fn resolve_db_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.db_path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join("shelfmark.db")
    } else {
        // Fallback: current directory
        PathBuf::from("shelfmark.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert!(config.seed_example);
        assert!(config.db_path.is_none());
        assert!(config.posters.enabled);
        assert_eq!(config.posters.timeout_secs, 10);
        assert_eq!(config.posters.rate_limit_ms, 250);
    }

    #[test]
    fn test_partial_poster_section() {
        let config = AppConfig::parse(
            r#"
            seed_example = false
            db_path = "/tmp/films.db"

            [posters]
            api_key = "abc123"
            rate_limit_ms = 0
            "#,
        )
        .unwrap();
        assert!(!config.seed_example);
        assert_eq!(config.posters.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.posters.rate_limit_ms, 0);
        assert!(config.posters.api_url.ends_with("/search/movie"));
        assert_eq!(config.resolve_db_path(None), PathBuf::from("/tmp/films.db"));
        assert_eq!(
            config.resolve_db_path(Some("/x.db".into())),
            PathBuf::from("/x.db")
        );
    }

    #[test]
    fn test_configured_key_wins_and_blank_is_missing() {
        let posters = PosterConfig {
            api_key: Some(" k ".into()),
            ..PosterConfig::default()
        };
        assert_eq!(posters.resolve_api_key().as_deref(), Some("k"));

        let posters = PosterConfig {
            api_key: Some("   ".into()),
            ..PosterConfig::default()
        };
        assert_eq!(posters.resolve_api_key(), None);
    }

    #[test]
    fn test_bad_type_is_an_error() {
        assert!(AppConfig::parse("seed_example = \"yes\"").is_err());
    }
}
