//! Ingest configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use supabase_rest::SupabaseConfig;
use thiserror::Error;

/// Underdog's public rankings export
pub const DEFAULT_UNDERDOG_RANKINGS_URL: &str = concat!(
    "https://app.underdogfantasy.com/rankings/download/",
    "8f9df7e5-d6ab-4a51-87e1-f91f5c806912/",
    "ccf300b0-9197-5951-bd96-cba84ad71e86/",
    "978b95dd-7c25-467c-83c9-332d90a557a4",
    "?product=fantasy",
    "&product_experience_id=018e1234-5678-9abc-def0-123456789002",
    "&state_config_id=7b937c4c-58ae-467c-90e7-c8dc2202a02a",
);

/// Errors raised while loading or reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (add it to .env or the environment)")]
    MissingKey(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("failed to read config file: {0}")]
    File(#[from] ::config::ConfigError),
}

/// Main ingest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Supabase project and REST settings
    pub supabase: SupabaseConfig,

    /// Vendor API keys and endpoints
    pub sources: SourceSettings,

    /// Data directory and season settings
    pub data: DataSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Vendor API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// SportsData.io subscription key
    pub sportsdata_api_key: Option<String>,

    /// Footballguys projections API key
    pub fbg_api_key: Option<String>,

    /// NFFC API key
    pub nffc_api_key: Option<String>,

    /// Underdog rankings CSV download
    pub underdog_rankings_url: String,
}

/// Local data and season settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Root of the data directory (imports, matched, raw, clean, logs)
    pub data_dir: PathBuf,

    /// Season used for ADP rows, projections and the SportsData rookie class
    pub year: i32,

    /// Players drafted in this year or later are flagged as rookies on export
    pub rookie_draft_year: i32,

    /// First NFFC season with public draft history
    pub nffc_first_season: i32,

    /// NFFC season served by the public (non-historical) endpoints
    pub nffc_current_season: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            sportsdata_api_key: None,
            fbg_api_key: None,
            nffc_api_key: None,
            underdog_rankings_url: DEFAULT_UNDERDOG_RANKINGS_URL.to_string(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            year: 2026,
            rookie_draft_year: 2025,
            nffc_first_season: 2018,
            nffc_current_season: 2025,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl IngestConfig {
    /// Load `.env`, an optional TOML file, then environment overrides
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match file {
            Some(path) => ::config::Config::builder()
                .add_source(::config::File::from(path))
                .build()?
                .try_deserialize::<IngestConfig>()?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup; blank values are ignored
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("SUPABASE_URL") {
            self.supabase.url = v;
        }
        if let Some(v) = get("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = v;
        }
        if let Some(v) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = Some(v);
        }
        if let Some(v) = get("SUPABASE_ACCESS_TOKEN") {
            self.supabase.access_token = Some(v);
        }
        if let Some(v) = get("SUPABASE_PROJECT_REF") {
            self.supabase.project_ref = Some(v);
        }

        if let Some(v) = get("SPORTSDATA_API_KEY") {
            self.sources.sportsdata_api_key = Some(v);
        }
        if let Some(v) = get("FBG_API_KEY") {
            self.sources.fbg_api_key = Some(v);
        }
        if let Some(v) = get("NFFC_API_KEY") {
            self.sources.nffc_api_key = Some(v);
        }
        if let Some(v) = get("UNDERDOG_RANKINGS_URL") {
            self.sources.underdog_rankings_url = v;
        }

        if let Some(v) = get("INGEST_DATA_DIR") {
            self.data.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("INGEST_YEAR") {
            self.data.year = parse_year("INGEST_YEAR", &v)?;
        }
        if let Some(v) = get("INGEST_ROOKIE_YEAR") {
            self.data.rookie_draft_year = parse_year("INGEST_ROOKIE_YEAR", &v)?;
        }
        if let Some(v) = get("NFFC_CURRENT_SEASON") {
            self.data.nffc_current_season = parse_year("NFFC_CURRENT_SEASON", &v)?;
        }

        if let Some(v) = get("INGEST_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = get("INGEST_LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    /// Supabase settings, checked for the URL and anon key
    pub fn supabase(&self) -> Result<SupabaseConfig, ConfigError> {
        if self.supabase.url.is_empty() {
            return Err(ConfigError::MissingKey("SUPABASE_URL"));
        }
        if self.supabase.anon_key.is_empty() {
            return Err(ConfigError::MissingKey("SUPABASE_ANON_KEY"));
        }
        Ok(self.supabase.clone())
    }

    pub fn sportsdata_key(&self) -> Result<&str, ConfigError> {
        required(&self.sources.sportsdata_api_key, "SPORTSDATA_API_KEY")
    }

    pub fn fbg_key(&self) -> Result<&str, ConfigError> {
        required(&self.sources.fbg_api_key, "FBG_API_KEY")
    }

    pub fn nffc_key(&self) -> Result<&str, ConfigError> {
        required(&self.sources.nffc_api_key, "NFFC_API_KEY")
    }

    /// Management API credentials: (project ref, access token)
    pub fn management(&self) -> Result<(&str, &str), ConfigError> {
        let project_ref = required(&self.supabase.project_ref, "SUPABASE_PROJECT_REF")?;
        let token = required(&self.supabase.access_token, "SUPABASE_ACCESS_TOKEN")?;
        Ok((project_ref, token))
    }
}

fn required<'a>(value: &'a Option<String>, var: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().filter(|v| !v.is_empty()).ok_or(ConfigError::MissingKey(var))
}

fn parse_year(var: &'static str, value: &str) -> Result<i32, ConfigError> {
    value
        .parse::<i32>()
        .ok()
        .filter(|y| (1990..=2100).contains(y))
        .ok_or_else(|| ConfigError::InvalidValue { var, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.data.year, 2026);
        assert_eq!(config.data.nffc_first_season, 2018);
        assert_eq!(config.data.data_dir, PathBuf::from("data"));
        assert_eq!(config.sources.underdog_rankings_url, DEFAULT_UNDERDOG_RANKINGS_URL);
        assert!(config.sportsdata_key().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = IngestConfig::default();
        config
            .apply_env(lookup(&[
                ("SUPABASE_URL", "https://abc.supabase.co"),
                ("SUPABASE_ANON_KEY", "anon"),
                ("SUPABASE_SERVICE_ROLE_KEY", " "),
                ("SPORTSDATA_API_KEY", "sd-key"),
                ("INGEST_DATA_DIR", "/tmp/ingest"),
                ("INGEST_YEAR", "2027"),
                ("INGEST_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.supabase().unwrap().url, "https://abc.supabase.co");
        assert!(config.supabase.service_role_key.is_none());
        assert_eq!(config.sportsdata_key().unwrap(), "sd-key");
        assert_eq!(config.data.data_dir, PathBuf::from("/tmp/ingest"));
        assert_eq!(config.data.year, 2027);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_year_is_rejected() {
        let mut config = IngestConfig::default();
        let err = config.apply_env(lookup(&[("INGEST_YEAR", "next")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "INGEST_YEAR", .. }));
    }

    #[test]
    fn test_missing_credentials_are_named() {
        let config = IngestConfig::default();
        assert!(matches!(config.supabase(), Err(ConfigError::MissingKey("SUPABASE_URL"))));
        assert!(matches!(config.management(), Err(ConfigError::MissingKey("SUPABASE_PROJECT_REF"))));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.toml");
        std::fs::write(
            &path,
            "[data]\nyear = 2030\nrookie_draft_year = 2029\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = ::config::Config::builder()
            .add_source(::config::File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize::<IngestConfig>()
            .unwrap();
        assert_eq!(config.data.year, 2030);
        assert_eq!(config.data.rookie_draft_year, 2029);
        assert_eq!(config.data.nffc_current_season, 2025);
        assert_eq!(config.logging.level, "debug");
    }
}
