//! Connection settings for the Supabase project

use crate::error::{RestError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supabase project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://abcd.supabase.co")
    pub url: String,

    /// Public anon key, used for reads
    pub anon_key: String,

    /// Service role key, used for writes when present
    pub service_role_key: Option<String>,

    /// Personal access token for the Management API
    pub access_token: Option<String>,

    /// Project ref for the Management API
    pub project_ref: Option<String>,

    /// Rows per page for paginated reads
    pub page_size: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry configuration for rate-limited writes
    pub retry: RetryConfig,
}

/// Exponential backoff settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub max_retries: u32,

    /// Initial retry delay in seconds
    pub initial_delay_secs: u64,

    /// Maximum retry delay in seconds
    pub max_delay_secs: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_role_key: None,
            access_token: None,
            project_ref: None,
            page_size: 1000,
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay_secs: 5, max_delay_secs: 300, backoff_multiplier: 2.0 }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay_secs as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = secs.min(self.max_delay_secs as f64).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self { url: url.into(), anon_key: anon_key.into(), ..Self::default() }
    }

    /// Key used for writes: service role when present, else anon
    pub fn write_key(&self) -> &str {
        self.service_role_key.as_deref().filter(|k| !k.is_empty()).unwrap_or(&self.anon_key)
    }

    /// `<url>/rest/v1`
    pub fn rest_base(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }

    /// `<url>/storage/v1`
    pub fn storage_base(&self) -> String {
        format!("{}/storage/v1", self.url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the REST endpoints can be reached at all
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(RestError::missing_credential("SUPABASE_URL"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(RestError::missing_credential("SUPABASE_ANON_KEY"));
        }
        if self.page_size == 0 {
            return Err(RestError::unexpected("page_size must be greater than zero"));
        }
        Ok(())
    }
}
