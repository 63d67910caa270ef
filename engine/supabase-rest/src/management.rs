//! Supabase Management API: raw SQL against the project database

use crate::error::{RestError, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

const MANAGEMENT_BASE: &str = "https://api.supabase.com/v1";

/// Attempts before giving up on a rate-limited query
const MAX_ATTEMPTS: u32 = 5;

/// Runs SQL through `/v1/projects/<ref>/database/query`
pub struct ManagementClient {
    client: Client,
    base_url: String,
    project_ref: String,
    access_token: String,
    /// Seconds per retry step; the wait is `step * (attempt + 1)`
    backoff_step_secs: u64,
}

impl ManagementClient {
    pub fn new(project_ref: &str, access_token: &str) -> Result<Self> {
        if project_ref.trim().is_empty() {
            return Err(RestError::missing_credential("SUPABASE_PROJECT_REF"));
        }
        if access_token.trim().is_empty() {
            return Err(RestError::missing_credential("SUPABASE_ACCESS_TOKEN"));
        }
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: MANAGEMENT_BASE.to_string(),
            project_ref: project_ref.to_string(),
            access_token: access_token.to_string(),
            backoff_step_secs: 10,
        })
    }

    /// Point at a different API host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_backoff_step(mut self, secs: u64) -> Self {
        self.backoff_step_secs = secs;
        self
    }

    pub fn query_url(&self) -> String {
        format!("{}/projects/{}/database/query", self.base_url, self.project_ref)
    }

    /// Wait before retry number `attempt` (0-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_step_secs * u64::from(attempt + 1))
    }

    /// Run one SQL statement (or a `;`-separated script)
    ///
    /// 429 and 403 are treated as rate limiting and retried.
    pub async fn query(&self, sql: &str) -> Result<Value> {
        for attempt in 0..MAX_ATTEMPTS {
            let response = self
                .client
                .post(self.query_url())
                .bearer_auth(&self.access_token)
                .json(&json!({ "query": sql }))
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
                let wait = self.retry_delay(attempt);
                warn!("Rate limited, waiting {}s...", wait.as_secs());
                tokio::time::sleep(wait).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(RestError::status("Management query", status.as_u16(), &body));
        }

        Err(RestError::RateLimited { context: "Management query".to_string(), attempts: MAX_ATTEMPTS })
    }

    /// Run statements one at a time, returning how many succeeded
    pub async fn execute_all(&self, statements: &[String]) -> (usize, Vec<(usize, RestError)>) {
        let mut ok = 0;
        let mut failures = Vec::new();
        for (i, sql) in statements.iter().enumerate() {
            match self.query(sql).await {
                Ok(_) => ok += 1,
                Err(e) => failures.push((i, e)),
            }
        }
        info!(ok, failed = failures.len(), "Executed SQL statements");
        (ok, failures)
    }
}
