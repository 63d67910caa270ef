use crate::batch::{pad_rows, parse_content_range, BatchError, Row, UpsertOptions, UpsertSummary};
use crate::config::SupabaseConfig;
use crate::error::{RestError, Result};
use crate::query::Select;
use crate::store::RestStore;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, warn};

/// PostgREST client for one Supabase project
pub struct SupabaseClient {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseClient {
    /// Create a new client instance
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn read(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    fn write(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.config.write_key();
        builder.header("apikey", key).bearer_auth(key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.rest_base(), table)
    }

    /// POST one batch, retrying on 429
    async fn post_batch(&self, table: &str, batch: &[Row], options: &UpsertOptions) -> Result<()> {
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            let mut request = self
                .write(self.client.post(self.table_url(table)))
                .header("Content-Type", "application/json")
                .header("Prefer", options.prefer_header())
                .json(batch);
            if let Some(on_conflict) = &options.on_conflict {
                request = request.query(&[("on_conflict", on_conflict)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= retry.max_retries {
                    return Err(RestError::RateLimited {
                        context: format!("POST {table}"),
                        attempts: attempt + 1,
                    });
                }
                let delay = retry.delay_for(attempt);
                warn!(table, attempt, ?delay, "Rate limited, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(RestError::status(format!("POST {table}"), status.as_u16(), &body));
        }
    }
}

#[async_trait::async_trait]
impl RestStore for SupabaseClient {
    async fn select_all(&self, query: &Select) -> Result<Vec<Row>> {
        let limit = self.config.page_size;
        let mut offset = 0;
        let mut rows = Vec::new();

        loop {
            debug!("GET {}", query.to_query_string(offset, limit));
            let response = self
                .read(self.client.get(self.table_url(query.table_name())))
                .query(&query.query_pairs(offset, limit))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RestError::status(
                    format!("GET {}", query.table_name()),
                    status.as_u16(),
                    &body,
                ));
            }

            let page: Vec<Row> = response.json().await?;
            if page.is_empty() {
                break;
            }
            rows.extend(page);
            offset += limit;
        }

        debug!(table = query.table_name(), rows = rows.len(), "Fetched all pages");
        Ok(rows)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        options: UpsertOptions,
    ) -> Result<UpsertSummary> {
        let padded = pad_rows(rows);
        let total = padded.len();
        let batch_size = options.batch_size.max(1);
        let mut summary = UpsertSummary::default();

        for (i, batch) in padded.chunks(batch_size).enumerate() {
            let offset = i * batch_size;
            match self.post_batch(table, batch, &options).await {
                Ok(()) => summary.written += batch.len(),
                Err(e) => {
                    let status = match &e {
                        RestError::Status { status, .. } => Some(*status),
                        RestError::RateLimited { .. } => Some(429),
                        _ => None,
                    };
                    warn!(table, offset, error = %e, "Batch failed");
                    summary.failed += batch.len();
                    summary.errors.push(BatchError {
                        offset,
                        rows: batch.len(),
                        status,
                        message: e.to_string(),
                    });
                }
            }

            let done = (offset + batch.len()).min(total);
            if done % 2000 < batch_size || done == total {
                info!(table, "{}/{} rows", done, total);
            }
        }

        Ok(summary)
    }

    async fn patch(&self, table: &str, match_col: &str, match_val: &str, updates: &Row) -> Result<()> {
        let filter = format!("eq.{match_val}");
        let response = self
            .write(self.client.patch(self.table_url(table)))
            .query(&[(match_col, filter.as_str())])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(updates)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::status(format!("PATCH {table}"), status.as_u16(), &body));
        }
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let response = self
            .read(self.client.get(self.table_url(table)))
            .query(&[("select", "*"), ("limit", "1")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::status(format!("COUNT {table}"), status.as_u16(), &body));
        }

        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        parse_content_range(header)
            .ok_or_else(|| RestError::unexpected(format!("bad content-range '{header}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::row;
    use crate::config::RetryConfig;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    struct Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    }

    fn reply(status: u16, body: &str) -> Reply {
        Reply { status, headers: Vec::new(), body: body.to_string() }
    }

    /// Read one request and return its request line
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-request");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        head.lines().next().unwrap_or_default().to_string()
    }

    /// Local HTTP server answering one connection per scripted reply, in order
    async fn stub_server(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        tokio::spawn(async move {
            for reply in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request_line = read_request(&mut stream).await;
                seen.lock().unwrap().push(request_line);

                let mut head = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for (name, value) in &reply.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("\r\n");
                stream.write_all(head.as_bytes()).await.unwrap();
                stream.write_all(reply.body.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{addr}"), requests)
    }

    fn client(url: &str, max_retries: u32) -> SupabaseClient {
        let mut config = SupabaseConfig::new(url, "anon");
        config.page_size = 2;
        config.timeout_secs = 5;
        config.retry = RetryConfig {
            max_retries,
            initial_delay_secs: 0,
            max_delay_secs: 0,
            backoff_multiplier: 2.0,
        };
        SupabaseClient::new(config).unwrap()
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| row([("player_id", json!(format!("p{i}")))])).collect()
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        assert!(matches!(
            SupabaseClient::new(SupabaseConfig::default()),
            Err(RestError::MissingCredential(_))
        ));

        let client = SupabaseClient::new(SupabaseConfig::new("https://x.supabase.co", "anon")).unwrap();
        assert_eq!(client.table_url("players"), "https://x.supabase.co/rest/v1/players");
    }

    #[tokio::test]
    async fn test_upsert_retries_after_rate_limit() {
        let (url, requests) = stub_server(vec![reply(429, ""), reply(201, "")]).await;
        let client = client(&url, 2);

        let summary = client
            .upsert("players", rows(1), UpsertOptions::batch(10).on_conflict(&["player_id"]))
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        assert!(summary.errors.is_empty());
        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].starts_with("POST /rest/v1/players?on_conflict=player_id"));
    }

    #[tokio::test]
    async fn test_upsert_gives_up_after_max_retries() {
        let (url, _) = stub_server(vec![reply(429, ""), reply(429, "")]).await;
        let client = client(&url, 1);

        let summary = client.upsert("players", rows(1), UpsertOptions::batch(10)).await.unwrap();

        assert_eq!(summary.written, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].status, Some(429));
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let (url, requests) =
            stub_server(vec![reply(500, r#"{"message":"boom"}"#), reply(201, "")]).await;
        let client = client(&url, 0);

        let summary = client.upsert("players", rows(3), UpsertOptions::batch(2)).await.unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.errors.len(), 1);
        let error = &summary.errors[0];
        assert_eq!(error.offset, 0);
        assert_eq!(error.rows, 2);
        assert_eq!(error.status, Some(500));
        assert!(error.message.contains("boom"));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_select_all_reads_until_empty_page() {
        let (url, requests) = stub_server(vec![
            reply(200, r#"[{"player_id":"a"},{"player_id":"b"}]"#),
            reply(200, r#"[{"player_id":"c"}]"#),
            reply(200, "[]"),
        ])
        .await;
        let client = client(&url, 0);

        let rows = client.select_all(&Select::table("players").columns(&["player_id"])).await.unwrap();

        let ids: Vec<&str> = rows.iter().filter_map(|r| r["player_id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].contains("offset=0&limit=2"));
        assert!(requests[1].contains("offset=2&limit=2"));
        assert!(requests[2].contains("offset=4&limit=2"));
    }

    #[tokio::test]
    async fn test_count_reads_content_range() {
        let mut counted = reply(200, "[]");
        counted.headers.push(("Content-Range", "0-0/1234".to_string()));
        let (url, _) = stub_server(vec![counted]).await;

        assert_eq!(client(&url, 0).count("player_stats").await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_count_without_content_range_is_an_error() {
        let (url, _) = stub_server(vec![reply(200, "[]")]).await;

        assert!(matches!(
            client(&url, 0).count("player_stats").await,
            Err(RestError::UnexpectedResponse(_))
        ));
    }
}
