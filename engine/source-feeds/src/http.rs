use crate::error::{FeedError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Build the reqwest client a feed keeps for its lifetime
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Ok(Client::builder().user_agent(user_agent).timeout(timeout).build()?)
}

/// Send a GET and decode the JSON body, failing on non-2xx
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder, context: &str) -> Result<T> {
    let text = get_text(request, context).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Send a GET and return the body as text, failing on non-2xx
pub(crate) async fn get_text(request: RequestBuilder, context: &str) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(FeedError::status(context, status.as_u16(), &body));
    }
    debug!(context, bytes = body.len(), "Fetched");
    Ok(body)
}
