use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::RenderError;

pub fn create_client(user_agent: &str) -> Result<Client, RenderError> {
    let client = ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(25))
        .cookie_store(true)
        .build()?;

    Ok(client)
}

/// GET with exponential backoff on transport errors and 5xx responses.
///
/// Any other status is returned to the caller as-is.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    max_retries: u32,
) -> Result<Response, RenderError> {
    let max_retries = max_retries.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let outcome = match client.get(url).send().await {
            Ok(response) if !response.status().is_server_error() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                warn!("HTTP error {}: {}", status, url);
                Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason: format!("HTTP error: {}", status),
                })
            }
            Err(e) => {
                error!("Request failed for {}: {}", url, e);
                Err(RenderError::Http(e))
            }
        };

        if attempts >= max_retries {
            return outcome;
        }

        let delay = Duration::from_secs(2u64.pow(attempts));
        warn!("Retrying in {:?}... (attempt {}/{})", delay, attempts + 1, max_retries);
        sleep(delay).await;
    }
}
