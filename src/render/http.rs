use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{PageRenderer, WaitCondition};
use crate::error::RenderError;
use crate::utils::http::{create_client, fetch_with_retry};

const EMPTY_DOCUMENT: &str = "<html><head></head><body></body></html>";

/// Plain HTTP "renderer" for listings that are server-rendered.
///
/// No scripts run: scrolling does nothing and the page height never grows,
/// so lazy expansion ends after one round. Non-success responses load an
/// empty document, which the container wait then reports as exhausted.
pub struct HttpRenderer {
    client: Client,
    max_retries: u32,
    document: Mutex<Option<String>>,
}

impl HttpRenderer {
    pub fn new(user_agent: &str, max_retries: u32) -> Result<Self, RenderError> {
        Ok(Self::with_client(create_client(user_agent)?, max_retries))
    }

    pub fn with_client(client: Client, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
            document: Mutex::new(None),
        }
    }
}

fn any_present(html: &str, selectors: &[String]) -> bool {
    let document = Html::parse_document(html);
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .any(|selector| document.select(&selector).next().is_some())
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        let response = fetch_with_retry(&self.client, url, self.max_retries).await?;
        let status = response.status();

        let body = if status.is_success() {
            response.text().await?
        } else {
            warn!("HTTP {} for {}, treating as empty page", status, url);
            EMPTY_DOCUMENT.to_string()
        };

        info!("Fetched {} ({} bytes)", url, body.len());
        *self.document.lock().await = Some(body);
        Ok(())
    }

    async fn scroll_to(&self, _offset: u64) -> Result<(), RenderError> {
        Ok(())
    }

    /// Static documents never scroll.
    async fn scroll_height(&self) -> Result<u64, RenderError> {
        Ok(0)
    }

    async fn wait_until(
        &self,
        condition: &WaitCondition,
        _timeout: Duration,
    ) -> Result<bool, RenderError> {
        let document = self.document.lock().await;
        let Some(html) = document.as_deref() else {
            return Ok(false);
        };

        Ok(match condition {
            WaitCondition::DocumentReady => true,
            WaitCondition::AnyPresent(selectors) => any_present(html, selectors),
        })
    }

    async fn snapshot(&self) -> Result<String, RenderError> {
        self.document.lock().await.clone().ok_or(RenderError::Command {
            command: "snapshot",
            reason: "no page has been loaded".to_string(),
        })
    }
}
