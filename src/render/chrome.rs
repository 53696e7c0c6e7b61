use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::{PageRenderer, WaitCondition};
use crate::error::RenderError;

/// Headless Chromium driven over CDP.
///
/// Owns the browser process; `close()` shuts it down and Drop aborts the
/// event handler if `close()` was never reached.
pub struct ChromeRenderer {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    poll_interval: Duration,
}

impl ChromeRenderer {
    pub async fn launch(
        user_agent: &str,
        headless: bool,
        poll_interval: Duration,
    ) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", user_agent));
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(RenderError::Launch(e.to_string()));
            }
        };

        info!("Headless browser ready (headless: {})", headless);

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            poll_interval,
        })
    }

    async fn evaluate_bool(&self, script: &str) -> bool {
        match self.page.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!("Condition check failed, treating as unmet: {}", e);
                false
            }
        }
    }
}

fn condition_script(condition: &WaitCondition) -> String {
    match condition {
        WaitCondition::DocumentReady => "document.readyState === 'complete'".to_string(),
        WaitCondition::AnyPresent(selectors) => {
            let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
            format!(
                "(() => {{ try {{ \
                 return {}.some(s => document.querySelector(s) !== null); \
                 }} catch (e) {{ return false; }} }})()",
                list
            )
        }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_to(&self, offset: u64) -> Result<(), RenderError> {
        self.page
            .evaluate(format!("window.scrollTo(0, {});", offset))
            .await
            .map_err(|e| RenderError::Command {
                command: "scroll_to",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, RenderError> {
        let result = self
            .page
            .evaluate("document.body ? document.body.scrollHeight : 0")
            .await
            .map_err(|e| RenderError::Command {
                command: "scroll_height",
                reason: e.to_string(),
            })?;

        let height = result.into_value::<f64>().map_err(|e| RenderError::Command {
            command: "scroll_height",
            reason: e.to_string(),
        })?;
        Ok(height.max(0.0) as u64)
    }

    async fn wait_until(
        &self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<bool, RenderError> {
        let script = condition_script(condition);
        let deadline = Instant::now() + timeout;

        loop {
            if self.evaluate_bool(&script).await {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn snapshot(&self) -> Result<String, RenderError> {
        self.page.content().await.map_err(|e| RenderError::Command {
            command: "snapshot",
            reason: e.to_string(),
        })
    }

    async fn close(&self) -> Result<(), RenderError> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await.map_err(|e| RenderError::Command {
            command: "close",
            reason: e.to_string(),
        });
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        info!("Headless browser closed");
        closed.map(|_| ())
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_script_quotes_selectors() {
        let script = condition_script(&WaitCondition::AnyPresent(vec![
            "#product-list-container".to_string(),
            "a[data-x=\"1\"]".to_string(),
        ]));
        assert!(script.contains(r##"["#product-list-container","a[data-x=\"1\"]"]"##));
        assert!(script.starts_with("(() => {"));
    }

    #[test]
    fn ready_script_checks_complete_state() {
        assert_eq!(
            condition_script(&WaitCondition::DocumentReady),
            "document.readyState === 'complete'"
        );
    }
}
