//! Page rendering: the renderer seam, the readiness protocol driven over it,
//! and the concrete browser/HTTP adapters.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::RenderError;

mod chrome;
mod http;
mod readiness;

pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;
pub use readiness::{ExhaustReason, PageFetch, ReadinessController, ReadinessState};

/// Something a renderer can be asked to wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// `document.readyState == "complete"`.
    DocumentReady,
    /// At least one of the CSS selectors matches.
    AnyPresent(Vec<String>),
}

/// The operations the crawl needs from a page renderer.
///
/// A renderer holds one live page; `navigate` replaces its contents.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), RenderError>;

    async fn scroll_to(&self, offset: u64) -> Result<(), RenderError>;

    async fn scroll_height(&self) -> Result<u64, RenderError>;

    /// Returns `false` when the timeout elapses first.
    async fn wait_until(
        &self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<bool, RenderError>;

    /// Serialized DOM of the current page.
    async fn snapshot(&self) -> Result<String, RenderError>;

    /// Release the underlying resource.
    async fn close(&self) -> Result<(), RenderError> {
        Ok(())
    }
}
