use tokio::time::sleep;
use tracing::{debug, warn};

use super::{PageRenderer, WaitCondition};
use crate::config::ReadinessConfig;
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Loading,
    LazyExpanding,
    WaitForContainer,
    Ready,
    Exhausted(ExhaustReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    DocumentTimeout,
    ContainerTimeout,
}

/// Outcome of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Ready(String),
    /// A bounded wait ran out: no more listing content at this URL.
    Exhausted(ExhaustReason),
}

/// Drives a renderer from navigation to a stable listing snapshot.
#[derive(Debug, Clone)]
pub struct ReadinessController {
    settings: ReadinessConfig,
    container: WaitCondition,
}

impl ReadinessController {
    pub fn new(settings: ReadinessConfig, container_markers: &[String]) -> Self {
        let markers = container_markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            settings,
            container: WaitCondition::AnyPresent(markers),
        }
    }

    /// Navigate to `url` and return its DOM once listing content is present.
    ///
    /// Wait timeouts end in `PageFetch::Exhausted`; only renderer failures
    /// are errors.
    pub async fn fetch<R>(&self, renderer: &R, url: &str) -> Result<PageFetch, RenderError>
    where
        R: PageRenderer + ?Sized,
    {
        let mut state = ReadinessState::Loading;

        loop {
            debug!("{} -> {:?}", url, state);
            state = match state {
                ReadinessState::Loading => {
                    renderer.navigate(url).await?;
                    let timeout = self.settings.document_ready_timeout();
                    let ready = renderer
                        .wait_until(&WaitCondition::DocumentReady, timeout)
                        .await?;
                    if ready {
                        ReadinessState::LazyExpanding
                    } else {
                        warn!("Timed out waiting for document ready on {}", url);
                        ReadinessState::Exhausted(ExhaustReason::DocumentTimeout)
                    }
                }
                ReadinessState::LazyExpanding => {
                    let rounds = self.expand(renderer).await?;
                    debug!("Lazy expansion settled after {} scroll rounds", rounds);
                    ReadinessState::WaitForContainer
                }
                ReadinessState::WaitForContainer => {
                    let present = renderer
                        .wait_until(&self.container, self.settings.container_timeout())
                        .await?;
                    if present {
                        ReadinessState::Ready
                    } else {
                        warn!("Timed out waiting for listing container on {}", url);
                        ReadinessState::Exhausted(ExhaustReason::ContainerTimeout)
                    }
                }
                ReadinessState::Ready => return Ok(PageFetch::Ready(renderer.snapshot().await?)),
                ReadinessState::Exhausted(reason) => return Ok(PageFetch::Exhausted(reason)),
            };
        }
    }

    /// Scroll in fixed steps until the page height stops growing or the
    /// iteration cap is hit. Returns the number of rounds taken.
    ///
    /// A page reporting zero height cannot scroll, so nothing is attempted.
    async fn expand<R>(&self, renderer: &R) -> Result<u32, RenderError>
    where
        R: PageRenderer + ?Sized,
    {
        let mut last_height = renderer.scroll_height().await?;
        if last_height == 0 {
            return Ok(0);
        }

        for round in 1..=self.settings.max_scroll_iterations {
            renderer.scroll_to(self.settings.scroll_step_px * u64::from(round)).await?;
            sleep(self.settings.settle()).await;

            let height = renderer.scroll_height().await?;
            if height <= last_height {
                return Ok(round);
            }
            last_height = height;
        }

        Ok(self.settings.max_scroll_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Heights grow by `growth` per scroll until `max_height`.
    struct FakePage {
        document_ready: bool,
        container_present: bool,
        growth: u64,
        max_height: u64,
        height: Mutex<u64>,
        scrolls: Mutex<Vec<u64>>,
        navigated: Mutex<Vec<String>>,
    }

    impl FakePage {
        fn new(growth: u64, max_height: u64) -> Self {
            Self {
                document_ready: true,
                container_present: true,
                growth,
                max_height,
                height: Mutex::new(1_000),
                scrolls: Mutex::new(Vec::new()),
                navigated: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageRenderer for FakePage {
        async fn navigate(&self, url: &str) -> Result<(), RenderError> {
            self.navigated.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn scroll_to(&self, offset: u64) -> Result<(), RenderError> {
            self.scrolls.lock().unwrap().push(offset);
            let mut height = self.height.lock().unwrap();
            *height = (*height + self.growth).min(self.max_height);
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, RenderError> {
            Ok(*self.height.lock().unwrap())
        }

        async fn wait_until(
            &self,
            condition: &WaitCondition,
            _timeout: Duration,
        ) -> Result<bool, RenderError> {
            Ok(match condition {
                WaitCondition::DocumentReady => self.document_ready,
                WaitCondition::AnyPresent(_) => self.container_present,
            })
        }

        async fn snapshot(&self) -> Result<String, RenderError> {
            Ok("<html><div class=\"prod-holder\"></div></html>".to_string())
        }
    }

    fn controller() -> ReadinessController {
        let settings = ReadinessConfig {
            settle_ms: 0,
            ..ReadinessConfig::default()
        };
        ReadinessController::new(settings, &[".prod-holder".to_string()])
    }

    #[tokio::test]
    async fn ready_page_returns_snapshot() {
        let page = FakePage::new(0, 1_000);
        let fetch = controller().fetch(&page, "https://example.test/?p=1").await.unwrap();
        assert!(matches!(fetch, PageFetch::Ready(html) if html.contains("prod-holder")));
        assert_eq!(*page.navigated.lock().unwrap(), vec!["https://example.test/?p=1"]);
    }

    #[tokio::test]
    async fn scrolling_stops_once_height_is_stable() {
        let page = FakePage::new(500, 2_000);
        controller().fetch(&page, "https://example.test").await.unwrap();
        // 1000 -> 1500 -> 2000 -> 2000 (stable)
        assert_eq!(*page.scrolls.lock().unwrap(), vec![900, 1_800, 2_700]);
    }

    #[tokio::test]
    async fn scrolling_is_capped_on_endless_pages() {
        let page = FakePage::new(500, u64::MAX);
        controller().fetch(&page, "https://example.test").await.unwrap();
        assert_eq!(page.scrolls.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn missing_container_exhausts() {
        let mut page = FakePage::new(0, 1_000);
        page.container_present = false;
        let fetch = controller().fetch(&page, "https://example.test").await.unwrap();
        assert_eq!(fetch, PageFetch::Exhausted(ExhaustReason::ContainerTimeout));
    }

    #[tokio::test]
    async fn document_timeout_exhausts_without_scrolling() {
        let mut page = FakePage::new(500, 5_000);
        page.document_ready = false;
        let fetch = controller().fetch(&page, "https://example.test").await.unwrap();
        assert_eq!(fetch, PageFetch::Exhausted(ExhaustReason::DocumentTimeout));
        assert!(page.scrolls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_interval_is_honoured() {
        let page = FakePage::new(500, 1_500);
        let settings = ReadinessConfig::default();
        let controller = ReadinessController::new(settings, &[".prod-holder".to_string()]);

        let started = tokio::time::Instant::now();
        controller.fetch(&page, "https://example.test").await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(2 * 1_800));
    }

    #[tokio::test(start_paused = true)]
    async fn unscrollable_page_skips_expansion() {
        let page = FakePage::new(500, 5_000);
        *page.height.lock().unwrap() = 0;
        let controller = ReadinessController::new(
            ReadinessConfig::default(),
            &[".prod-holder".to_string()],
        );

        let started = tokio::time::Instant::now();
        let fetch = controller.fetch(&page, "https://example.test").await.unwrap();
        assert!(matches!(fetch, PageFetch::Ready(_)));
        assert!(page.scrolls.lock().unwrap().is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn blank_markers_are_dropped() {
        let controller = ReadinessController::new(
            ReadinessConfig::default(),
            &["".to_string(), " .product-list ".to_string()],
        );
        assert_eq!(
            controller.container,
            WaitCondition::AnyPresent(vec![".product-list".to_string()])
        );
    }
}
