use std::collections::HashSet;
use std::fmt;
use tracing::{error, info, warn};

use crate::config::{Config, SiteConfig};
use crate::error::Result;
use crate::models::{PageResult, ProductRecord, RecordKey};
use crate::render::{PageFetch, PageRenderer, ReadinessController};
use crate::scrapers::ProductExtractor;
use crate::storage::{save_all, OutputSink};

/// Deduplicated records in first-seen order.
#[derive(Debug, Default)]
pub struct CrawlAccumulator {
    seen: HashSet<RecordKey>,
    records: Vec<ProductRecord>,
    duplicates: usize,
}

impl CrawlAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the page's records that have not been seen yet. Returns how many
    /// were new.
    pub fn merge(&mut self, page: PageResult) -> usize {
        let before = self.records.len();
        for record in page.into_records() {
            if self.seen.insert(record.key()) {
                self.records.push(record);
            } else {
                self.duplicates += 1;
            }
        }
        self.records.len() - before
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Page 1 timed out or had no tiles: the site layout or tile selector is likely broken.
    NothingOnFirstPage,
    /// A later page's readiness wait timed out.
    Exhausted { page: u32 },
    /// A later page rendered with zero tiles.
    EmptyPage { page: u32 },
    /// The page ceiling was reached.
    PageCap { cap: u32 },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NothingOnFirstPage => write!(f, "no products found on the first page"),
            Termination::Exhausted { page } => {
                write!(f, "page {} did not render listing content", page)
            }
            Termination::EmptyPage { page } => write!(f, "page {} had no products", page),
            Termination::PageCap { cap } => write!(f, "reached page cap ({})", cap),
        }
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub records: Vec<ProductRecord>,
    /// Pages whose records were merged.
    pub pages_crawled: u32,
    pub duplicates_dropped: usize,
    pub termination: Termination,
}

/// Fetches listing pages one at a time until the listing runs out.
pub struct Crawler {
    site: SiteConfig,
    readiness: ReadinessController,
    extractor: ProductExtractor,
    page_cap: u32,
    checkpoint_sinks: Vec<Box<dyn OutputSink>>,
}

impl Crawler {
    pub fn new(
        site: SiteConfig,
        readiness: ReadinessController,
        extractor: ProductExtractor,
        page_cap: u32,
    ) -> Self {
        Self {
            site,
            readiness,
            extractor,
            page_cap: page_cap.max(1),
            checkpoint_sinks: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let site = config.active_site()?.clone();
        let readiness = ReadinessController::new(config.readiness.clone(), &site.container_markers);
        let extractor = ProductExtractor::for_site(&site)?;
        Ok(Self::new(site, readiness, extractor, config.page_cap()?))
    }

    /// Rewrite these sinks with the accumulated records after every merged page.
    pub fn with_checkpoints(mut self, sinks: Vec<Box<dyn OutputSink>>) -> Self {
        self.checkpoint_sinks = sinks;
        self
    }

    pub async fn run<R>(&self, renderer: &R) -> Result<CrawlReport>
    where
        R: PageRenderer + ?Sized,
    {
        info!(
            "Crawling {} (page cap {}, discount policy {:?})",
            self.site.name,
            self.page_cap,
            self.extractor.discount_policy()
        );

        let mut accumulated = CrawlAccumulator::new();
        let mut page: u32 = 1;

        let termination = loop {
            let url = self.site.page_url(page)?;
            info!("Visiting page {}: {}", page, url);

            let html = match self.readiness.fetch(renderer, url.as_str()).await? {
                PageFetch::Ready(html) => html,
                PageFetch::Exhausted(reason) => {
                    warn!("Page {} exhausted: {:?}", page, reason);
                    break if page == 1 {
                        Termination::NothingOnFirstPage
                    } else {
                        Termination::Exhausted { page }
                    };
                }
            };

            let result = self.extractor.extract(&html);
            let tiles = result.tile_count();
            if result.is_empty() {
                break if page == 1 {
                    Termination::NothingOnFirstPage
                } else {
                    info!("Page {} has no products, end of listing", page);
                    Termination::EmptyPage { page }
                };
            }

            let added = accumulated.merge(result);
            info!(
                "Page {}: {} tiles, {} new, {} total",
                page,
                tiles,
                added,
                accumulated.len()
            );

            if !self.checkpoint_sinks.is_empty() {
                save_all(&self.checkpoint_sinks, accumulated.records())?;
            }

            if page >= self.page_cap {
                info!("Reached page cap ({}). Stopping.", self.page_cap);
                break Termination::PageCap { cap: self.page_cap };
            }
            page += 1;
        };

        if termination == Termination::NothingOnFirstPage {
            error!("No products found on the first page of {}", self.site.name);
        }

        let pages_crawled = match termination {
            Termination::NothingOnFirstPage => 0,
            Termination::Exhausted { page } | Termination::EmptyPage { page } => page - 1,
            Termination::PageCap { cap } => cap,
        };

        Ok(CrawlReport {
            pages_crawled,
            duplicates_dropped: accumulated.duplicates(),
            records: accumulated.into_records(),
            termination,
        })
    }

    /// Run the crawl, then release the renderer whatever the outcome.
    pub async fn run_and_close<R>(&self, renderer: &R) -> Result<CrawlReport>
    where
        R: PageRenderer + ?Sized,
    {
        let outcome = self.run(renderer).await;
        if let Err(e) = renderer.close().await {
            warn!("Failed to release renderer: {}", e);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, price: Option<f64>) -> ProductRecord {
        ProductRecord {
            brand: Some("Ray-Ban".to_string()),
            name: Some(name.to_string()),
            list_price: price,
            current_price: price,
            discount: None,
        }
    }

    #[test]
    fn merge_drops_exact_duplicates() {
        let mut acc = CrawlAccumulator::new();
        let first = PageResult::new(vec![record("RB1", Some(10.0)), record("RB2", None)]);
        let second = PageResult::new(vec![record("RB2", None), record("RB3", Some(5.0))]);
        assert_eq!(acc.merge(first), 2);
        assert_eq!(acc.merge(second), 1);
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.duplicates(), 1);
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let mut acc = CrawlAccumulator::new();
        acc.merge(PageResult::new(vec![record("B", None), record("A", None)]));
        acc.merge(PageResult::new(vec![record("C", None), record("A", None)]));
        let names: Vec<&str> = acc.records().iter().filter_map(|r| r.name.as_deref()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn records_differing_in_one_field_are_distinct() {
        let mut acc = CrawlAccumulator::new();
        acc.merge(PageResult::new(vec![record("RB1", Some(10.0)), record("RB1", Some(11.0))]));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn blank_records_deduplicate_among_themselves() {
        let mut acc = CrawlAccumulator::new();
        acc.merge(PageResult::new(vec![ProductRecord::default(), ProductRecord::default()]));
        assert_eq!(acc.len(), 1);
        assert!(acc.records()[0].is_blank());
    }

    #[test]
    fn termination_messages() {
        assert_eq!(Termination::PageCap { cap: 50 }.to_string(), "reached page cap (50)");
        assert_eq!(Termination::EmptyPage { page: 3 }.to_string(), "page 3 had no products");
    }
}
