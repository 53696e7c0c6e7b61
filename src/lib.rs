//! Product listing extraction from paginated, script-rendered storefronts.
//!
//! A crawl renders each listing page, waits for lazy-loaded tiles, resolves
//! every tile's fields through ordered fallback locators, normalizes prices
//! and discounts, and accumulates deduplicated records across pages.

pub mod config;
pub mod crawl;
pub mod error;
pub mod models;
pub mod parsers;
pub mod render;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use crawl::{CrawlAccumulator, CrawlReport, Crawler, Termination};
pub use error::{HarvestError, RenderError};
pub use models::{CandidateLocatorList, PageResult, ProductRecord};
