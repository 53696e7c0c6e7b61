use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{HarvestError, Result};
use crate::models::CandidateLocatorList;
use crate::parsers::DiscountPolicy;

const DEFAULT_CONFIG_NAME: &str = "harvest";
const DEFAULT_SAFETY_CAP: u32 = 50;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.265 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key into `sites` for this run.
    pub site: String,
    pub sites: HashMap<String, SiteConfig>,
    pub user_agent: String,
    pub renderer: RendererKind,
    pub headless: bool,
    /// Hard page ceiling, independent of content.
    pub max_pages: u32,
    /// Rewrite the output files after every merged page.
    pub checkpoint_each_page: bool,
    pub output: OutputConfig,
    pub readiness: ReadinessConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Chrome,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    /// Absent for single-page listings.
    pub pagination: Option<PaginationConfig>,
    pub tile_selector: String,
    /// Any of these present means the listing has rendered.
    pub container_markers: Vec<String>,
    pub locators: FieldLocators,
    pub offer_falls_back_to_list: bool,
    pub discount_policy: DiscountPolicy,
    /// Element scanned for a currency amount when no list-price locator resolves.
    pub price_scan_scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page_param: String,
    #[serde(default)]
    pub extra_query: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLocators {
    pub brand: CandidateLocatorList,
    pub name: CandidateLocatorList,
    pub list_price: CandidateLocatorList,
    pub current_price: CandidateLocatorList,
    pub discount: CandidateLocatorList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    pub document_ready_timeout_ms: u64,
    pub scroll_step_px: u64,
    pub settle_ms: u64,
    pub max_scroll_iterations: u32,
    pub container_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            document_ready_timeout_ms: 30_000,
            scroll_step_px: 900,
            settle_ms: 1_800,
            max_scroll_iterations: 10,
            container_timeout_ms: 15_000,
            poll_interval_ms: 250,
        }
    }
}

impl ReadinessConfig {
    pub fn document_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.document_ready_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn container_timeout(&self) -> Duration {
        Duration::from_millis(self.container_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut sites = HashMap::new();
        sites.insert("framesdirect".to_string(), SiteConfig::framesdirect());
        sites.insert("glasses".to_string(), SiteConfig::glasses());

        Config {
            site: "framesdirect".to_string(),
            sites,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            renderer: RendererKind::Chrome,
            headless: true,
            max_pages: DEFAULT_SAFETY_CAP,
            checkpoint_each_page: true,
            output: OutputConfig {
                dir: PathBuf::from("extracted_data"),
                csv_path: None,
                json_path: None,
            },
            readiness: ReadinessConfig::default(),
        }
    }
}

impl Config {
    /// Built-in presets, then `harvest.{toml,yaml,json}` (or `$HARVEST_CONFIG`),
    /// then `HARVEST_*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<Self> {
        let path = std::env::var("HARVEST_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("HARVEST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let site = self.active_site()?;

        if self.max_pages == 0 {
            return Err(HarvestError::Validation {
                message: "max_pages must be at least 1".to_string(),
            });
        }

        if let Err(e) = scraper::Selector::parse(&site.tile_selector) {
            return Err(HarvestError::InvalidSelector {
                selector: site.tile_selector.clone(),
                reason: format!("{:?}", e),
            });
        }

        if site.container_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(HarvestError::Validation {
                message: format!("site '{}' has no container markers", self.site),
            });
        }

        site.page_url(1)?;
        Ok(())
    }

    pub fn active_site(&self) -> Result<&SiteConfig> {
        self.sites.get(&self.site).ok_or_else(|| {
            let mut known: Vec<&str> = self.sites.keys().map(String::as_str).collect();
            known.sort_unstable();
            HarvestError::UnknownSite {
                site: self.site.clone(),
                known: known.join(", "),
            }
        })
    }

    /// Effective page cap for the active site: single-page listings stop after page 1.
    pub fn page_cap(&self) -> Result<u32> {
        let site = self.active_site()?;
        Ok(if site.pagination.is_some() { self.max_pages } else { 1 })
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output
            .csv_path
            .clone()
            .unwrap_or_else(|| self.output.dir.join(format!("{}_data.csv", self.site)))
    }

    pub fn json_path(&self) -> PathBuf {
        self.output
            .json_path
            .clone()
            .unwrap_or_else(|| self.output.dir.join(format!("{}_data.json", self.site)))
    }
}

impl SiteConfig {
    /// FramesDirect eyeglasses: paginated, list and offer prices.
    pub fn framesdirect() -> Self {
        let mut extra_query = BTreeMap::new();
        extra_query.insert("type".to_string(), "pagestate".to_string());

        SiteConfig {
            name: "FramesDirect".to_string(),
            base_url: "https://www.framesdirect.com/eyeglasses/".to_string(),
            pagination: Some(PaginationConfig {
                page_param: "p".to_string(),
                extra_query,
            }),
            tile_selector: "div.prod-holder".to_string(),
            container_markers: vec![
                "#product-list-container".to_string(),
                ".product-list".to_string(),
                ".prod-holder".to_string(),
            ],
            locators: FieldLocators {
                brand: CandidateLocatorList::new([
                    "div.catalog-name",
                    ".catalog-name",
                    ".product-brand",
                    ".brand",
                ]),
                name: CandidateLocatorList::new([
                    "div.product_name",
                    ".product_name",
                    ".product-name",
                    "h2 a",
                    "h3 a",
                ]),
                list_price: CandidateLocatorList::new([
                    "div.catalog-retail-price",
                    ".prod-catalog-retail-price",
                    ".retail-price",
                    ".srp-price-was",
                    ".price .was",
                    ".product-price .was",
                    ".price-was",
                ]),
                current_price: CandidateLocatorList::new([
                    "div.catalog-price",
                    ".prod-aslowas",
                    ".aslowas",
                    ".offer-price",
                    ".sale-price",
                    ".srp-price-now",
                    ".price .sale",
                    ".product-price .sale",
                    ".product-price .current",
                    ".price-current",
                ]),
                discount: CandidateLocatorList::new([
                    "div.frame-discount",
                    ".frame-discount",
                    ".discount",
                    ".badge-discount",
                ]),
            },
            offer_falls_back_to_list: true,
            discount_policy: DiscountPolicy::StrictPercent,
            price_scan_scope: None,
        }
    }

    /// Glasses.com eyeglasses: one page, a single price per tile.
    pub fn glasses() -> Self {
        SiteConfig {
            name: "Glasses.com".to_string(),
            base_url: "https://www.glasses.com/gl-us/eyeglasses".to_string(),
            pagination: None,
            tile_selector: "a.product-tile".to_string(),
            container_markers: vec![".catalog-page".to_string()],
            locators: FieldLocators {
                brand: CandidateLocatorList::new(["div.product-info div.product-brand"]),
                name: CandidateLocatorList::new(["div.product-info div.product-code"]),
                list_price: CandidateLocatorList::new([
                    "div.product-prices .product-list-price",
                    "div.product-prices .product-offer-price",
                    "div.product-prices .product-price",
                    "div.product-prices .price-now",
                ]),
                current_price: CandidateLocatorList::default(),
                discount: CandidateLocatorList::new([".product-discount", ".badge-discount"]),
            },
            offer_falls_back_to_list: true,
            discount_policy: DiscountPolicy::StripOff,
            price_scan_scope: Some("div.product-info div.product-prices".to_string()),
        }
    }

    /// URL of the given 1-based page.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|source| HarvestError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })?;

        if let Some(pagination) = &self.pagination {
            let mut query = url.query_pairs_mut();
            query.append_pair(&pagination.page_param, &page.to_string());
            for (key, value) in &pagination.extra_query {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}
