use scraper::{Html, Selector};
use tracing::debug;

use crate::config::{FieldLocators, SiteConfig};
use crate::error::{HarvestError, Result};
use crate::models::{Locator, PageResult, ProductRecord};
use crate::parsers::{find_currency_amount, normalize_discount, parse_price, DiscountPolicy};
use crate::scrapers::resolver::{resolve, DomNode};

/// Turns a rendered listing page into product records, one per tile.
///
/// Extraction never fails: a locator list that resolves nothing, or text that
/// does not normalize, leaves that single field `None`.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    tile: Selector,
    locators: FieldLocators,
    offer_falls_back_to_list: bool,
    discount_policy: DiscountPolicy,
    price_scan_scope: Option<Locator>,
}

impl ProductExtractor {
    pub fn new(tile_selector: &str, locators: FieldLocators) -> Result<Self> {
        let tile = Selector::parse(tile_selector).map_err(|e| HarvestError::InvalidSelector {
            selector: tile_selector.to_string(),
            reason: format!("{:?}", e),
        })?;

        Ok(Self {
            tile,
            locators,
            offer_falls_back_to_list: true,
            discount_policy: DiscountPolicy::default(),
            price_scan_scope: None,
        })
    }

    pub fn for_site(site: &SiteConfig) -> Result<Self> {
        Ok(Self::new(&site.tile_selector, site.locators.clone())?
            .with_offer_fallback(site.offer_falls_back_to_list)
            .with_discount_policy(site.discount_policy)
            .with_price_scan(site.price_scan_scope.as_deref()))
    }

    pub fn with_offer_fallback(mut self, enabled: bool) -> Self {
        self.offer_falls_back_to_list = enabled;
        self
    }

    pub fn with_discount_policy(mut self, policy: DiscountPolicy) -> Self {
        self.discount_policy = policy;
        self
    }

    pub fn with_price_scan(mut self, scope: Option<&str>) -> Self {
        self.price_scan_scope = scope.map(Locator::new).filter(|l| !l.is_degenerate());
        self
    }

    pub fn discount_policy(&self) -> DiscountPolicy {
        self.discount_policy
    }

    pub fn extract(&self, html: &str) -> PageResult {
        let document = Html::parse_document(html);
        let records: Vec<ProductRecord> = document
            .select(&self.tile)
            .map(|tile| self.extract_tile(&tile))
            .collect();

        let page = PageResult::new(records);
        if page.blank_count() > 0 {
            debug!("{} of {} tiles resolved no fields", page.blank_count(), page.tile_count());
        }
        page
    }

    pub fn extract_tile<N: DomNode>(&self, tile: &N) -> ProductRecord {
        let brand = resolve(tile, &self.locators.brand);
        let name = resolve(tile, &self.locators.name);

        let list_text = resolve(tile, &self.locators.list_price).or_else(|| self.scan_price(tile));
        let current_text = resolve(tile, &self.locators.current_price);
        let discount_text = resolve(tile, &self.locators.discount);

        let list_price = parse_price(list_text.as_deref());
        let mut current_price = parse_price(current_text.as_deref());
        if current_price.is_none() && self.offer_falls_back_to_list {
            current_price = list_price;
        }

        ProductRecord {
            brand,
            name,
            list_price,
            current_price,
            discount: normalize_discount(discount_text.as_deref(), self.discount_policy),
        }
    }

    fn scan_price<N: DomNode>(&self, tile: &N) -> Option<String> {
        let scope = tile.select_one(self.price_scan_scope.as_ref()?)?;
        let text = scope.text_of();
        find_currency_amount(&text).map(str::to_string)
    }
}
