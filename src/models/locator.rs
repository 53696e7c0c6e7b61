use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One candidate selector for a field.
///
/// Degenerate text (empty, whitespace, a bare `.`) and selectors that fail to
/// parse are kept for reporting but carry no compiled selector, so they are
/// never queried.
#[derive(Debug, Clone)]
pub struct Locator {
    raw: String,
    selector: Option<Selector>,
}

impl Locator {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let selector = if is_degenerate(&raw) {
            None
        } else {
            match Selector::parse(raw.trim()) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("Skipping unparsable locator '{}': {:?}", raw, e);
                    None
                }
            }
        };

        Self { raw, selector }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub fn is_degenerate(&self) -> bool {
        self.selector.is_none()
    }
}

fn is_degenerate(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "."
}

/// Fallback-ordered locators for one logical field. First match wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CandidateLocatorList {
    locators: Vec<Locator>,
}

impl CandidateLocatorList {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locators: candidates.into_iter().map(Locator::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.locators.iter()
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl From<Vec<String>> for CandidateLocatorList {
    fn from(candidates: Vec<String>) -> Self {
        Self::new(candidates)
    }
}

impl From<CandidateLocatorList> for Vec<String> {
    fn from(list: CandidateLocatorList) -> Self {
        list.locators.into_iter().map(|l| l.raw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_locators_have_no_selector() {
        assert!(Locator::new("").is_degenerate());
        assert!(Locator::new("   ").is_degenerate());
        assert!(Locator::new(".").is_degenerate());
        assert!(Locator::new(" . ").is_degenerate());
        assert!(!Locator::new(".catalog-name").is_degenerate());
    }

    #[test]
    fn unparsable_locator_is_degenerate() {
        assert!(Locator::new("div[").is_degenerate());
    }

    #[test]
    fn list_keeps_declared_order() {
        let list = CandidateLocatorList::new([".a", "", ".b"]);
        let raw: Vec<&str> = list.iter().map(Locator::raw).collect();
        assert_eq!(raw, vec![".a", "", ".b"]);
    }

    #[test]
    fn list_round_trips_through_config_form() {
        let list: CandidateLocatorList =
            serde_json::from_str(r#"["div.catalog-name", ".catalog-name"]"#).unwrap();
        assert_eq!(list.len(), 2);
        let back: Vec<String> = list.into();
        assert_eq!(back, vec!["div.catalog-name", ".catalog-name"]);
    }
}
