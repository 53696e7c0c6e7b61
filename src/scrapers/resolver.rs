use scraper::ElementRef;
use tracing::trace;

use crate::models::{CandidateLocatorList, Locator};
use crate::parsers::clean_text;

/// The slice of a parse tree the resolver needs.
pub trait DomNode: Sized {
    /// First descendant matching the locator. Never called for degenerate locators.
    fn select_one(&self, locator: &Locator) -> Option<Self>;

    /// Whitespace-collapsed text content.
    fn text_of(&self) -> String;
}

impl<'a> DomNode for ElementRef<'a> {
    fn select_one(&self, locator: &Locator) -> Option<Self> {
        let selector = locator.selector()?;
        self.select(selector).next()
    }

    fn text_of(&self) -> String {
        clean_text(&self.text().collect::<String>())
    }
}

/// Return the text of the first candidate that matches with non-empty text.
///
/// Candidates are tried in order and the search stops at the first success,
/// so later candidates are never queried.
pub fn resolve<N: DomNode>(tile: &N, candidates: &CandidateLocatorList) -> Option<String> {
    for locator in candidates.iter() {
        if locator.is_degenerate() {
            trace!("Skipping degenerate locator '{}'", locator.raw());
            continue;
        }

        if let Some(element) = tile.select_one(locator) {
            let text = element.text_of();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}
