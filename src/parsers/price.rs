use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9.,]+")
        .expect("Invalid price run regex")
});

static CURRENCY_AMOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$£€]\s*[0-9][0-9,]*(?:\.[0-9]+)?")
        .expect("Invalid currency amount regex")
});

/// Parse the first run of ASCII digits, commas and periods as a price.
///
/// Non-ASCII digits (full-width, Arabic-Indic) are not price characters.
/// Commas are thousands separators and are dropped. Only the first run is
/// considered; if it does not parse (`"1.2.3"`, a lone `"."`), the result is
/// `None` rather than a later run.
pub fn parse_price(text: Option<&str>) -> Option<f64> {
    let text = text?;
    let run = PRICE_RUN_REGEX.find(text)?.as_str().replace(',', "");
    run.parse::<f64>().ok()
}

/// Find the first currency-prefixed amount inside free text, e.g. `"$1,299.00"`.
pub fn find_currency_amount(text: &str) -> Option<&str> {
    CURRENCY_AMOUNT_REGEX.find(text).map(|m| m.as_str())
}
