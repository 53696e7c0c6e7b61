use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static OFF_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\boff\b")
        .expect("Invalid off token regex")
});

static PERCENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*%")
        .expect("Invalid percent regex")
});

/// How a discount badge is turned into its stored form.
///
/// The two are not equivalent: `"Up to 30% Off select frames"` becomes
/// `"Up to 30% select frames"` under `StripOff` and `"30%"` under
/// `StrictPercent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPolicy {
    /// Drop a standalone "off" token and collapse whitespace.
    StripOff,
    /// Keep only the first `<digits>%`.
    #[default]
    StrictPercent,
}

pub fn normalize_discount(text: Option<&str>, policy: DiscountPolicy) -> Option<String> {
    let text = text?;

    let normalized = match policy {
        DiscountPolicy::StripOff => {
            let stripped = OFF_TOKEN_REGEX.replace_all(text, "");
            stripped.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        DiscountPolicy::StrictPercent => {
            let found = PERCENT_REGEX.find(text)?;
            found.as_str().split_whitespace().collect::<String>()
        }
    };

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICIES: [DiscountPolicy; 2] = [DiscountPolicy::StripOff, DiscountPolicy::StrictPercent];

    #[test]
    fn off_suffix_is_removed_under_both_policies() {
        for policy in POLICIES {
            for text in ["34% Off", "34% off", "34% OFF", " 34%  Off "] {
                assert_eq!(
                    normalize_discount(Some(text), policy).as_deref(),
                    Some("34%"),
                    "{text} / {policy:?}"
                );
            }
        }
    }

    #[test]
    fn missing_input_is_none() {
        for policy in POLICIES {
            assert_eq!(normalize_discount(None, policy), None);
            assert_eq!(normalize_discount(Some(""), policy), None);
        }
    }

    #[test]
    fn policies_diverge_on_promotional_copy() {
        let text = Some("Up to 30% Off select frames");
        assert_eq!(
            normalize_discount(text, DiscountPolicy::StripOff).as_deref(),
            Some("Up to 30% select frames")
        );
        assert_eq!(normalize_discount(text, DiscountPolicy::StrictPercent).as_deref(), Some("30%"));
    }

    #[test]
    fn strip_off_only_removes_whole_word() {
        assert_eq!(
            normalize_discount(Some("Offer 10% off"), DiscountPolicy::StripOff).as_deref(),
            Some("Offer 10%")
        );
        assert_eq!(normalize_discount(Some("Off"), DiscountPolicy::StripOff), None);
    }

    #[test]
    fn strict_percent_canonicalizes_spacing() {
        assert_eq!(
            normalize_discount(Some("Save 25 % today"), DiscountPolicy::StrictPercent).as_deref(),
            Some("25%")
        );
        assert_eq!(normalize_discount(Some("Clearance"), DiscountPolicy::StrictPercent), None);
    }

    #[test]
    fn policy_reads_from_snake_case() {
        let policy: DiscountPolicy = serde_json::from_str("\"strip_off\"").unwrap();
        assert_eq!(policy, DiscountPolicy::StripOff);
    }
}
