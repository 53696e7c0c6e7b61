pub mod discount;
pub mod price;

pub use discount::*;
pub use price::*;

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Input is already-decoded DOM text, so entities are left alone.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Ray-Ban\n\t & Co  "), "Ray-Ban & Co");
        assert_eq!(clean_text(" \n "), "");
    }

    #[test]
    fn clean_text_does_not_decode_entities() {
        assert_eq!(clean_text("Tom &lt;Ford&gt;"), "Tom &lt;Ford&gt;");
    }
}
