mod extractor;
mod resolver;

pub use extractor::ProductExtractor;
pub use resolver::{resolve, DomNode};
