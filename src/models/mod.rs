pub mod locator;
pub mod product;

pub use locator::*;
pub use product::*;
