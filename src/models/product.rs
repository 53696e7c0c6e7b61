use serde::{Deserialize, Serialize};

/// One product tile as extracted from a listing page.
///
/// Field order is the column order of the tabular output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub list_price: Option<f64>,
    pub current_price: Option<f64>,
    pub discount: Option<String>,
}

/// Hashable identity of a record: every field, prices by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    brand: Option<String>,
    name: Option<String>,
    list_price: Option<u64>,
    current_price: Option<u64>,
    discount: Option<String>,
}

impl ProductRecord {
    /// True when markup drift left every field unresolved.
    pub fn is_blank(&self) -> bool {
        self.brand.is_none()
            && self.name.is_none()
            && self.list_price.is_none()
            && self.current_price.is_none()
            && self.discount.is_none()
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            brand: self.brand.clone(),
            name: self.name.clone(),
            list_price: self.list_price.map(f64::to_bits),
            current_price: self.current_price.map(f64::to_bits),
            discount: self.discount.clone(),
        }
    }
}

/// Records found on one rendered page, in tile order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    records: Vec<ProductRecord>,
}

impl PageResult {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// The page had zero tiles.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tile_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn blank_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_blank()).count()
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}
