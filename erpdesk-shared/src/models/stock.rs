use serde::{Deserialize, Deserializer, Serialize};

/// Category a catalogue product belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductCategory {
    pub name: String,
}

/// Catalogue product nested inside a stock record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
}

/// A stock record returned by the product search.
///
/// The API is inconsistent about where it puts product attributes: some
/// records carry them at the top level, others only inside `product`. The
/// accessor methods resolve both shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    pub id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product: Option<ProductInfo>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "price")]
    pub purchase_price: Option<f64>,
}

impl StockItem {
    /// Catalogue product identifier, falling back to the stock record id.
    #[must_use]
    pub fn product_id(&self) -> &str {
        self.product_id.as_deref().unwrap_or(&self.id)
    }

    /// Product name, preferring the nested product.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.product
            .as_ref()
            .and_then(|product| product.name.as_deref())
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Unit of measure, preferring the top-level field.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit
            .as_deref()
            .or_else(|| self.product.as_ref().and_then(|p| p.unit.as_deref()))
            .filter(|unit| !unit.is_empty())
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.product
            .as_ref()
            .and_then(|product| product.category.as_ref())
            .map(|category| category.name.as_str())
    }
}

/// Prices arrive either as JSON numbers or as decimal strings.
fn price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Pagination block of the product search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct StockPagination {
    pub total_count: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub limit: u32,
}

impl Default for StockPagination {
    fn default() -> Self {
        Self {
            total_count: 0,
            total_pages: 1,
            current_page: 1,
            limit: 15,
        }
    }
}

/// Envelope of the product search endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StockPage {
    #[serde(default)]
    pub data: Vec<StockItem>,
    #[serde(default)]
    pub pagination: StockPagination,
}
