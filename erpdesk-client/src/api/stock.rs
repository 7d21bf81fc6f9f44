use serde::Serialize;
use shared::models::StockPage;

use crate::cache::{CacheTag, Query, TagKind};
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Product search, optionally filtered by name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StockSearch {
    pub page: u32,
    pub search: Option<String>,
}

impl StockSearch {
    /// A blank search term lists every product.
    #[must_use]
    pub fn new(page: u32, search: Option<&str>) -> Self {
        Self {
            page: page.max(1),
            search: search
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
        }
    }
}

impl Query for StockSearch {
    const NAME: &'static str = "stock_search";
    type Output = StockPage;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        let mut request = ApiRequest::get("stock/by-name/product");
        if let Some(term) = &self.search {
            request = request.segment(term.clone());
        }
        Ok(request.query("page", self.page))
    }

    fn provides(&self, _: &StockPage) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Stock)]
    }
}
