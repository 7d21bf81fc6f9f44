use serde::Serialize;
use shared::models::Location;

use crate::cache::{CacheTag, Query, TagKind};
use crate::error::ApiError;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocationById {
    pub id: String,
}

impl Query for LocationById {
    const NAME: &'static str = "location_by_id";
    type Output = Location;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("locations").segment(self.id.clone()))
    }

    fn provides(&self, _: &Location) -> Vec<CacheTag> {
        vec![CacheTag::id(TagKind::Location, self.id.clone())]
    }
}

/// Every location; the order builder shows them as suppliers.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Factories;

impl Query for Factories {
    const NAME: &'static str = "factories";
    type Output = Vec<Location>;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("locations"))
    }

    fn provides(&self, _: &Vec<Location>) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Location)]
    }
}
