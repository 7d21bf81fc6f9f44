use serde::Serialize;
use serde_json::Value;
use shared::models::{CreateOrderRequest, Order, OrdersResponse};

use crate::cache::{CacheTag, Mutation, Query, TagKind};
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Page size of the order listing.
pub const ORDERS_PAGE_SIZE: u32 = 20;

/// Orders placed by one location, newest first.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrdersByLocation {
    pub location_id: String,
    pub page: u32,
}

impl Query for OrdersByLocation {
    const NAME: &'static str = "orders_by_location";
    type Output = OrdersResponse;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("offers/location")
            .query("location_id", &self.location_id)
            .query("page", self.page.max(1))
            .query("limit", ORDERS_PAGE_SIZE))
    }

    fn provides(&self, _: &OrdersResponse) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Order)]
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrderById {
    pub id: String,
}

impl Query for OrderById {
    const NAME: &'static str = "order_by_id";
    type Output = Order;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("offers").segment(self.id.clone()))
    }

    fn provides(&self, _: &Order) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Order)]
    }
}

/// Place a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder(pub CreateOrderRequest);

impl Mutation for CreateOrder {
    type Output = Value;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("offers").json(&self.0)
    }

    fn invalidates(&self) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Order)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOrder {
    pub id: String,
}

impl Mutation for DeleteOrder {
    type Output = Value;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::delete("offers").segment(self.id.clone()))
    }

    fn invalidates(&self) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Order)]
    }
}
