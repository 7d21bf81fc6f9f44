use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an order ("offer" on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    New,
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Completed,
    /// A status this client does not know yet, kept verbatim.
    Other(String),
}

impl OrderStatus {
    /// Wire spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Other(other) => other,
        }
    }

    /// Whether the order can no longer change.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Completed)
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" => Self::New,
            "processing" => Self::Processing,
            "confirmed" => Self::Confirmed,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            "completed" => Self::Completed,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a stored order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<String>,
    /// Catalogue product; absent for manually entered lines.
    #[serde(default)]
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: f64,
}

/// An order as returned by the listing and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub contract_number: Option<String>,
    /// Requested delivery date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
    /// Whether delivery (logistics) was requested.
    #[serde(default)]
    pub is_logist: Option<bool>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offer_items: Vec<OrderItem>,
}

impl Order {
    /// First eight characters of the identifier, as shown in listings.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id
            .char_indices()
            .nth(8)
            .map_or(self.id.as_str(), |(idx, _)| &self.id[..idx])
    }

    /// Number of lines on the order.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.offer_items.len()
    }
}

/// Pagination block of the order listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrdersPagination {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_count: u64,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "hasPrev")]
    pub has_prev: bool,
}

impl Default for OrdersPagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total_pages: 1,
            total_count: 0,
            has_next: false,
            has_prev: false,
        }
    }
}

/// Records plus pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrdersPage {
    #[serde(default)]
    pub records: Vec<Order>,
    #[serde(default)]
    pub pagination: OrdersPagination,
}

/// Envelope of `GET /offers/location`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrdersResponse {
    #[serde(default)]
    pub data: OrdersPage,
}

/// One line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    /// Omitted for manual lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: u32,
}

/// Body of `POST /offers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub location_id: String,
    /// Delivery date as `YYYY-MM-DDT12:00:00Z`.
    pub date: Option<String>,
    pub is_logist: Option<bool>,
    pub note: Option<String>,
    pub items: Vec<OrderLine>,
}
