//! Order builder: a cart of catalogue and manually entered products that
//! turns into a [`CreateOrderRequest`].

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::models::{CreateOrderRequest, OrderLine, StockItem};

/// Largest quantity a single line accepts.
pub const MAX_QUANTITY: u32 = 999_999;

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineKey {
    /// A catalogue product, keyed by its product id.
    Catalog(String),
    /// A manually entered product, numbered in insertion order.
    Manual(u64),
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(id) => write!(f, "{id}"),
            Self::Manual(seq) => write!(f, "manual-{seq}"),
        }
    }
}

/// Errors raised while editing or submitting a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("the cart is empty")]
    Empty,

    #[error("quantity is missing for: {}", .0.join(", "))]
    MissingQuantities(Vec<String>),

    #[error("quantity {0} is outside 0..={MAX_QUANTITY}")]
    QuantityOutOfRange(u32),

    #[error("no cart line `{0}`")]
    UnknownLine(LineKey),

    #[error("a manual product needs a name")]
    NameRequired,

    #[error("the order needs a location")]
    LocationRequired,
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub key: LineKey,
    pub product_id: Option<String>,
    pub name: String,
    pub unit: Option<String>,
    pub purchase_price: Option<f64>,
    /// `None` until the user enters a quantity.
    pub quantity: Option<u32>,
    pub notes: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self.key, LineKey::Manual(_))
    }

    /// Quantity times purchase price; unknown values count as zero.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity.unwrap_or(0)) * self.purchase_price.unwrap_or(0.0)
    }
}

/// A product typed in by hand because it is not in the catalogue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualProduct {
    pub name: String,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub notes: Option<String>,
}

/// Delivery block collected when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub date: NaiveDate,
    /// Whether the supplier should deliver.
    pub is_logist: bool,
    pub note: Option<String>,
}

/// Result of [`Cart::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartToggle {
    Added,
    Removed,
}

/// Products selected for a new order, in selection order.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    next_manual: u64,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a catalogue product is already selected.
    #[must_use]
    pub fn contains_product(&self, product_id: &str) -> bool {
        self.lines
            .iter()
            .any(|line| line.key == LineKey::Catalog(product_id.to_string()))
    }

    /// Select a search result, or deselect it if it is already in the cart.
    pub fn toggle(&mut self, item: &StockItem) -> CartToggle {
        let key = LineKey::Catalog(item.product_id().to_string());
        if self.remove(&key).is_some() {
            return CartToggle::Removed;
        }

        self.add_catalog(
            item.product_id(),
            item.display_name(),
            item.unit(),
            item.purchase_price,
        );
        CartToggle::Added
    }

    /// Add a catalogue product without a quantity. Adding a product twice
    /// keeps the existing line.
    pub fn add_catalog(
        &mut self,
        product_id: &str,
        name: &str,
        unit: Option<&str>,
        purchase_price: Option<f64>,
    ) -> LineKey {
        let key = LineKey::Catalog(product_id.to_string());
        if !self.lines.iter().any(|line| line.key == key) {
            self.lines.push(CartLine {
                key: key.clone(),
                product_id: Some(product_id.to_string()),
                name: name.to_string(),
                unit: unit.map(str::to_string),
                purchase_price,
                quantity: None,
                notes: None,
            });
        }
        key
    }

    /// Add a product that is not in the catalogue.
    ///
    /// # Errors
    /// Rejects a blank name or a quantity above [`MAX_QUANTITY`].
    pub fn add_manual(&mut self, product: ManualProduct) -> Result<LineKey, CartError> {
        let name = product.name.trim();
        if name.is_empty() {
            return Err(CartError::NameRequired);
        }
        if let Some(quantity) = product.quantity {
            check_quantity(quantity)?;
        }

        self.next_manual += 1;
        let key = LineKey::Manual(self.next_manual);
        self.lines.push(CartLine {
            key: key.clone(),
            product_id: None,
            name: name.to_string(),
            unit: product.unit.filter(|unit| !unit.trim().is_empty()),
            purchase_price: product.price,
            quantity: product.quantity,
            notes: product.notes.filter(|notes| !notes.trim().is_empty()),
        });
        Ok(key)
    }

    /// Set or clear the quantity of a line.
    ///
    /// # Errors
    /// Fails for an unknown line or a quantity above [`MAX_QUANTITY`].
    pub fn set_quantity(&mut self, key: &LineKey, quantity: Option<u32>) -> Result<(), CartError> {
        if let Some(quantity) = quantity {
            check_quantity(quantity)?;
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| &line.key == key)
            .ok_or_else(|| CartError::UnknownLine(key.clone()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, key: &LineKey) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| &line.key == key)?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Lines that still need a quantity.
    #[must_use]
    pub fn missing_quantity(&self) -> Vec<&CartLine> {
        self.lines
            .iter()
            .filter(|line| line.quantity.is_none())
            .collect()
    }

    /// Build the order body. The cart is left untouched so a failed
    /// submission can be retried.
    ///
    /// # Errors
    /// Fails on an empty cart, a blank location, or lines without a quantity.
    pub fn checkout(
        &self,
        location_id: &str,
        delivery: &DeliveryDetails,
    ) -> Result<CreateOrderRequest, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }
        if location_id.trim().is_empty() {
            return Err(CartError::LocationRequired);
        }

        let missing: Vec<String> = self
            .missing_quantity()
            .into_iter()
            .map(|line| line.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(CartError::MissingQuantities(missing));
        }

        let items = self
            .lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                quantity: line.quantity.unwrap_or(0),
            })
            .collect();

        Ok(CreateOrderRequest {
            location_id: location_id.to_string(),
            date: Some(format!("{}T12:00:00Z", delivery.date.format("%Y-%m-%d"))),
            is_logist: Some(delivery.is_logist),
            note: delivery
                .note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
                .map(str::to_string),
            items,
        })
    }
}

fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity > MAX_QUANTITY {
        Err(CartError::QuantityOutOfRange(quantity))
    } else {
        Ok(())
    }
}
