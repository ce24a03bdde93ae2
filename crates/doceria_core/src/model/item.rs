//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical sweet-item record and its mutable field subset.
//! - Validate submissions before they reach any backend call.
//! - Parse raw form input into typed fields.
//!
//! # Invariants
//! - Persisted items always carry non-empty `id` and `owner_id`.
//! - `owner_id` is set once at creation; `ItemFields` never carries it.
//! - `quantity > 0` and `price > 0` (finite) at submission time.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend-assigned item identifier. Empty before persistence.
pub type ItemId = String;

/// Canonical item record as stored in the `items` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Opaque document id; empty until the backend assigns one.
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    /// Unit price in BRL.
    pub price: f64,
    /// Identity that created the item. Immutable after creation.
    pub owner_id: String,
}

impl Item {
    /// Builds a persisted item from backend-assigned identity plus fields.
    pub fn from_fields(
        id: impl Into<ItemId>,
        owner_id: impl Into<String>,
        fields: ItemFields,
    ) -> Self {
        Self {
            id: id.into(),
            name: fields.name,
            category: fields.category,
            quantity: fields.quantity,
            price: fields.price,
            owner_id: owner_id.into(),
        }
    }

    /// Projects the owner-independent field subset used by update.
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            category: self.category.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }

    /// Returns whether the backend has assigned an id yet.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Checks invariants every stored row must satisfy.
    ///
    /// # Errors
    /// - `MissingId` when `id` is empty.
    /// - `MissingOwner` when `owner_id` is empty.
    pub fn validate_persisted(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::MissingId);
        }
        if self.owner_id.trim().is_empty() {
            return Err(ItemValidationError::MissingOwner);
        }
        Ok(())
    }

    /// Price rendered for list display, e.g. `R$ 2,50`.
    pub fn price_label(&self) -> String {
        format_price_brl(self.price)
    }
}

/// Mutable field subset accepted by create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price: f64,
}

impl ItemFields {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            quantity,
            price,
        }
    }

    /// Returns a copy with name and category trimmed, as stored.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity: self.quantity,
            price: self.price,
        }
    }

    /// Validates submission rules.
    ///
    /// Whitespace-only text counts as empty. Checks run in field order so
    /// callers always see the first offending field.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if self.category.trim().is_empty() {
            return Err(ItemValidationError::EmptyCategory);
        }
        if self.quantity <= 0 {
            return Err(ItemValidationError::NonPositiveQuantity(self.quantity));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ItemValidationError::NonPositivePrice(self.price));
        }
        Ok(())
    }
}

/// Raw text input from the add/edit dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub name: String,
    pub category: String,
    pub quantity: String,
    pub price: String,
}

impl ItemForm {
    /// Parses and validates form text into typed fields.
    ///
    /// Text is trimmed; price accepts either `.` or `,` as decimal separator.
    pub fn parse(&self) -> Result<ItemFields, ItemValidationError> {
        let quantity_text = self.quantity.trim();
        let quantity = quantity_text
            .parse::<i64>()
            .map_err(|_| ItemValidationError::UnparsableQuantity(quantity_text.to_string()))?;

        let price_text = self.price.trim();
        let price = price_text
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| ItemValidationError::UnparsablePrice(price_text.to_string()))?;

        let fields = ItemFields {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity,
            price,
        };
        fields.validate()?;
        Ok(fields)
    }
}

/// Local validation failures detected before any backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValidationError {
    EmptyName,
    EmptyCategory,
    NonPositiveQuantity(i64),
    NonPositivePrice(f64),
    UnparsableQuantity(String),
    UnparsablePrice(String),
    MissingId,
    MissingOwner,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required"),
            Self::EmptyCategory => write!(f, "category is required"),
            Self::NonPositiveQuantity(value) => {
                write!(f, "quantity must be greater than zero, got {value}")
            }
            Self::NonPositivePrice(value) => {
                write!(f, "price must be greater than zero, got {value}")
            }
            Self::UnparsableQuantity(value) => {
                write!(f, "quantity must be a whole number, got `{value}`")
            }
            Self::UnparsablePrice(value) => write!(f, "price must be a number, got `{value}`"),
            Self::MissingId => write!(f, "persisted item is missing its id"),
            Self::MissingOwner => write!(f, "persisted item is missing its owner"),
        }
    }
}

impl Error for ItemValidationError {}

/// Formats an amount as Brazilian Real: `R$ 1.234,50`.
///
/// Negative amounts keep a leading minus; non-finite values render as-is.
pub fn format_price_brl(value: f64) -> String {
    if !value.is_finite() {
        return format!("R$ {value}");
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}
