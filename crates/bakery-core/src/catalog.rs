//! # Catalog Types
//!
//! Products and categories as the admin panel reads and writes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};
use crate::money::stored_amount;

/// A product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A product row joined with its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Product fields as submitted by the admin panel.
///
/// Used for both create and update; on update every column is overwritten
/// with what the payload carries, absent fields included.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductDraft {
    /// Target row for updates; ignored on create
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Validated product columns ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<i32>,
    pub image_url: Option<String>,
    pub is_available: bool,
}

impl ProductDraft {
    /// Columns for an insert. `is_available` defaults to true.
    pub fn for_create(&self) -> ShopResult<ProductFields> {
        self.fields(true)
    }

    /// Target id and columns for a full-row overwrite.
    /// An absent `is_available` is written as false.
    pub fn for_update(&self) -> ShopResult<(i32, ProductFields)> {
        let id = self
            .id
            .ok_or_else(|| ShopError::Validation("id is required".to_string()))?;
        Ok((id, self.fields(false)?))
    }

    fn fields(&self, default_available: bool) -> ShopResult<ProductFields> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ShopError::Validation("name is required".to_string()))?;

        let price = self
            .price
            .ok_or_else(|| ShopError::Validation("price is required".to_string()))?;
        let price = stored_amount(price, "price")?;

        Ok(ProductFields {
            name: name.to_string(),
            description: self.description.clone(),
            price,
            category_id: self.category_id,
            image_url: self.image_url.clone(),
            is_available: self.is_available.unwrap_or(default_available),
        })
    }
}
