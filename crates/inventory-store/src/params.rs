//! Write parameters accepted by the repository.
//!
//! Identifiers are generated by the caller, never by the store, so a
//! command knows every id it will write before its transaction opens.

use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::model::{Owner, StockType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertProductCategoryParams {
    pub guid: EntityId,
    pub name: String,
    pub created_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertProductParams {
    pub guid: EntityId,
    pub category_id: EntityId,
    pub name: String,
    pub product_code: String,
    pub product_sku: String,
    pub is_variant: bool,
    pub description: String,
    pub product_picture_url: Option<String>,
    pub created_by: EntityId,
}

/// Overwrites the mutable columns of a product.
///
/// `is_variant` is deliberately absent: a product keeps its write shape for
/// its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductParams {
    pub guid: EntityId,
    pub category_id: EntityId,
    pub name: String,
    pub product_sku: String,
    pub description: String,
    pub product_picture_url: Option<String>,
    pub updated_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertProductVariantParams {
    pub guid: EntityId,
    pub product_id: EntityId,
    pub name: String,
    pub sku: String,
    pub is_active: bool,
    pub created_by: EntityId,
}

/// Keyed by `(guid, product_id)`; a variant is never moved to another product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductVariantParams {
    pub guid: EntityId,
    pub product_id: EntityId,
    pub name: String,
    pub sku: String,
    pub is_active: bool,
    pub updated_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertProductPriceParams {
    pub guid: EntityId,
    pub owner: Owner,
    pub price: i64,
    pub discount_type: Option<String>,
    pub discount: Option<i64>,
    pub is_active: bool,
    pub created_by: EntityId,
}

/// Keyed by the owner pair: one live price exists per priced unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductPriceParams {
    pub owner: Owner,
    pub price: i64,
    pub discount_type: Option<String>,
    pub discount: Option<i64>,
    pub is_active: bool,
    pub updated_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertStockParams {
    pub guid: EntityId,
    pub owner: Owner,
    pub stock: i64,
    pub created_by: EntityId,
}

/// Overwrites the quantity of an existing stock row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStockParams {
    pub guid: EntityId,
    pub stock: i64,
    pub updated_by: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertStockLogParams {
    pub guid: EntityId,
    pub owner: Owner,
    pub stock_log: i64,
    pub stock_type: StockType,
    pub note: Option<String>,
    pub created_by: EntityId,
}
