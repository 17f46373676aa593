//! Row models returned by the repository.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Audit columns shared by every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub created_by: EntityId,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<EntityId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<EntityId>,
}

impl Audit {
    /// Audit block for a row created now by `created_by`.
    pub fn created(created_by: EntityId) -> Self {
        Self {
            created_at: Utc::now(),
            created_by,
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Stamps an update made now by `updated_by`.
    pub fn touch(&mut self, updated_by: EntityId) {
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(updated_by);
    }

    /// Returns true while the row has not been soft deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// The owner pair of a price, stock or ledger row.
///
/// A row belongs either to a flat product or to one variant of a product.
/// Rows owned by nothing, or by a variant without its product, cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Owner {
    Product {
        product_id: EntityId,
    },
    Variant {
        product_id: EntityId,
        variant_id: EntityId,
    },
}

impl Owner {
    pub fn product(product_id: EntityId) -> Self {
        Owner::Product { product_id }
    }

    pub fn variant(product_id: EntityId, variant_id: EntityId) -> Self {
        Owner::Variant {
            product_id,
            variant_id,
        }
    }

    pub fn product_id(&self) -> &EntityId {
        match self {
            Owner::Product { product_id } | Owner::Variant { product_id, .. } => product_id,
        }
    }

    pub fn variant_id(&self) -> Option<&EntityId> {
        match self {
            Owner::Product { .. } => None,
            Owner::Variant { variant_id, .. } => Some(variant_id),
        }
    }

    /// Rebuilds an owner from its two nullable storage columns.
    pub fn from_columns(product_id: Option<String>, variant_id: Option<String>) -> Result<Self> {
        match (product_id, variant_id) {
            (Some(product_id), None) => Ok(Owner::product(product_id.into())),
            (Some(product_id), Some(variant_id)) => {
                Ok(Owner::variant(product_id.into(), variant_id.into()))
            }
            (product_id, variant_id) => Err(StoreError::InvalidOwner {
                product_id,
                variant_id,
            }),
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Product { product_id } => write!(f, "product {product_id}"),
            Owner::Variant {
                product_id,
                variant_id,
            } => write!(f, "product {product_id} variant {variant_id}"),
        }
    }
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl StockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockType::In => "IN",
            StockType::Out => "OUT",
        }
    }
}

impl std::fmt::Display for StockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StockType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IN" => Ok(StockType::In),
            "OUT" => Ok(StockType::Out),
            other => Err(StoreError::UnknownStockType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub guid: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub guid: EntityId,
    pub category_id: EntityId,
    pub name: String,
    pub product_code: String,
    pub product_sku: String,
    /// Fixed at creation; decides between the flat and the variant write shape.
    pub is_variant: bool,
    pub description: String,
    pub product_picture_url: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub guid: EntityId,
    pub product_id: EntityId,
    pub name: String,
    pub sku: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub guid: EntityId,
    pub owner: Owner,
    pub price: i64,
    pub discount_type: Option<String>,
    pub discount: Option<i64>,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub guid: EntityId,
    pub owner: Owner,
    pub stock: i64,
    #[serde(flatten)]
    pub audit: Audit,
}

/// One immutable entry of the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLog {
    pub guid: EntityId,
    pub owner: Owner,
    /// Magnitude of the movement, never negative.
    pub stock_log: i64,
    pub stock_type: StockType,
    pub note: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl StockLog {
    /// The movement as a signed quantity: positive for `IN`, negative for `OUT`.
    pub fn signed_quantity(&self) -> i64 {
        match self.stock_type {
            StockType::In => self.stock_log,
            StockType::Out => -self.stock_log,
        }
    }
}

/// A stock row joined with the names of what it counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockListing {
    #[serde(flatten)]
    pub stock: Stock,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub variant_name: Option<String>,
    pub variant_sku: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_from_product_column_only() {
        let owner = Owner::from_columns(Some("P1".into()), None).unwrap();
        assert_eq!(owner, Owner::product("P1".into()));
        assert!(owner.variant_id().is_none());
    }

    #[test]
    fn owner_from_both_columns() {
        let owner = Owner::from_columns(Some("P1".into()), Some("V1".into())).unwrap();
        assert_eq!(owner.product_id().as_str(), "P1");
        assert_eq!(owner.variant_id().map(EntityId::as_str), Some("V1"));
    }

    #[test]
    fn owner_rejects_missing_product() {
        assert!(matches!(
            Owner::from_columns(None, Some("V1".into())),
            Err(StoreError::InvalidOwner { .. })
        ));
        assert!(matches!(
            Owner::from_columns(None, None),
            Err(StoreError::InvalidOwner { .. })
        ));
    }

    #[test]
    fn stock_type_wire_format() {
        assert_eq!(serde_json::to_string(&StockType::In).unwrap(), "\"IN\"");
        assert_eq!(serde_json::to_string(&StockType::Out).unwrap(), "\"OUT\"");
        assert_eq!("OUT".parse::<StockType>().unwrap(), StockType::Out);
        assert!("SIDEWAYS".parse::<StockType>().is_err());
    }

    #[test]
    fn signed_quantity_follows_direction() {
        let mut entry = StockLog {
            guid: EntityId::generate(),
            owner: Owner::product("P1".into()),
            stock_log: 30,
            stock_type: StockType::In,
            note: None,
            audit: Audit::created("u1".into()),
        };
        assert_eq!(entry.signed_quantity(), 30);
        entry.stock_type = StockType::Out;
        assert_eq!(entry.signed_quantity(), -30);
    }

    #[test]
    fn touch_stamps_update_columns() {
        let mut audit = Audit::created("u1".into());
        assert!(audit.updated_at.is_none());
        audit.touch("u2".into());
        assert!(audit.updated_at.is_some());
        assert_eq!(audit.updated_by, Some(EntityId::from("u2")));
        assert!(audit.is_live());
    }
}
