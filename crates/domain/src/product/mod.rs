//! Product aggregate: commands, results and handlers.

mod commands;
mod service;

pub use commands::{
    CreateProductWithVariant, CreateProductWithoutVariant, NewVariant, PriceFields,
    ProductFields, StockChange, UpdateProductWithVariant, UpdateProductWithoutVariant,
    VariantChange, VariantFields,
};
pub use service::ProductService;

use inventory_store::{Product, ProductCategory, ProductPrice, ProductVariant, Stock, StockLog};
use serde::Serialize;

/// A product without variants with its dependent rows.
///
/// `stock` and `stock_log` are empty when an update found no stock row to
/// move, and `stock_log` is always empty on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatProductAggregate {
    pub product: Product,
    pub category: ProductCategory,
    pub price: ProductPrice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_log: Option<StockLog>,
    pub stock: Option<Stock>,
}

/// One variant with its dependent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantLine {
    pub variant: ProductVariant,
    pub price: ProductPrice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_log: Option<StockLog>,
    pub stock: Option<Stock>,
}

/// A product with variants. `variants` follows the command's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantProductAggregate {
    pub product: Product,
    pub category: ProductCategory,
    pub variants: Vec<VariantLine>,
}

/// A product as read back, in whichever shape it was created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProductAggregate {
    Flat(FlatProductAggregate),
    Variant(VariantProductAggregate),
}

impl ProductAggregate {
    pub fn product(&self) -> &Product {
        match self {
            ProductAggregate::Flat(aggregate) => &aggregate.product,
            ProductAggregate::Variant(aggregate) => &aggregate.product,
        }
    }
}
