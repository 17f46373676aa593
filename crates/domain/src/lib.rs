//! Inventory aggregate transaction engine.
//!
//! This crate provides:
//! - the stock ledger policy that derives direction and magnitude of a
//!   stock change
//! - the variant duplicate guard
//! - a unit-of-work wrapper giving every command all-or-nothing semantics
//! - product, category and stock command handlers

pub mod category;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod page;
pub mod product;
pub mod stock;
pub mod unit_of_work;

pub use category::{CategoryService, CreateProductCategory};
pub use error::{EngineError, ErrorKind};
pub use guard::ensure_variant_name_available;
pub use ledger::{LedgerMovement, derive_ledger_entry, net_quantity, seed_ledger_entry};
pub use product::{
    CreateProductWithVariant, CreateProductWithoutVariant, FlatProductAggregate, NewVariant,
    PriceFields, ProductAggregate, ProductFields, ProductService, StockChange,
    UpdateProductWithVariant, UpdateProductWithoutVariant, VariantChange, VariantFields,
    VariantLine, VariantProductAggregate,
};
pub use page::Page;
pub use stock::{StockHistory, StockMovement, StockService, UpdateStock};
