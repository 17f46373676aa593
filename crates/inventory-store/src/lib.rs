pub mod error;
pub mod memory;
pub mod model;
pub mod params;
pub mod postgres;
pub mod query;
pub mod repository;

pub use common::{ActorId, EntityId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryInventoryStore, InMemoryUnitOfWork, TableCounts};
pub use model::{
    Audit, Owner, Product, ProductCategory, ProductPrice, ProductVariant, Stock, StockListing,
    StockLog, StockType,
};
pub use params::{
    InsertProductCategoryParams, InsertProductParams, InsertProductPriceParams, InsertProductVariantParams,
    InsertStockLogParams, InsertStockParams, UpdateProductParams, UpdateProductPriceParams,
    UpdateProductVariantParams, UpdateStockParams,
};
pub use postgres::{PostgresInventoryStore, PostgresUnitOfWork};
pub use query::{
    CategoryOrder, CategoryQuery, ProductOrder, ProductQuery, SortDirection, StockOrder, StockQuery,
};
pub use repository::{InventoryRepository, InventoryStore, UnitOfWork};
