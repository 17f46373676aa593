use async_trait::async_trait;
use common::EntityId;

use crate::{
    CategoryQuery, InsertProductCategoryParams, InsertProductParams, InsertProductPriceParams,
    InsertProductVariantParams, InsertStockLogParams, InsertStockParams, Owner, Product,
    ProductCategory, ProductPrice, ProductQuery, ProductVariant, Result, Stock, StockListing,
    StockLog, StockQuery, UpdateProductParams, UpdateProductPriceParams,
    UpdateProductVariantParams, UpdateStockParams,
};

/// Typed operations over the inventory tables.
///
/// Every call runs inside the transaction the implementor is bound to.
/// Lookups by primary key fail with `StoreError::NotFound` when the row is
/// missing; lookups by owner pair or by name return `Ok(None)` instead.
/// Updates that match no row fail with `NotFound`.
#[async_trait]
pub trait InventoryRepository: Send {
    async fn insert_product(&mut self, params: InsertProductParams) -> Result<Product>;

    async fn update_product(&mut self, params: UpdateProductParams) -> Result<Product>;

    async fn get_product(&mut self, guid: &EntityId) -> Result<Product>;

    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>>;

    /// Counts the rows `list_products` would page through, ignoring paging.
    async fn count_products(&mut self, query: &ProductQuery) -> Result<u64>;

    async fn insert_product_category(
        &mut self,
        params: InsertProductCategoryParams,
    ) -> Result<ProductCategory>;

    async fn get_product_category(&mut self, guid: &EntityId) -> Result<ProductCategory>;

    async fn list_product_categories(
        &mut self,
        query: &CategoryQuery,
    ) -> Result<Vec<ProductCategory>>;

    async fn count_product_categories(&mut self, query: &CategoryQuery) -> Result<u64>;

    async fn insert_product_variant(
        &mut self,
        params: InsertProductVariantParams,
    ) -> Result<ProductVariant>;

    async fn update_product_variant(
        &mut self,
        params: UpdateProductVariantParams,
    ) -> Result<ProductVariant>;

    /// Finds a live variant of `product_id` whose name is exactly `name`.
    async fn get_product_variant_by_name(
        &mut self,
        product_id: &EntityId,
        name: &str,
    ) -> Result<Option<ProductVariant>>;

    /// Lists the live variants of a product, oldest first.
    async fn list_product_variants(&mut self, product_id: &EntityId)
    -> Result<Vec<ProductVariant>>;

    async fn insert_product_price(
        &mut self,
        params: InsertProductPriceParams,
    ) -> Result<ProductPrice>;

    async fn update_product_price(
        &mut self,
        params: UpdateProductPriceParams,
    ) -> Result<ProductPrice>;

    /// Finds the live price of an owner pair.
    async fn get_product_price_by_owner(&mut self, owner: &Owner) -> Result<Option<ProductPrice>>;

    async fn insert_stock(&mut self, params: InsertStockParams) -> Result<Stock>;

    async fn update_stock(&mut self, params: UpdateStockParams) -> Result<Stock>;

    async fn get_stock(&mut self, guid: &EntityId) -> Result<Stock>;

    /// Finds the live stock row of an owner pair.
    ///
    /// This is a plain read: it takes no row lock.
    async fn get_stock_by_owner(&mut self, owner: &Owner) -> Result<Option<Stock>>;

    async fn insert_stock_log(&mut self, params: InsertStockLogParams) -> Result<StockLog>;

    /// Lists the ledger entries of an owner pair, oldest first.
    async fn list_stock_logs(&mut self, owner: &Owner) -> Result<Vec<StockLog>>;

    async fn list_stocks(&mut self, query: &StockQuery) -> Result<Vec<StockListing>>;

    /// Counts the rows `list_stocks` would page through, ignoring paging.
    async fn count_stocks(&mut self, query: &StockQuery) -> Result<u64>;
}

/// A transaction-bound repository.
///
/// `commit` and `rollback` consume the handle, so a finished unit of work
/// cannot issue further calls. Dropping an unfinished unit of work discards
/// its writes.
#[async_trait]
pub trait UnitOfWork: InventoryRepository {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Opens units of work.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    type UnitOfWork: UnitOfWork + 'static;

    async fn begin(&self) -> Result<Self::UnitOfWork>;
}
