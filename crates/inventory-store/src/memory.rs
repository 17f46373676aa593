use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::EntityId;
use tokio::sync::RwLock;

use crate::{
    Audit, CategoryOrder, CategoryQuery, InsertProductCategoryParams, InsertProductParams,
    InsertProductPriceParams, InsertProductVariantParams, InsertStockLogParams, InsertStockParams,
    Owner, Product, ProductCategory, ProductOrder, ProductPrice, ProductQuery, ProductVariant,
    Result, SortDirection, Stock, StockListing, StockLog, StockOrder, StockQuery, StoreError,
    UpdateProductParams, UpdateProductPriceParams, UpdateProductVariantParams, UpdateStockParams,
    repository::{InventoryRepository, InventoryStore, UnitOfWork},
};

static VARIANT_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: HashMap<EntityId, ProductCategory>,
    products: HashMap<EntityId, Product>,
    variants: HashMap<EntityId, ProductVariant>,
    /// Insertion sequence of variants, for stable listing order.
    variant_seq: HashMap<EntityId, u64>,
    prices: HashMap<EntityId, ProductPrice>,
    stocks: HashMap<EntityId, Stock>,
    stock_logs: Vec<StockLog>,
}

impl Tables {
    /// Publishes rows written by a transaction.
    fn apply(&mut self, staged: Tables) {
        self.categories.extend(staged.categories);
        self.products.extend(staged.products);
        self.variants.extend(staged.variants);
        self.variant_seq.extend(staged.variant_seq);
        self.prices.extend(staged.prices);
        self.stocks.extend(staged.stocks);
        self.stock_logs.extend(staged.stock_logs);
    }

    /// The committed tables as seen through a transaction's own writes.
    fn overlay(&self, staged: &Tables) -> Tables {
        let mut view = self.clone();
        view.apply(staged.clone());
        view
    }
}

/// Failures the store will inject into the next units of work.
#[derive(Debug, Clone, Default)]
struct FaultPlan {
    /// Fail the n-th write (1-based) issued by a unit of work.
    fail_on_write: Option<usize>,
    fail_commit: bool,
    fail_rollback: bool,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Tables,
    faults: FaultPlan,
}

/// Row counts per table, used to assert that nothing leaked out of a
/// rolled back unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub products: usize,
    pub variants: usize,
    pub prices: usize,
    pub stocks: usize,
    pub stock_logs: usize,
}

/// In-memory inventory store for tests and local runs.
///
/// A unit of work stages its writes privately and publishes them on commit,
/// so uncommitted rows are never visible to other units of work. Reads do
/// not lock rows: two units of work may read the same stock row and both
/// commit, the later write winning.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    shared: Arc<RwLock<Shared>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product category, committed immediately.
    pub async fn add_category(
        &self,
        name: impl Into<String>,
        created_by: EntityId,
    ) -> ProductCategory {
        let category = ProductCategory {
            guid: EntityId::generate(),
            name: name.into(),
            audit: Audit::created(created_by),
        };
        self.shared
            .write()
            .await
            .tables
            .categories
            .insert(category.guid.clone(), category.clone());
        category
    }

    /// Makes the n-th write (1-based) of every following unit of work fail.
    pub async fn fail_on_write(&self, nth: usize) {
        self.shared.write().await.faults.fail_on_write = Some(nth);
    }

    /// Makes every following commit fail.
    pub async fn fail_commit(&self) {
        self.shared.write().await.faults.fail_commit = true;
    }

    /// Makes every following rollback fail.
    pub async fn fail_rollback(&self) {
        self.shared.write().await.faults.fail_rollback = true;
    }

    /// Removes every injected failure.
    pub async fn clear_faults(&self) {
        self.shared.write().await.faults = FaultPlan::default();
    }

    pub async fn counts(&self) -> TableCounts {
        let shared = self.shared.read().await;
        TableCounts {
            products: shared.tables.products.len(),
            variants: shared.tables.variants.len(),
            prices: shared.tables.prices.len(),
            stocks: shared.tables.stocks.len(),
            stock_logs: shared.tables.stock_logs.len(),
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        self.shared
            .read()
            .await
            .tables
            .products
            .values()
            .cloned()
            .collect()
    }

    pub async fn variants(&self) -> Vec<ProductVariant> {
        self.shared
            .read()
            .await
            .tables
            .variants
            .values()
            .cloned()
            .collect()
    }

    pub async fn prices(&self) -> Vec<ProductPrice> {
        self.shared
            .read()
            .await
            .tables
            .prices
            .values()
            .cloned()
            .collect()
    }

    pub async fn stocks(&self) -> Vec<Stock> {
        self.shared
            .read()
            .await
            .tables
            .stocks
            .values()
            .cloned()
            .collect()
    }

    /// Returns the committed ledger in insertion order.
    pub async fn stock_logs(&self) -> Vec<StockLog> {
        self.shared.read().await.tables.stock_logs.clone()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        let faults = self.shared.read().await.faults.clone();
        Ok(InMemoryUnitOfWork {
            shared: self.shared.clone(),
            staged: Tables::default(),
            faults,
            writes: 0,
        })
    }
}

/// A unit of work against [`InMemoryInventoryStore`].
pub struct InMemoryUnitOfWork {
    shared: Arc<RwLock<Shared>>,
    staged: Tables,
    faults: FaultPlan,
    writes: usize,
}

impl InMemoryUnitOfWork {
    fn record_write(&mut self, operation: &str) -> Result<()> {
        self.writes += 1;
        if self.faults.fail_on_write == Some(self.writes) {
            return Err(StoreError::Injected(format!(
                "write #{} ({operation})",
                self.writes
            )));
        }
        Ok(())
    }

    async fn view(&self) -> Tables {
        self.shared.read().await.tables.overlay(&self.staged)
    }

    async fn find_product(&self, guid: &EntityId) -> Option<Product> {
        if let Some(product) = self.staged.products.get(guid) {
            return Some(product.clone());
        }
        self.shared.read().await.tables.products.get(guid).cloned()
    }

    async fn find_variant(&self, guid: &EntityId) -> Option<ProductVariant> {
        if let Some(variant) = self.staged.variants.get(guid) {
            return Some(variant.clone());
        }
        self.shared.read().await.tables.variants.get(guid).cloned()
    }

    async fn find_stock(&self, guid: &EntityId) -> Option<Stock> {
        if let Some(stock) = self.staged.stocks.get(guid) {
            return Some(stock.clone());
        }
        self.shared.read().await.tables.stocks.get(guid).cloned()
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn directed(ordering: CmpOrdering, direction: SortDirection) -> CmpOrdering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn paged<T>(rows: Vec<T>, offset: u64, limit: u32) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit as usize).collect()
}

fn matching_categories(view: &Tables, query: &CategoryQuery) -> Vec<ProductCategory> {
    view.categories
        .values()
        .filter(|category| category.audit.is_live())
        .filter(|category| {
            query
                .name
                .as_deref()
                .is_none_or(|name| contains_ignore_case(Some(&category.name), name))
        })
        .cloned()
        .collect()
}

fn matching_products(view: &Tables, query: &ProductQuery) -> Vec<Product> {
    view.products
        .values()
        .filter(|product| product.audit.is_live())
        .filter(|product| {
            if let Some(ref name) = query.name
                && !contains_ignore_case(Some(&product.name), name)
            {
                return false;
            }
            if let Some(ref code) = query.product_code
                && !contains_ignore_case(Some(&product.product_code), code)
            {
                return false;
            }
            if let Some(ref sku) = query.product_sku
                && !contains_ignore_case(Some(&product.product_sku), sku)
            {
                return false;
            }
            if let Some(ref category_id) = query.category_id
                && &product.category_id != category_id
            {
                return false;
            }
            query
                .is_variant
                .is_none_or(|is_variant| product.is_variant == is_variant)
        })
        .cloned()
        .collect()
}

fn listings(view: &Tables, query: &StockQuery) -> Vec<StockListing> {
    view.stocks
        .values()
        .filter(|stock| stock.audit.is_live())
        .map(|stock| {
            let product = view.products.get(stock.owner.product_id());
            let variant = stock.owner.variant_id().and_then(|id| view.variants.get(id));
            StockListing {
                stock: stock.clone(),
                product_name: product.map(|p| p.name.clone()),
                product_sku: product.map(|p| p.product_sku.clone()),
                variant_name: variant.map(|v| v.name.clone()),
                variant_sku: variant.map(|v| v.sku.clone()),
            }
        })
        .filter(|listing| {
            if let Some(min) = query.stock_greater_than
                && listing.stock.stock <= min
            {
                return false;
            }
            if let Some(max) = query.stock_lower_than
                && listing.stock.stock >= max
            {
                return false;
            }
            if let Some(ref name) = query.product_name
                && !contains_ignore_case(listing.product_name.as_deref(), name)
            {
                return false;
            }
            if let Some(ref name) = query.variant_name
                && !contains_ignore_case(listing.variant_name.as_deref(), name)
            {
                return false;
            }
            true
        })
        .collect()
}

#[async_trait]
impl InventoryRepository for InMemoryUnitOfWork {
    async fn insert_product(&mut self, params: InsertProductParams) -> Result<Product> {
        self.record_write("insert_product")?;
        let product = Product {
            guid: params.guid,
            category_id: params.category_id,
            name: params.name,
            product_code: params.product_code,
            product_sku: params.product_sku,
            is_variant: params.is_variant,
            description: params.description,
            product_picture_url: params.product_picture_url,
            audit: Audit::created(params.created_by),
        };
        self.staged
            .products
            .insert(product.guid.clone(), product.clone());
        Ok(product)
    }

    async fn update_product(&mut self, params: UpdateProductParams) -> Result<Product> {
        self.record_write("update_product")?;
        let mut product = self
            .find_product(&params.guid)
            .await
            .filter(|p| p.audit.is_live())
            .ok_or_else(|| StoreError::not_found("product", &params.guid))?;

        product.category_id = params.category_id;
        product.name = params.name;
        product.product_sku = params.product_sku;
        product.description = params.description;
        product.product_picture_url = params.product_picture_url;
        product.audit.touch(params.updated_by);

        self.staged
            .products
            .insert(product.guid.clone(), product.clone());
        Ok(product)
    }

    async fn get_product(&mut self, guid: &EntityId) -> Result<Product> {
        self.find_product(guid)
            .await
            .ok_or_else(|| StoreError::not_found("product", guid))
    }

    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        let view = self.view().await;
        let mut rows = matching_products(&view, query);

        rows.sort_by(|a, b| {
            let ordering = match query.order {
                ProductOrder::CreatedAt => a.audit.created_at.cmp(&b.audit.created_at),
                ProductOrder::Name => a.name.cmp(&b.name),
                ProductOrder::ProductCode => a.product_code.cmp(&b.product_code),
            }
            .then_with(|| a.guid.cmp(&b.guid));
            directed(ordering, query.direction)
        });

        Ok(paged(rows, query.offset(), query.limit))
    }

    async fn count_products(&mut self, query: &ProductQuery) -> Result<u64> {
        let view = self.view().await;
        Ok(matching_products(&view, query).len() as u64)
    }

    async fn insert_product_category(
        &mut self,
        params: InsertProductCategoryParams,
    ) -> Result<ProductCategory> {
        self.record_write("insert_product_category")?;
        let category = ProductCategory {
            guid: params.guid,
            name: params.name,
            audit: Audit::created(params.created_by),
        };
        self.staged
            .categories
            .insert(category.guid.clone(), category.clone());
        Ok(category)
    }

    async fn list_product_categories(
        &mut self,
        query: &CategoryQuery,
    ) -> Result<Vec<ProductCategory>> {
        let view = self.view().await;
        let mut rows = matching_categories(&view, query);

        rows.sort_by(|a, b| {
            let ordering = match query.order {
                CategoryOrder::CreatedAt => a.audit.created_at.cmp(&b.audit.created_at),
                CategoryOrder::Name => a.name.cmp(&b.name),
            }
            .then_with(|| a.guid.cmp(&b.guid));
            directed(ordering, query.direction)
        });

        Ok(paged(rows, query.offset(), query.limit))
    }

    async fn count_product_categories(&mut self, query: &CategoryQuery) -> Result<u64> {
        let view = self.view().await;
        Ok(matching_categories(&view, query).len() as u64)
    }

    async fn get_product_category(&mut self, guid: &EntityId) -> Result<ProductCategory> {
        if let Some(category) = self.staged.categories.get(guid) {
            return Ok(category.clone());
        }
        self.shared
            .read()
            .await
            .tables
            .categories
            .get(guid)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product category", guid))
    }

    async fn insert_product_variant(
        &mut self,
        params: InsertProductVariantParams,
    ) -> Result<ProductVariant> {
        self.record_write("insert_product_variant")?;
        let variant = ProductVariant {
            guid: params.guid,
            product_id: params.product_id,
            name: params.name,
            sku: params.sku,
            is_active: params.is_active,
            audit: Audit::created(params.created_by),
        };
        self.staged.variant_seq.insert(
            variant.guid.clone(),
            VARIANT_SEQ.fetch_add(1, Ordering::Relaxed),
        );
        self.staged
            .variants
            .insert(variant.guid.clone(), variant.clone());
        Ok(variant)
    }

    async fn update_product_variant(
        &mut self,
        params: UpdateProductVariantParams,
    ) -> Result<ProductVariant> {
        self.record_write("update_product_variant")?;
        let mut variant = self
            .find_variant(&params.guid)
            .await
            .filter(|v| v.product_id == params.product_id && v.audit.is_live())
            .ok_or_else(|| StoreError::not_found("product variant", &params.guid))?;

        variant.name = params.name;
        variant.sku = params.sku;
        variant.is_active = params.is_active;
        variant.audit.touch(params.updated_by);

        self.staged
            .variants
            .insert(variant.guid.clone(), variant.clone());
        Ok(variant)
    }

    async fn get_product_variant_by_name(
        &mut self,
        product_id: &EntityId,
        name: &str,
    ) -> Result<Option<ProductVariant>> {
        let view = self.view().await;
        Ok(view
            .variants
            .into_values()
            .find(|v| &v.product_id == product_id && v.name == name && v.audit.is_live()))
    }

    async fn list_product_variants(
        &mut self,
        product_id: &EntityId,
    ) -> Result<Vec<ProductVariant>> {
        let view = self.view().await;
        let mut variants: Vec<_> = view
            .variants
            .into_values()
            .filter(|v| &v.product_id == product_id && v.audit.is_live())
            .collect();
        variants.sort_by_key(|v| view.variant_seq.get(&v.guid).copied().unwrap_or(u64::MAX));
        Ok(variants)
    }

    async fn insert_product_price(
        &mut self,
        params: InsertProductPriceParams,
    ) -> Result<ProductPrice> {
        self.record_write("insert_product_price")?;
        let price = ProductPrice {
            guid: params.guid,
            owner: params.owner,
            price: params.price,
            discount_type: params.discount_type,
            discount: params.discount,
            is_active: params.is_active,
            audit: Audit::created(params.created_by),
        };
        self.staged.prices.insert(price.guid.clone(), price.clone());
        Ok(price)
    }

    async fn update_product_price(
        &mut self,
        params: UpdateProductPriceParams,
    ) -> Result<ProductPrice> {
        self.record_write("update_product_price")?;
        let view = self.view().await;
        let mut price = view
            .prices
            .into_values()
            .find(|p| p.owner == params.owner && p.audit.is_live())
            .ok_or_else(|| StoreError::not_found("product price", &params.owner))?;

        price.price = params.price;
        price.discount_type = params.discount_type;
        price.discount = params.discount;
        price.is_active = params.is_active;
        price.audit.touch(params.updated_by);

        self.staged.prices.insert(price.guid.clone(), price.clone());
        Ok(price)
    }

    async fn get_product_price_by_owner(&mut self, owner: &Owner) -> Result<Option<ProductPrice>> {
        let view = self.view().await;
        Ok(view
            .prices
            .into_values()
            .find(|p| &p.owner == owner && p.audit.is_live()))
    }

    async fn insert_stock(&mut self, params: InsertStockParams) -> Result<Stock> {
        self.record_write("insert_stock")?;
        let stock = Stock {
            guid: params.guid,
            owner: params.owner,
            stock: params.stock,
            audit: Audit::created(params.created_by),
        };
        self.staged.stocks.insert(stock.guid.clone(), stock.clone());
        Ok(stock)
    }

    async fn update_stock(&mut self, params: UpdateStockParams) -> Result<Stock> {
        self.record_write("update_stock")?;
        let mut stock = self
            .find_stock(&params.guid)
            .await
            .filter(|s| s.audit.is_live())
            .ok_or_else(|| StoreError::not_found("stock", &params.guid))?;

        stock.stock = params.stock;
        stock.audit.touch(params.updated_by);

        self.staged.stocks.insert(stock.guid.clone(), stock.clone());
        Ok(stock)
    }

    async fn get_stock(&mut self, guid: &EntityId) -> Result<Stock> {
        self.find_stock(guid)
            .await
            .filter(|s| s.audit.is_live())
            .ok_or_else(|| StoreError::not_found("stock", guid))
    }

    async fn get_stock_by_owner(&mut self, owner: &Owner) -> Result<Option<Stock>> {
        let view = self.view().await;
        Ok(view
            .stocks
            .into_values()
            .find(|s| &s.owner == owner && s.audit.is_live()))
    }

    async fn insert_stock_log(&mut self, params: InsertStockLogParams) -> Result<StockLog> {
        self.record_write("insert_stock_log")?;
        let entry = StockLog {
            guid: params.guid,
            owner: params.owner,
            stock_log: params.stock_log,
            stock_type: params.stock_type,
            note: params.note,
            audit: Audit::created(params.created_by),
        };
        self.staged.stock_logs.push(entry.clone());
        Ok(entry)
    }

    async fn list_stock_logs(&mut self, owner: &Owner) -> Result<Vec<StockLog>> {
        let view = self.view().await;
        Ok(view
            .stock_logs
            .into_iter()
            .filter(|entry| &entry.owner == owner)
            .collect())
    }

    async fn list_stocks(&mut self, query: &StockQuery) -> Result<Vec<StockListing>> {
        let view = self.view().await;
        let mut rows = listings(&view, query);

        rows.sort_by(|a, b| {
            let ordering = match query.order {
                StockOrder::CreatedAt => a.stock.audit.created_at.cmp(&b.stock.audit.created_at),
                StockOrder::Stock => a.stock.stock.cmp(&b.stock.stock),
                StockOrder::ProductName => a.product_name.cmp(&b.product_name),
            }
            .then_with(|| a.stock.guid.cmp(&b.stock.guid));
            directed(ordering, query.direction)
        });

        Ok(paged(rows, query.offset(), query.limit))
    }

    async fn count_stocks(&mut self, query: &StockQuery) -> Result<u64> {
        let view = self.view().await;
        Ok(listings(&view, query).len() as u64)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self) -> Result<()> {
        if self.faults.fail_commit {
            return Err(StoreError::Injected("commit".to_string()));
        }
        self.shared.write().await.tables.apply(self.staged);
        metrics::counter!("inventory_store_transactions_total", "outcome" => "commit").increment(1);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        if self.faults.fail_rollback {
            return Err(StoreError::Injected("rollback".to_string()));
        }
        metrics::counter!("inventory_store_transactions_total", "outcome" => "rollback")
            .increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StockType;

    fn product_params(category_id: &EntityId) -> InsertProductParams {
        InsertProductParams {
            guid: EntityId::generate(),
            category_id: category_id.clone(),
            name: "Widget".to_string(),
            product_code: "W-1".to_string(),
            product_sku: "SKU-W-1".to_string(),
            is_variant: false,
            description: String::new(),
            product_picture_url: None,
            created_by: "admin".into(),
        }
    }

    fn stock_params(owner: Owner, stock: i64) -> InsertStockParams {
        InsertStockParams {
            guid: EntityId::generate(),
            owner,
            stock,
            created_by: "admin".into(),
        }
    }

    #[tokio::test]
    async fn committed_writes_become_visible() {
        let store = InMemoryInventoryStore::new();
        let category = store.add_category("Tools", "admin".into()).await;

        let mut uow = store.begin().await.unwrap();
        let product = uow.insert_product(product_params(&category.guid)).await.unwrap();
        assert_eq!(store.counts().await.products, 0);

        uow.commit().await.unwrap();
        assert_eq!(store.counts().await.products, 1);

        let mut uow = store.begin().await.unwrap();
        let loaded = uow.get_product(&product.guid).await.unwrap();
        assert_eq!(loaded.name, "Widget");
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let store = InMemoryInventoryStore::new();
        let category = store.add_category("Tools", "admin".into()).await;

        let mut uow = store.begin().await.unwrap();
        uow.insert_product(product_params(&category.guid)).await.unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(store.counts().await, TableCounts::default());
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_writes() {
        let store = InMemoryInventoryStore::new();
        let category = store.add_category("Tools", "admin".into()).await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_product(product_params(&category.guid)).await.unwrap();
        }

        assert_eq!(store.counts().await.products, 0);
    }

    #[tokio::test]
    async fn unit_of_work_reads_its_own_writes() {
        let store = InMemoryInventoryStore::new();
        let category = store.add_category("Tools", "admin".into()).await;

        let mut uow = store.begin().await.unwrap();
        let product = uow.insert_product(product_params(&category.guid)).await.unwrap();
        let owner = Owner::product(product.guid.clone());
        uow.insert_stock(stock_params(owner.clone(), 5)).await.unwrap();

        let found = uow.get_stock_by_owner(&owner).await.unwrap();
        assert_eq!(found.map(|s| s.stock), Some(5));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = InMemoryInventoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let err = uow.get_product(&"missing".into()).await.unwrap_err();
        assert!(err.is_not_found());

        let err = uow
            .update_stock(UpdateStockParams {
                guid: "missing".into(),
                stock: 1,
                updated_by: "admin".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let none = uow
            .get_stock_by_owner(&Owner::product("missing".into()))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn variant_update_keeps_owning_product() {
        let store = InMemoryInventoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let variant = uow
            .insert_product_variant(InsertProductVariantParams {
                guid: EntityId::generate(),
                product_id: "P1".into(),
                name: "Red".to_string(),
                sku: "R".to_string(),
                is_active: true,
                created_by: "admin".into(),
            })
            .await
            .unwrap();

        let err = uow
            .update_product_variant(UpdateProductVariantParams {
                guid: variant.guid.clone(),
                product_id: "P2".into(),
                name: "Blue".to_string(),
                sku: "B".to_string(),
                is_active: true,
                updated_by: "admin".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_write_failure_hits_the_nth_write() {
        let store = InMemoryInventoryStore::new();
        store.fail_on_write(2).await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.insert_product(product_params(&"C1".into())).await.is_ok());
        let err = uow
            .insert_stock(stock_params(Owner::product("P1".into()), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Injected(_)));
    }

    #[tokio::test]
    async fn injected_commit_failure_publishes_nothing() {
        let store = InMemoryInventoryStore::new();
        store.fail_commit().await;

        let mut uow = store.begin().await.unwrap();
        uow.insert_product(product_params(&"C1".into())).await.unwrap();
        assert!(uow.commit().await.is_err());
        assert_eq!(store.counts().await.products, 0);

        store.clear_faults().await;
        let uow = store.begin().await.unwrap();
        assert!(uow.commit().await.is_ok());
    }

    #[tokio::test]
    async fn stock_logs_are_listed_per_owner_in_order() {
        let store = InMemoryInventoryStore::new();
        let owner = Owner::product("P1".into());
        let other = Owner::product("P2".into());

        let mut uow = store.begin().await.unwrap();
        for (owner, qty) in [(&owner, 10), (&other, 3), (&owner, 4)] {
            uow.insert_stock_log(InsertStockLogParams {
                guid: EntityId::generate(),
                owner: owner.clone(),
                stock_log: qty,
                stock_type: StockType::In,
                note: None,
                created_by: "admin".into(),
            })
            .await
            .unwrap();
        }
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let entries = uow.list_stock_logs(&owner).await.unwrap();
        let quantities: Vec<_> = entries.iter().map(|e| e.stock_log).collect();
        assert_eq!(quantities, vec![10, 4]);
    }

    #[tokio::test]
    async fn list_stocks_filters_and_pages() {
        let store = InMemoryInventoryStore::new();
        let mut uow = store.begin().await.unwrap();
        for qty in [1, 5, 10, 20, 40] {
            let mut params = product_params(&"C1".into());
            params.name = format!("Widget {qty}");
            let product = uow.insert_product(params).await.unwrap();
            uow.insert_stock(stock_params(Owner::product(product.guid), qty))
                .await
                .unwrap();
        }
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let query = StockQuery::new()
            .stock_greater_than(1)
            .order_by(StockOrder::Stock, SortDirection::Desc)
            .limit(2)
            .page(2);

        assert_eq!(uow.count_stocks(&query).await.unwrap(), 4);
        let page = uow.list_stocks(&query).await.unwrap();
        let quantities: Vec<_> = page.iter().map(|l| l.stock.stock).collect();
        assert_eq!(quantities, vec![10, 5]);
        assert_eq!(page[0].product_name.as_deref(), Some("Widget 10"));

        let by_name = StockQuery::new().product_name("WIDGET 4");
        let rows = uow.list_stocks(&by_name).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stock.stock, 40);
    }

    #[tokio::test]
    async fn categories_are_staged_until_commit() {
        let store = InMemoryInventoryStore::new();

        let mut uow = store.begin().await.unwrap();
        let category = uow
            .insert_product_category(InsertProductCategoryParams {
                guid: EntityId::generate(),
                name: "Garden Tools".to_string(),
                created_by: "admin".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            uow.get_product_category(&category.guid).await.unwrap().name,
            "Garden Tools"
        );
        uow.rollback().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.get_product_category(&category.guid).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_product_categories_filters_by_name() {
        let store = InMemoryInventoryStore::new();
        for name in ["Hand Tools", "Power Tools", "Paint"] {
            store.add_category(name, "admin".into()).await;
        }

        let mut uow = store.begin().await.unwrap();
        let query = CategoryQuery::new()
            .name("tools")
            .order_by(CategoryOrder::Name, SortDirection::Desc);
        assert_eq!(uow.count_product_categories(&query).await.unwrap(), 2);

        let names: Vec<_> = uow
            .list_product_categories(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Power Tools", "Hand Tools"]);

        let second_page = CategoryQuery::new().limit(2).page(2);
        assert_eq!(uow.list_product_categories(&second_page).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_products_filters_and_pages() {
        let store = InMemoryInventoryStore::new();
        let tools: EntityId = "C1".into();
        let paint: EntityId = "C2".into();

        let mut uow = store.begin().await.unwrap();
        for (name, category, is_variant) in [
            ("Hammer", &tools, false),
            ("Saw", &tools, true),
            ("Wrench", &tools, false),
            ("Primer", &paint, false),
        ] {
            let mut params = product_params(category);
            params.name = name.to_string();
            params.is_variant = is_variant;
            uow.insert_product(params).await.unwrap();
        }
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let flat_tools = ProductQuery::new()
            .category(tools.clone())
            .is_variant(false)
            .order_by(ProductOrder::Name, SortDirection::Asc);
        assert_eq!(uow.count_products(&flat_tools).await.unwrap(), 2);
        let names: Vec<_> = uow
            .list_products(&flat_tools)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Hammer", "Wrench"]);

        let paged = ProductQuery::new()
            .order_by(ProductOrder::Name, SortDirection::Asc)
            .limit(3)
            .page(2);
        assert_eq!(uow.count_products(&paged).await.unwrap(), 4);
        let rest = uow.list_products(&paged).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "Wrench");

        let by_name = ProductQuery::new().name("PRIM");
        assert_eq!(uow.list_products(&by_name).await.unwrap()[0].name, "Primer");
    }
}
