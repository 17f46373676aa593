//! Product command handlers.

use common::{ActorId, EntityId};
use inventory_store::{
    InventoryRepository, InventoryStore, Owner, Product, ProductQuery, Stock, StockLog,
};

use crate::error::{EngineError, StepExt};
use crate::guard::ensure_variant_name_available;
use crate::ledger::{UPDATE_STOCK_NOTE, derive_ledger_entry, record_entries};
use crate::page::Page;
use crate::unit_of_work;

use super::{
    CreateProductWithVariant, CreateProductWithoutVariant, FlatProductAggregate, ProductAggregate,
    StockChange, UpdateProductWithVariant, UpdateProductWithoutVariant, VariantLine,
    VariantProductAggregate,
};

/// Service for creating, updating and reading products.
///
/// Holds no per-call state: every handler opens its own unit of work and
/// takes the acting user from its command.
pub struct ProductService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> ProductService<S> {
    /// Creates a new product service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a product with its price, stock row and first ledger entry.
    #[tracing::instrument(skip(self, cmd), fields(product_id = %cmd.product_id()))]
    pub async fn create_product_without_variant(
        &self,
        cmd: CreateProductWithoutVariant,
    ) -> Result<FlatProductAggregate, EngineError> {
        let aggregate = unit_of_work::run(&self.store, "create product without variant", |tx| {
            Box::pin(create_flat(tx, cmd))
        })
        .await?;

        record_entries(aggregate.stock_log.iter());
        tracing::info!("product created");
        Ok(aggregate)
    }

    /// Creates a product and, per variant in order, the variant with its
    /// price, first ledger entry and stock row.
    #[tracing::instrument(
        skip(self, cmd),
        fields(product_id = %cmd.product_id(), variants = cmd.variants.len())
    )]
    pub async fn create_product_with_variant(
        &self,
        cmd: CreateProductWithVariant,
    ) -> Result<VariantProductAggregate, EngineError> {
        let aggregate = unit_of_work::run(&self.store, "create product with variant", |tx| {
            Box::pin(create_with_variants(tx, cmd))
        })
        .await?;

        record_entries(aggregate.variants.iter().filter_map(|l| l.stock_log.as_ref()));
        tracing::info!("product created");
        Ok(aggregate)
    }

    /// Updates a product without variants, its price and, when a stock row
    /// exists, its stock.
    #[tracing::instrument(skip(self, cmd), fields(product_id = %cmd.product.guid))]
    pub async fn update_product_without_variant(
        &self,
        cmd: UpdateProductWithoutVariant,
    ) -> Result<FlatProductAggregate, EngineError> {
        let aggregate = unit_of_work::run(&self.store, "update product without variant", |tx| {
            Box::pin(update_flat(tx, cmd))
        })
        .await?;

        record_entries(aggregate.stock_log.iter());
        tracing::info!(stock_moved = aggregate.stock.is_some(), "product updated");
        Ok(aggregate)
    }

    /// Updates a product and each listed variant with its price and, when a
    /// stock row exists, its stock.
    #[tracing::instrument(
        skip(self, cmd),
        fields(product_id = %cmd.product.guid, variants = cmd.variants.len())
    )]
    pub async fn update_product_with_variant(
        &self,
        cmd: UpdateProductWithVariant,
    ) -> Result<VariantProductAggregate, EngineError> {
        let aggregate = unit_of_work::run(&self.store, "update product with variant", |tx| {
            Box::pin(update_with_variants(tx, cmd))
        })
        .await?;

        record_entries(aggregate.variants.iter().filter_map(|l| l.stock_log.as_ref()));
        tracing::info!("product updated");
        Ok(aggregate)
    }

    /// Loads a product with its category, prices and stock rows.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: EntityId) -> Result<ProductAggregate, EngineError> {
        unit_of_work::read(&self.store, "get product", |tx| {
            Box::pin(load_product(tx, product_id))
        })
        .await
    }

    /// Lists live product rows.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>, EngineError> {
        unit_of_work::read(&self.store, "list products", |tx| {
            Box::pin(async move {
                let items = tx.list_products(&query).await.step("list products")?;
                let total = tx.count_products(&query).await.step("count products")?;
                Ok(Page::new(items, total, query.page, query.limit))
            })
        })
        .await
    }
}

fn ensure_shape(product: &Product, is_variant: bool) -> Result<(), EngineError> {
    if product.is_variant == is_variant {
        Ok(())
    } else {
        tracing::warn!(product_id = %product.guid, product.is_variant, "command shape mismatch");
        Err(EngineError::ShapeMismatch {
            product_id: product.guid.clone(),
            is_variant: product.is_variant,
        })
    }
}

/// Moves the owner's stock row to the requested quantity and appends the
/// derived ledger entry. Does nothing when the owner has no stock row.
///
/// The stock row is read without a lock.
async fn apply_stock_change<U>(
    tx: &mut U,
    owner: Owner,
    change: StockChange,
    actor: &ActorId,
) -> Result<(Option<Stock>, Option<StockLog>), EngineError>
where
    U: InventoryRepository,
{
    let Some(existing) = tx
        .get_stock_by_owner(&owner)
        .await
        .step("get existing stock")?
    else {
        tracing::debug!(%owner, "no stock row, stock left untouched");
        return Ok((None, None));
    };

    let (update, entry) = derive_ledger_entry(
        &existing,
        change.requested,
        change.ledger_id,
        actor,
        UPDATE_STOCK_NOTE,
    );
    let stock = tx.update_stock(update).await.step("update stock")?;
    let stock_log = tx.insert_stock_log(entry).await.step("insert stock log")?;

    Ok((Some(stock), Some(stock_log)))
}

async fn create_flat<U>(
    tx: &mut U,
    cmd: CreateProductWithoutVariant,
) -> Result<FlatProductAggregate, EngineError>
where
    U: InventoryRepository,
{
    let product = tx.insert_product(cmd.product).await.step("insert product")?;
    let category = tx
        .get_product_category(&product.category_id)
        .await
        .step("get product category")?;
    let price = tx
        .insert_product_price(cmd.price)
        .await
        .step("insert product price")?;
    let stock_log = tx
        .insert_stock_log(cmd.ledger_seed)
        .await
        .step("insert stock log")?;
    let stock = tx.insert_stock(cmd.stock).await.step("insert stock")?;

    Ok(FlatProductAggregate {
        product,
        category,
        price,
        stock_log: Some(stock_log),
        stock: Some(stock),
    })
}

async fn create_with_variants<U>(
    tx: &mut U,
    cmd: CreateProductWithVariant,
) -> Result<VariantProductAggregate, EngineError>
where
    U: InventoryRepository,
{
    let product = tx.insert_product(cmd.product).await.step("insert product")?;
    let category = tx
        .get_product_category(&product.category_id)
        .await
        .step("get product category")?;

    let mut variants = Vec::with_capacity(cmd.variants.len());
    for line in cmd.variants {
        ensure_variant_name_available(tx, &line.variant.product_id, &line.variant.name).await?;

        let variant = tx
            .insert_product_variant(line.variant)
            .await
            .step("insert product variant")?;
        let price = tx
            .insert_product_price(line.price)
            .await
            .step("insert product price")?;
        let stock_log = tx
            .insert_stock_log(line.ledger_seed)
            .await
            .step("insert stock log")?;
        let stock = tx.insert_stock(line.stock).await.step("insert stock")?;

        variants.push(VariantLine {
            variant,
            price,
            stock_log: Some(stock_log),
            stock: Some(stock),
        });
    }

    Ok(VariantProductAggregate {
        product,
        category,
        variants,
    })
}

async fn update_flat<U>(
    tx: &mut U,
    cmd: UpdateProductWithoutVariant,
) -> Result<FlatProductAggregate, EngineError>
where
    U: InventoryRepository,
{
    let product = tx.update_product(cmd.product).await.step("update product")?;
    ensure_shape(&product, false)?;
    let category = tx
        .get_product_category(&product.category_id)
        .await
        .step("get product category")?;
    let price = tx
        .update_product_price(cmd.price)
        .await
        .step("update product price")?;

    let owner = Owner::product(product.guid.clone());
    let (stock, stock_log) = apply_stock_change(tx, owner, cmd.stock, &cmd.actor).await?;

    Ok(FlatProductAggregate {
        product,
        category,
        price,
        stock_log,
        stock,
    })
}

async fn update_with_variants<U>(
    tx: &mut U,
    cmd: UpdateProductWithVariant,
) -> Result<VariantProductAggregate, EngineError>
where
    U: InventoryRepository,
{
    let product = tx.update_product(cmd.product).await.step("update product")?;
    ensure_shape(&product, true)?;
    let category = tx
        .get_product_category(&product.category_id)
        .await
        .step("get product category")?;

    let mut variants = Vec::with_capacity(cmd.variants.len());
    for change in cmd.variants {
        let owner = change.owner();
        ensure_variant_name_available(tx, &change.variant.product_id, &change.variant.name)
            .await?;

        let variant = tx
            .update_product_variant(change.variant)
            .await
            .step("update product variant")?;
        let price = tx
            .update_product_price(change.price)
            .await
            .step("update product price")?;
        let (stock, stock_log) = apply_stock_change(tx, owner, change.stock, &cmd.actor).await?;

        variants.push(VariantLine {
            variant,
            price,
            stock_log,
            stock,
        });
    }

    Ok(VariantProductAggregate {
        product,
        category,
        variants,
    })
}

async fn load_product<U>(tx: &mut U, product_id: EntityId) -> Result<ProductAggregate, EngineError>
where
    U: InventoryRepository,
{
    let product = tx.get_product(&product_id).await.step("get product")?;
    let category = tx
        .get_product_category(&product.category_id)
        .await
        .step("get product category")?;

    if !product.is_variant {
        let owner = Owner::product(product.guid.clone());
        let price = load_price(tx, &owner).await?;
        let stock = tx.get_stock_by_owner(&owner).await.step("get stock")?;
        return Ok(ProductAggregate::Flat(FlatProductAggregate {
            product,
            category,
            price,
            stock_log: None,
            stock,
        }));
    }

    let rows = tx
        .list_product_variants(&product.guid)
        .await
        .step("list product variants")?;
    let mut variants = Vec::with_capacity(rows.len());
    for variant in rows {
        let owner = Owner::variant(product.guid.clone(), variant.guid.clone());
        let price = load_price(tx, &owner).await?;
        let stock = tx.get_stock_by_owner(&owner).await.step("get stock")?;
        variants.push(VariantLine {
            variant,
            price,
            stock_log: None,
            stock,
        });
    }

    Ok(ProductAggregate::Variant(VariantProductAggregate {
        product,
        category,
        variants,
    }))
}

async fn load_price<U>(tx: &mut U, owner: &Owner) -> Result<inventory_store::ProductPrice, EngineError>
where
    U: InventoryRepository,
{
    tx.get_product_price_by_owner(owner)
        .await
        .step("get product price")?
        .ok_or_else(|| EngineError::NotFound {
            entity: "product price",
            key: owner.to_string(),
        })
}
