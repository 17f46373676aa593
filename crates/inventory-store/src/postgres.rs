use async_trait::async_trait;
use common::EntityId;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow};

use crate::{
    Audit, CategoryQuery, InsertProductCategoryParams, InsertProductParams,
    InsertProductPriceParams, InsertProductVariantParams, InsertStockLogParams, InsertStockParams,
    Owner, Product, ProductCategory, ProductPrice, ProductQuery, ProductVariant, Result, Stock,
    StockListing, StockLog, StockQuery, StoreError, UpdateProductParams, UpdateProductPriceParams,
    UpdateProductVariantParams, UpdateStockParams,
    repository::{InventoryRepository, InventoryStore, UnitOfWork},
};

const AUDIT_COLUMNS: &str = "created_at, created_by, updated_at, updated_by, deleted_at, deleted_by";

const OWNER_MATCH: &str =
    "product_id = $1 AND product_variant_id IS NOT DISTINCT FROM $2 AND deleted_at IS NULL";

fn category_columns() -> String {
    format!("guid, name, {AUDIT_COLUMNS}")
}

fn product_columns() -> String {
    format!(
        "guid, category_id, name, product_code, product_sku, is_variant, description, product_picture_url, {AUDIT_COLUMNS}"
    )
}

fn variant_columns() -> String {
    format!("guid, product_id, name, sku, is_active, {AUDIT_COLUMNS}")
}

fn price_columns() -> String {
    format!(
        "guid, product_id, product_variant_id, price, discount_type, discount, is_active, {AUDIT_COLUMNS}"
    )
}

fn stock_columns() -> String {
    format!("guid, product_id, product_variant_id, stock, {AUDIT_COLUMNS}")
}

fn stock_log_columns() -> String {
    format!(
        "guid, product_id, product_variant_id, stock_log, stock_type::text AS stock_type, note, {AUDIT_COLUMNS}"
    )
}

/// PostgreSQL-backed inventory store.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> Result<PostgresUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// A unit of work bound to one PostgreSQL transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn audit_from_row(row: &PgRow) -> Result<Audit> {
    Ok(Audit {
        created_at: row.try_get("created_at")?,
        created_by: EntityId::from(row.try_get::<String, _>("created_by")?),
        updated_at: row.try_get("updated_at")?,
        updated_by: row
            .try_get::<Option<String>, _>("updated_by")?
            .map(EntityId::from),
        deleted_at: row.try_get("deleted_at")?,
        deleted_by: row
            .try_get::<Option<String>, _>("deleted_by")?
            .map(EntityId::from),
    })
}

fn owner_from_row(row: &PgRow) -> Result<Owner> {
    Owner::from_columns(
        row.try_get("product_id")?,
        row.try_get("product_variant_id")?,
    )
}

fn id_from_row(row: &PgRow, column: &str) -> Result<EntityId> {
    Ok(EntityId::from(row.try_get::<String, _>(column)?))
}

fn row_to_category(row: PgRow) -> Result<ProductCategory> {
    Ok(ProductCategory {
        guid: id_from_row(&row, "guid")?,
        name: row.try_get("name")?,
        audit: audit_from_row(&row)?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        guid: id_from_row(&row, "guid")?,
        category_id: id_from_row(&row, "category_id")?,
        name: row.try_get("name")?,
        product_code: row.try_get("product_code")?,
        product_sku: row.try_get("product_sku")?,
        is_variant: row.try_get("is_variant")?,
        description: row.try_get("description")?,
        product_picture_url: row.try_get("product_picture_url")?,
        audit: audit_from_row(&row)?,
    })
}

fn row_to_variant(row: PgRow) -> Result<ProductVariant> {
    Ok(ProductVariant {
        guid: id_from_row(&row, "guid")?,
        product_id: id_from_row(&row, "product_id")?,
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        is_active: row.try_get("is_active")?,
        audit: audit_from_row(&row)?,
    })
}

fn row_to_price(row: PgRow) -> Result<ProductPrice> {
    Ok(ProductPrice {
        guid: id_from_row(&row, "guid")?,
        owner: owner_from_row(&row)?,
        price: row.try_get("price")?,
        discount_type: row.try_get("discount_type")?,
        discount: row.try_get("discount")?,
        is_active: row.try_get("is_active")?,
        audit: audit_from_row(&row)?,
    })
}

fn row_to_stock(row: &PgRow) -> Result<Stock> {
    Ok(Stock {
        guid: id_from_row(row, "guid")?,
        owner: owner_from_row(row)?,
        stock: row.try_get("stock")?,
        audit: audit_from_row(row)?,
    })
}

fn row_to_stock_log(row: PgRow) -> Result<StockLog> {
    Ok(StockLog {
        guid: id_from_row(&row, "guid")?,
        owner: owner_from_row(&row)?,
        stock_log: row.try_get("stock_log")?,
        stock_type: row.try_get::<String, _>("stock_type")?.parse()?,
        note: row.try_get("note")?,
        audit: audit_from_row(&row)?,
    })
}

fn row_to_listing(row: PgRow) -> Result<StockListing> {
    Ok(StockListing {
        stock: row_to_stock(&row)?,
        product_name: row.try_get("product_name")?,
        product_sku: row.try_get("product_sku")?,
        variant_name: row.try_get("variant_name")?,
        variant_sku: row.try_get("variant_sku")?,
    })
}

fn push_stock_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &StockQuery) {
    builder.push(" WHERE s.deleted_at IS NULL");
    if let Some(min) = query.stock_greater_than {
        builder.push(" AND s.stock > ").push_bind(min);
    }
    if let Some(max) = query.stock_lower_than {
        builder.push(" AND s.stock < ").push_bind(max);
    }
    if let Some(ref name) = query.product_name {
        builder
            .push(" AND p.name ILIKE ")
            .push_bind(format!("%{name}%"));
    }
    if let Some(ref name) = query.variant_name {
        builder
            .push(" AND v.name ILIKE ")
            .push_bind(format!("%{name}%"));
    }
}

fn push_category_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CategoryQuery) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(ref name) = query.name {
        builder.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
    }
}

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(ref name) = query.name {
        builder.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(ref code) = query.product_code {
        builder
            .push(" AND product_code ILIKE ")
            .push_bind(format!("%{code}%"));
    }
    if let Some(ref sku) = query.product_sku {
        builder
            .push(" AND product_sku ILIKE ")
            .push_bind(format!("%{sku}%"));
    }
    if let Some(ref category_id) = query.category_id {
        builder
            .push(" AND category_id = ")
            .push_bind(category_id.as_str().to_string());
    }
    if let Some(is_variant) = query.is_variant {
        builder.push(" AND is_variant = ").push_bind(is_variant);
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, limit: u32, offset: u64) {
    builder.push(" LIMIT ").push_bind(i64::from(limit));
    builder
        .push(" OFFSET ")
        .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

const STOCK_LISTING_FROM: &str = " FROM stock s \
     LEFT JOIN product p ON p.guid = s.product_id \
     LEFT JOIN product_variant v ON v.guid = s.product_variant_id";

#[async_trait]
impl InventoryRepository for PostgresUnitOfWork {
    async fn insert_product(&mut self, params: InsertProductParams) -> Result<Product> {
        let sql = format!(
            r#"
            INSERT INTO product (guid, category_id, name, product_code, product_sku, is_variant, description, product_picture_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            product_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.category_id.as_str())
            .bind(&params.name)
            .bind(&params.product_code)
            .bind(&params.product_sku)
            .bind(params.is_variant)
            .bind(&params.description)
            .bind(params.product_picture_url.as_deref())
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_product(row)
    }

    async fn update_product(&mut self, params: UpdateProductParams) -> Result<Product> {
        let sql = format!(
            r#"
            UPDATE product
            SET category_id = $2, name = $3, product_sku = $4, description = $5,
                product_picture_url = $6, updated_by = $7, updated_at = NOW()
            WHERE guid = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            product_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.category_id.as_str())
            .bind(&params.name)
            .bind(&params.product_sku)
            .bind(&params.description)
            .bind(params.product_picture_url.as_deref())
            .bind(params.updated_by.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("product", &params.guid))?;

        row_to_product(row)
    }

    async fn get_product(&mut self, guid: &EntityId) -> Result<Product> {
        let sql = format!("SELECT {} FROM product WHERE guid = $1", product_columns());
        let row = sqlx::query(&sql)
            .bind(guid.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("product", guid))?;

        row_to_product(row)
    }

    async fn list_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM product", product_columns()));
        push_product_filters(&mut builder, query);

        let direction = query.direction.keyword();
        builder.push(format!(
            " ORDER BY {} {direction}, guid {direction}",
            query.order.column()
        ));
        push_page(&mut builder, query.limit, query.offset());

        let rows = builder.build().fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn count_products(&mut self, query: &ProductQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product");
        push_product_filters(&mut builder, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_product_category(
        &mut self,
        params: InsertProductCategoryParams,
    ) -> Result<ProductCategory> {
        let sql = format!(
            r#"
            INSERT INTO product_category (guid, name, created_by)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            category_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(&params.name)
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_category(row)
    }

    async fn list_product_categories(
        &mut self,
        query: &CategoryQuery,
    ) -> Result<Vec<ProductCategory>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM product_category",
            category_columns()
        ));
        push_category_filters(&mut builder, query);

        let direction = query.direction.keyword();
        builder.push(format!(
            " ORDER BY {} {direction}, guid {direction}",
            query.order.column()
        ));
        push_page(&mut builder, query.limit, query.offset());

        let rows = builder.build().fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(row_to_category).collect()
    }

    async fn count_product_categories(&mut self, query: &CategoryQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM product_category");
        push_category_filters(&mut builder, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn get_product_category(&mut self, guid: &EntityId) -> Result<ProductCategory> {
        let sql = format!(
            "SELECT {} FROM product_category WHERE guid = $1",
            category_columns()
        );
        let row = sqlx::query(&sql)
            .bind(guid.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("product category", guid))?;

        row_to_category(row)
    }

    async fn insert_product_variant(
        &mut self,
        params: InsertProductVariantParams,
    ) -> Result<ProductVariant> {
        let sql = format!(
            r#"
            INSERT INTO product_variant (guid, product_id, name, sku, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            variant_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.product_id.as_str())
            .bind(&params.name)
            .bind(&params.sku)
            .bind(params.is_active)
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_variant(row)
    }

    async fn update_product_variant(
        &mut self,
        params: UpdateProductVariantParams,
    ) -> Result<ProductVariant> {
        let sql = format!(
            r#"
            UPDATE product_variant
            SET name = $3, sku = $4, is_active = $5, updated_by = $6, updated_at = NOW()
            WHERE guid = $1 AND product_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            variant_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.product_id.as_str())
            .bind(&params.name)
            .bind(&params.sku)
            .bind(params.is_active)
            .bind(params.updated_by.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("product variant", &params.guid))?;

        row_to_variant(row)
    }

    async fn get_product_variant_by_name(
        &mut self,
        product_id: &EntityId,
        name: &str,
    ) -> Result<Option<ProductVariant>> {
        let sql = format!(
            "SELECT {} FROM product_variant WHERE product_id = $1 AND name = $2 AND deleted_at IS NULL LIMIT 1",
            variant_columns()
        );
        let row = sqlx::query(&sql)
            .bind(product_id.as_str())
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_variant).transpose()
    }

    async fn list_product_variants(
        &mut self,
        product_id: &EntityId,
    ) -> Result<Vec<ProductVariant>> {
        let sql = format!(
            "SELECT {} FROM product_variant WHERE product_id = $1 AND deleted_at IS NULL ORDER BY id ASC",
            variant_columns()
        );
        let rows = sqlx::query(&sql)
            .bind(product_id.as_str())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(row_to_variant).collect()
    }

    async fn insert_product_price(
        &mut self,
        params: InsertProductPriceParams,
    ) -> Result<ProductPrice> {
        let sql = format!(
            r#"
            INSERT INTO product_price (guid, product_id, product_variant_id, price, discount_type, discount, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            price_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.owner.product_id().as_str())
            .bind(params.owner.variant_id().map(EntityId::as_str))
            .bind(params.price)
            .bind(params.discount_type.as_deref())
            .bind(params.discount)
            .bind(params.is_active)
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_price(row)
    }

    async fn update_product_price(
        &mut self,
        params: UpdateProductPriceParams,
    ) -> Result<ProductPrice> {
        let sql = format!(
            r#"
            UPDATE product_price
            SET price = $3, discount_type = $4, discount = $5, is_active = $6,
                updated_by = $7, updated_at = NOW()
            WHERE id = (
                SELECT id FROM product_price WHERE {OWNER_MATCH} ORDER BY id ASC LIMIT 1
            )
            RETURNING {}
            "#,
            price_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.owner.product_id().as_str())
            .bind(params.owner.variant_id().map(EntityId::as_str))
            .bind(params.price)
            .bind(params.discount_type.as_deref())
            .bind(params.discount)
            .bind(params.is_active)
            .bind(params.updated_by.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("product price", &params.owner))?;

        row_to_price(row)
    }

    async fn get_product_price_by_owner(&mut self, owner: &Owner) -> Result<Option<ProductPrice>> {
        let sql = format!(
            "SELECT {} FROM product_price WHERE {OWNER_MATCH} ORDER BY id ASC LIMIT 1",
            price_columns()
        );
        let row = sqlx::query(&sql)
            .bind(owner.product_id().as_str())
            .bind(owner.variant_id().map(EntityId::as_str))
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_price).transpose()
    }

    async fn insert_stock(&mut self, params: InsertStockParams) -> Result<Stock> {
        let sql = format!(
            r#"
            INSERT INTO stock (guid, product_id, product_variant_id, stock, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            stock_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.owner.product_id().as_str())
            .bind(params.owner.variant_id().map(EntityId::as_str))
            .bind(params.stock)
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_stock(&row)
    }

    async fn update_stock(&mut self, params: UpdateStockParams) -> Result<Stock> {
        let sql = format!(
            r#"
            UPDATE stock
            SET stock = $2, updated_by = $3, updated_at = NOW()
            WHERE guid = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            stock_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.stock)
            .bind(params.updated_by.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("stock", &params.guid))?;

        row_to_stock(&row)
    }

    async fn get_stock(&mut self, guid: &EntityId) -> Result<Stock> {
        let sql = format!(
            "SELECT {} FROM stock WHERE guid = $1 AND deleted_at IS NULL",
            stock_columns()
        );
        let row = sqlx::query(&sql)
            .bind(guid.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::not_found("stock", guid))?;

        row_to_stock(&row)
    }

    async fn get_stock_by_owner(&mut self, owner: &Owner) -> Result<Option<Stock>> {
        let sql = format!(
            "SELECT {} FROM stock WHERE {OWNER_MATCH} ORDER BY id ASC LIMIT 1",
            stock_columns()
        );
        let row = sqlx::query(&sql)
            .bind(owner.product_id().as_str())
            .bind(owner.variant_id().map(EntityId::as_str))
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(row_to_stock).transpose()
    }

    async fn insert_stock_log(&mut self, params: InsertStockLogParams) -> Result<StockLog> {
        let sql = format!(
            r#"
            INSERT INTO stock_log (guid, product_id, product_variant_id, stock_log, stock_type, note, created_by)
            VALUES ($1, $2, $3, $4, $5::stock_type_enum, $6, $7)
            RETURNING {}
            "#,
            stock_log_columns()
        );
        let row = sqlx::query(&sql)
            .bind(params.guid.as_str())
            .bind(params.owner.product_id().as_str())
            .bind(params.owner.variant_id().map(EntityId::as_str))
            .bind(params.stock_log)
            .bind(params.stock_type.as_str())
            .bind(params.note.as_deref())
            .bind(params.created_by.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row_to_stock_log(row)
    }

    async fn list_stock_logs(&mut self, owner: &Owner) -> Result<Vec<StockLog>> {
        let sql = format!(
            "SELECT {} FROM stock_log WHERE {OWNER_MATCH} ORDER BY id ASC",
            stock_log_columns()
        );
        let rows = sqlx::query(&sql)
            .bind(owner.product_id().as_str())
            .bind(owner.variant_id().map(EntityId::as_str))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(row_to_stock_log).collect()
    }

    async fn list_stocks(&mut self, query: &StockQuery) -> Result<Vec<StockListing>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT s.guid, s.product_id, s.product_variant_id, s.stock, \
             s.created_at, s.created_by, s.updated_at, s.updated_by, s.deleted_at, s.deleted_by, \
             p.name AS product_name, p.product_sku AS product_sku, \
             v.name AS variant_name, v.sku AS variant_sku",
        );
        builder.push(STOCK_LISTING_FROM);
        push_stock_filters(&mut builder, query);

        let direction = query.direction.keyword();
        builder.push(format!(
            " ORDER BY {} {direction}, s.guid {direction}",
            query.order.column()
        ));
        push_page(&mut builder, query.limit, query.offset());

        let rows = builder.build().fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(row_to_listing).collect()
    }

    async fn count_stocks(&mut self, query: &StockQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        builder.push(STOCK_LISTING_FROM);
        push_stock_filters(&mut builder, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        metrics::counter!("inventory_store_transactions_total", "outcome" => "commit").increment(1);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        metrics::counter!("inventory_store_transactions_total", "outcome" => "rollback")
            .increment(1);
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}
