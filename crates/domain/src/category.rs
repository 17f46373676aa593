//! Product category handlers.

use common::{ActorId, EntityId};
use inventory_store::{
    CategoryQuery, InsertProductCategoryParams, InventoryRepository, InventoryStore,
    ProductCategory,
};

use crate::error::{EngineError, StepExt};
use crate::page::Page;
use crate::unit_of_work;

/// Creates one product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductCategory {
    pub category: InsertProductCategoryParams,
}

impl CreateProductCategory {
    pub fn new(name: impl Into<String>, actor: &ActorId) -> Self {
        Self {
            category: InsertProductCategoryParams {
                guid: EntityId::generate(),
                name: name.into(),
                created_by: actor.as_entity_id().clone(),
            },
        }
    }

    pub fn category_id(&self) -> &EntityId {
        &self.category.guid
    }
}

/// Service for creating and reading product categories.
pub struct CategoryService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self, cmd), fields(category_id = %cmd.category_id()))]
    pub async fn create_category(
        &self,
        cmd: CreateProductCategory,
    ) -> Result<ProductCategory, EngineError> {
        let category = unit_of_work::run(&self.store, "create product category", |tx| {
            Box::pin(async move {
                tx.insert_product_category(cmd.category)
                    .await
                    .step("insert product category")
            })
        })
        .await?;

        tracing::info!("product category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_category(&self, category_id: EntityId) -> Result<ProductCategory, EngineError> {
        unit_of_work::read(&self.store, "get product category", |tx| {
            Box::pin(async move {
                tx.get_product_category(&category_id)
                    .await
                    .step("get product category")
            })
        })
        .await
    }

    /// Lists live categories.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(
        &self,
        query: CategoryQuery,
    ) -> Result<Page<ProductCategory>, EngineError> {
        unit_of_work::read(&self.store, "list product categories", |tx| {
            Box::pin(async move {
                let items = tx
                    .list_product_categories(&query)
                    .await
                    .step("list product categories")?;
                let total = tx
                    .count_product_categories(&query)
                    .await
                    .step("count product categories")?;
                Ok(Page::new(items, total, query.page, query.limit))
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use inventory_store::{CategoryOrder, InMemoryInventoryStore, SortDirection};

    #[tokio::test]
    async fn test_created_category_can_be_read_back() {
        let store = InMemoryInventoryStore::new();
        let service = CategoryService::new(store);

        let cmd = CreateProductCategory::new("Garden", &ActorId::from("admin"));
        let category_id = cmd.category_id().clone();
        let created = service.create_category(cmd).await.unwrap();

        assert_eq!(created.guid, category_id);
        assert_eq!(created.audit.created_by.as_str(), "admin");

        let loaded = service.get_category(category_id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_missing_category_is_not_found() {
        let service = CategoryService::new(InMemoryInventoryStore::new());

        let err = service.get_category("missing".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failed_insert_creates_nothing() {
        let store = InMemoryInventoryStore::new();
        store.fail_on_write(1).await;
        let service = CategoryService::new(store.clone());

        let err = service
            .create_category(CreateProductCategory::new("Garden", &ActorId::from("admin")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);

        store.clear_faults().await;
        let page = service.list_categories(CategoryQuery::new()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_list_categories_pages_with_total() {
        let store = InMemoryInventoryStore::new();
        let service = CategoryService::new(store);
        let actor = ActorId::from("admin");
        for name in ["Bath", "Garden", "Kitchen"] {
            service
                .create_category(CreateProductCategory::new(name, &actor))
                .await
                .unwrap();
        }

        let query = CategoryQuery::new()
            .order_by(CategoryOrder::Name, SortDirection::Asc)
            .limit(2)
            .page(2);
        let page = service.list_categories(query).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Kitchen");
    }
}
