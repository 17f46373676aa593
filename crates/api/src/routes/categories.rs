//! Product category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{CreateProductCategory, Page};
use inventory_store::{CategoryOrder, CategoryQuery, InventoryStore, ProductCategory, SortDirection};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::actor::Actor;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
}

/// Query string of `GET /categories`.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesParams {
    pub name: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order: Option<CategoryOrder>,
    pub sort: Option<SortDirection>,
}

impl ListCategoriesParams {
    fn into_query(self) -> CategoryQuery {
        let mut query = CategoryQuery::new().order_by(
            self.order.unwrap_or_default(),
            self.sort.unwrap_or_default(),
        );
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            query = query.name(name);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        query
    }
}

/// POST /categories: create a product category.
#[tracing::instrument(skip(state, actor, req))]
pub async fn create<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ProductCategory>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required field".to_string()));
    }

    let cmd = CreateProductCategory::new(name, &actor);
    let category = state.categories.create_category(cmd).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories: list live categories.
#[tracing::instrument(skip(state))]
pub async fn list<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListCategoriesParams>,
) -> Result<Json<Page<ProductCategory>>, ApiError> {
    let page = state.categories.list_categories(params.into_query()).await?;
    Ok(Json(page))
}

/// GET /categories/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductCategory>, ApiError> {
    let category = state.categories.get_category(EntityId::from(id)).await?;
    Ok(Json(category))
}
