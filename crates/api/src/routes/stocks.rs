//! Stock listing, batch update and ledger history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::EntityId;
use domain::{Page, StockHistory, StockMovement, UpdateStock};
use inventory_store::{InventoryStore, SortDirection, Stock, StockListing, StockOrder, StockQuery};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::actor::Actor;

/// Query string of `GET /stocks`.
#[derive(Debug, Default, Deserialize)]
pub struct ListStocksParams {
    pub stock_greater_than: Option<i64>,
    pub stock_lower_than: Option<i64>,
    pub product_name: Option<String>,
    pub variant_name: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order: Option<StockOrder>,
    pub sort: Option<SortDirection>,
}

impl ListStocksParams {
    fn into_query(self) -> StockQuery {
        let mut query = StockQuery::new().order_by(
            self.order.unwrap_or_default(),
            self.sort.unwrap_or_default(),
        );
        if let Some(stock) = self.stock_greater_than {
            query = query.stock_greater_than(stock);
        }
        if let Some(stock) = self.stock_lower_than {
            query = query.stock_lower_than(stock);
        }
        if let Some(name) = self.product_name.filter(|n| !n.is_empty()) {
            query = query.product_name(name);
        }
        if let Some(name) = self.variant_name.filter(|n| !n.is_empty()) {
            query = query.variant_name(name);
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

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub id: String,
    pub stock: i64,
}

/// GET /stocks: list live stock rows with product and variant names.
#[tracing::instrument(skip(state))]
pub async fn list<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListStocksParams>,
) -> Result<Json<Page<StockListing>>, ApiError> {
    let page = state.stocks.list_stocks(params.into_query()).await?;
    Ok(Json(page))
}

/// GET /stocks/:id: load one stock row.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Stock>, ApiError> {
    let stock = state.stocks.get_stock(EntityId::from(id)).await?;
    Ok(Json(stock))
}

/// PUT /stocks: set several stock rows to new quantities in one transaction.
#[tracing::instrument(skip(state, actor, req))]
pub async fn update<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<Vec<UpdateStockRequest>>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::BadRequest("no stock items given".to_string()));
    }

    let mut items = Vec::with_capacity(req.len());
    for item in req {
        if item.id.trim().is_empty() {
            return Err(ApiError::BadRequest("id is required field".to_string()));
        }
        if item.stock < 0 {
            return Err(ApiError::BadRequest(
                "stock must not be negative".to_string(),
            ));
        }
        items.push(UpdateStock::new(EntityId::from(item.id), item.stock));
    }

    let movements = state.stocks.update_stock_batch(items, actor).await?;
    Ok(Json(movements))
}

/// GET /stocks/:id/history: ledger entries of a stock row, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StockHistory>, ApiError> {
    let history = state.stocks.stock_history(EntityId::from(id)).await?;
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_give_default_query() {
        assert_eq!(ListStocksParams::default().into_query(), StockQuery::new());
    }

    #[test]
    fn test_params_map_onto_query() {
        let params = ListStocksParams {
            stock_greater_than: Some(5),
            product_name: Some("widget".to_string()),
            variant_name: Some(String::new()),
            limit: Some(25),
            page: Some(2),
            order: Some(StockOrder::Stock),
            sort: Some(SortDirection::Desc),
            ..ListStocksParams::default()
        };

        let query = params.into_query();
        assert_eq!(query.stock_greater_than, Some(5));
        assert_eq!(query.product_name.as_deref(), Some("widget"));
        assert_eq!(query.variant_name, None);
        assert_eq!(query.offset(), 25);
        assert_eq!(query.order, StockOrder::Stock);
        assert_eq!(query.direction, SortDirection::Desc);
    }
}
