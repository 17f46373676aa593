//! Product create, update, read and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{
    CreateProductWithVariant, CreateProductWithoutVariant, FlatProductAggregate, Page,
    PriceFields, ProductAggregate, ProductFields, UpdateProductWithVariant,
    UpdateProductWithoutVariant, VariantFields, VariantProductAggregate,
};
use inventory_store::{InventoryStore, Product, ProductOrder, ProductQuery, SortDirection};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::actor::Actor;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_category_id: String,
    pub name: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub stock: i64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductWithVariantRequest {
    pub product_category_id: String,
    pub name: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    pub product_variant: Vec<VariantRequest>,
}

/// One variant line. `id` names the existing variant on update and is
/// ignored on create.
#[derive(Debug, Deserialize)]
pub struct VariantRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub stock: i64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub stock: i64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductWithVariantRequest {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    pub product_variant: Vec<VariantRequest>,
}

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub sku: Option<String>,
    pub product_category_id: Option<String>,
    pub is_variant: Option<bool>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub order: Option<ProductOrder>,
    pub sort: Option<SortDirection>,
}

impl ListProductsParams {
    fn into_query(self) -> ProductQuery {
        let mut query = ProductQuery::new().order_by(
            self.order.unwrap_or_default(),
            self.sort.unwrap_or_default(),
        );
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            query = query.name(name);
        }
        if let Some(code) = self.product_code.filter(|c| !c.is_empty()) {
            query = query.product_code(code);
        }
        if let Some(sku) = self.sku.filter(|s| !s.is_empty()) {
            query = query.product_sku(sku);
        }
        if let Some(category_id) = self.product_category_id.filter(|id| !id.is_empty()) {
            query = query.category(EntityId::from(category_id));
        }
        if let Some(is_variant) = self.is_variant {
            query = query.is_variant(is_variant);
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

// -- Request validation and mapping --

fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::BadRequest(format!("{field} is required field")))
    } else {
        Ok(())
    }
}

fn price_fields(
    price: i64,
    discount_type: Option<String>,
    discount: i64,
    is_active: bool,
) -> Result<PriceFields, ApiError> {
    if price < 0 {
        return Err(ApiError::BadRequest("price must not be negative".to_string()));
    }
    if discount < 0 {
        return Err(ApiError::BadRequest(
            "discount must not be negative".to_string(),
        ));
    }
    Ok(PriceFields {
        price,
        discount_type: discount_type.filter(|t| !t.is_empty()),
        discount: Some(discount),
        is_active,
    })
}

fn stock_quantity(stock: i64) -> Result<i64, ApiError> {
    if stock < 0 {
        Err(ApiError::BadRequest("stock must not be negative".to_string()))
    } else {
        Ok(stock)
    }
}

impl VariantRequest {
    fn into_fields(self) -> Result<(Option<String>, VariantFields), ApiError> {
        required("variant_name", &self.name)?;
        let fields = VariantFields {
            price: price_fields(self.price, self.discount_type, self.discount, self.is_active)?,
            stock: stock_quantity(self.stock)?,
            name: self.name,
            sku: self.sku,
            is_active: self.is_active,
        };
        Ok((self.id, fields))
    }
}

fn update_fields(
    category_id: String,
    name: String,
    product_sku: String,
    description: String,
    profile_picture_url: Option<String>,
) -> Result<ProductFields, ApiError> {
    required("category_id", &category_id)?;
    required("name", &name)?;
    Ok(ProductFields {
        category_id: EntityId::from(category_id),
        name,
        product_code: String::new(),
        product_sku,
        description,
        product_picture_url: profile_picture_url,
    })
}

// -- Handlers --

/// POST /products: create a product without variants.
#[tracing::instrument(skip(state, actor, req))]
pub async fn create<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<FlatProductAggregate>), ApiError> {
    required("product_category_id", &req.product_category_id)?;
    required("name", &req.name)?;

    let price = price_fields(req.price, req.discount_type, req.discount, req.is_active)?;
    let stock = stock_quantity(req.stock)?;
    let fields = ProductFields {
        category_id: EntityId::from(req.product_category_id),
        name: req.name,
        product_code: req.product_code,
        product_sku: req.product_sku,
        description: req.description,
        product_picture_url: req.profile_picture_url,
    };

    let cmd = CreateProductWithoutVariant::new(fields, price, stock, &actor);
    let aggregate = state.products.create_product_without_variant(cmd).await?;

    Ok((StatusCode::CREATED, Json(aggregate)))
}

/// POST /products/variants: create a product with its variants.
#[tracing::instrument(skip(state, actor, req))]
pub async fn create_with_variants<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<CreateProductWithVariantRequest>,
) -> Result<(StatusCode, Json<VariantProductAggregate>), ApiError> {
    required("product_category_id", &req.product_category_id)?;
    required("name", &req.name)?;

    let variants = req
        .product_variant
        .into_iter()
        .map(|v| v.into_fields().map(|(_, fields)| fields))
        .collect::<Result<Vec<_>, _>>()?;
    let fields = ProductFields {
        category_id: EntityId::from(req.product_category_id),
        name: req.name,
        product_code: req.product_code,
        product_sku: req.product_sku,
        description: req.description,
        product_picture_url: req.profile_picture_url,
    };

    let cmd = CreateProductWithVariant::new(fields, variants, &actor);
    let aggregate = state.products.create_product_with_variant(cmd).await?;

    Ok((StatusCode::CREATED, Json(aggregate)))
}

/// PUT /products/:id: update a product without variants.
#[tracing::instrument(skip(state, actor, req))]
pub async fn update<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Actor(actor): Actor,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<FlatProductAggregate>, ApiError> {
    let price = price_fields(req.price, req.discount_type, req.discount, req.is_active)?;
    let stock = stock_quantity(req.stock)?;
    let fields = update_fields(
        req.category_id,
        req.name,
        req.product_sku,
        req.description,
        req.profile_picture_url,
    )?;

    let cmd = UpdateProductWithoutVariant::new(EntityId::from(id), fields, price, stock, &actor);
    let aggregate = state.products.update_product_without_variant(cmd).await?;

    Ok(Json(aggregate))
}

/// PUT /products/:id/variants: update a product and the listed variants.
#[tracing::instrument(skip(state, actor, req))]
pub async fn update_with_variants<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Actor(actor): Actor,
    Json(req): Json<UpdateProductWithVariantRequest>,
) -> Result<Json<VariantProductAggregate>, ApiError> {
    let fields = update_fields(
        req.category_id,
        req.name,
        req.product_sku,
        req.description,
        req.profile_picture_url,
    )?;

    let mut variants = Vec::with_capacity(req.product_variant.len());
    for variant in req.product_variant {
        let (variant_id, fields) = variant.into_fields()?;
        let variant_id = variant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("variant id is required field".to_string()))?;
        variants.push((EntityId::from(variant_id), fields));
    }

    let cmd = UpdateProductWithVariant::new(EntityId::from(id), fields, variants, &actor);
    let aggregate = state.products.update_product_with_variant(cmd).await?;

    Ok(Json(aggregate))
}

/// GET /products/:id: load a product with its prices and stock rows.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductAggregate>, ApiError> {
    let aggregate = state.products.get_product(EntityId::from(id)).await?;
    Ok(Json(aggregate))
}

/// GET /products: list live products.
#[tracing::instrument(skip(state))]
pub async fn list<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    let page = state.products.list_products(params.into_query()).await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required("name", "Widget").is_ok());
        assert!(matches!(
            required("name", "   "),
            Err(ApiError::BadRequest(msg)) if msg == "name is required field"
        ));
    }

    #[test]
    fn test_price_fields_drop_empty_discount_type() {
        let fields = price_fields(1000, Some(String::new()), 0, true).unwrap();
        assert_eq!(fields.price, 1000);
        assert_eq!(fields.discount_type, None);
        assert!(fields.is_active);

        assert!(price_fields(-1, None, 0, true).is_err());
        assert!(price_fields(10, None, -5, true).is_err());
    }

    #[test]
    fn test_list_params_skip_blank_filters() {
        let params = ListProductsParams {
            name: Some(String::new()),
            product_category_id: Some("C1".to_string()),
            is_variant: Some(false),
            page: Some(2),
            ..ListProductsParams::default()
        };

        let query = params.into_query();
        assert_eq!(query.name, None);
        assert_eq!(query.category_id, Some(EntityId::from("C1")));
        assert_eq!(query.is_variant, Some(false));
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn test_variant_request_requires_name() {
        let req: VariantRequest =
            serde_json::from_str(r#"{"name": "", "is_active": true}"#).unwrap();
        assert!(req.into_fields().is_err());

        let req: VariantRequest = serde_json::from_str(
            r#"{"id": "V1", "name": "Large", "sku": "L", "price": 20, "stock": 3, "is_active": true}"#,
        )
        .unwrap();
        let (id, fields) = req.into_fields().unwrap();
        assert_eq!(id.as_deref(), Some("V1"));
        assert_eq!(fields.name, "Large");
        assert_eq!(fields.stock, 3);
        assert_eq!(fields.price.price, 20);
    }
}
