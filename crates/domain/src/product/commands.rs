//! Product commands.
//!
//! Each command is built from caller-supplied fields by a constructor that
//! generates every row id and stamps the acting user, so the handler only
//! orders the writes.

use common::{ActorId, EntityId};
use inventory_store::{
    InsertProductParams, InsertProductPriceParams, InsertProductVariantParams,
    InsertStockLogParams, InsertStockParams, Owner, UpdateProductParams,
    UpdateProductPriceParams, UpdateProductVariantParams,
};

use crate::ledger::seed_ledger_entry;

/// Descriptive fields of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub category_id: EntityId,
    pub name: String,
    /// Only written on creation.
    pub product_code: String,
    pub product_sku: String,
    pub description: String,
    pub product_picture_url: Option<String>,
}

/// Price of one priced unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceFields {
    pub price: i64,
    pub discount_type: Option<String>,
    pub discount: Option<i64>,
    pub is_active: bool,
}

/// One variant with its price and stock quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFields {
    pub name: String,
    pub sku: String,
    pub is_active: bool,
    pub price: PriceFields,
    pub stock: i64,
}

fn insert_product(fields: ProductFields, is_variant: bool, actor: &ActorId) -> InsertProductParams {
    InsertProductParams {
        guid: EntityId::generate(),
        category_id: fields.category_id,
        name: fields.name,
        product_code: fields.product_code,
        product_sku: fields.product_sku,
        is_variant,
        description: fields.description,
        product_picture_url: fields.product_picture_url.filter(|url| !url.is_empty()),
        created_by: actor.as_entity_id().clone(),
    }
}

fn update_product(product_id: EntityId, fields: ProductFields, actor: &ActorId) -> UpdateProductParams {
    UpdateProductParams {
        guid: product_id,
        category_id: fields.category_id,
        name: fields.name,
        product_sku: fields.product_sku,
        description: fields.description,
        product_picture_url: fields.product_picture_url.filter(|url| !url.is_empty()),
        updated_by: actor.as_entity_id().clone(),
    }
}

fn insert_price(owner: Owner, fields: PriceFields, actor: &ActorId) -> InsertProductPriceParams {
    InsertProductPriceParams {
        guid: EntityId::generate(),
        owner,
        price: fields.price,
        discount_type: fields.discount_type,
        discount: fields.discount.filter(|d| *d > 0),
        is_active: fields.is_active,
        created_by: actor.as_entity_id().clone(),
    }
}

fn update_price(owner: Owner, fields: PriceFields, actor: &ActorId) -> UpdateProductPriceParams {
    UpdateProductPriceParams {
        owner,
        price: fields.price,
        discount_type: fields.discount_type,
        discount: fields.discount.filter(|d| *d > 0),
        is_active: fields.is_active,
        updated_by: actor.as_entity_id().clone(),
    }
}

fn insert_stock(owner: Owner, quantity: i64, actor: &ActorId) -> InsertStockParams {
    InsertStockParams {
        guid: EntityId::generate(),
        owner,
        stock: quantity,
        created_by: actor.as_entity_id().clone(),
    }
}

/// A requested stock quantity and the id its ledger entry will get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub requested: i64,
    pub ledger_id: EntityId,
}

impl StockChange {
    pub fn new(requested: i64) -> Self {
        Self {
            requested,
            ledger_id: EntityId::generate(),
        }
    }
}

/// Command to create a product without variants.
#[derive(Debug, Clone)]
pub struct CreateProductWithoutVariant {
    pub product: InsertProductParams,
    pub price: InsertProductPriceParams,
    pub ledger_seed: InsertStockLogParams,
    pub stock: InsertStockParams,
}

impl CreateProductWithoutVariant {
    pub fn new(fields: ProductFields, price: PriceFields, initial_stock: i64, actor: &ActorId) -> Self {
        let product = insert_product(fields, false, actor);
        let owner = Owner::product(product.guid.clone());

        Self {
            price: insert_price(owner.clone(), price, actor),
            ledger_seed: seed_ledger_entry(EntityId::generate(), owner.clone(), initial_stock, actor),
            stock: insert_stock(owner, initial_stock, actor),
            product,
        }
    }

    pub fn product_id(&self) -> &EntityId {
        &self.product.guid
    }
}

/// Rows to insert for one new variant.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub variant: InsertProductVariantParams,
    pub price: InsertProductPriceParams,
    pub ledger_seed: InsertStockLogParams,
    pub stock: InsertStockParams,
}

/// Command to create a product together with its variants.
#[derive(Debug, Clone)]
pub struct CreateProductWithVariant {
    pub product: InsertProductParams,
    /// Written in this order.
    pub variants: Vec<NewVariant>,
}

impl CreateProductWithVariant {
    pub fn new(fields: ProductFields, variants: Vec<VariantFields>, actor: &ActorId) -> Self {
        let product = insert_product(fields, true, actor);

        let variants = variants
            .into_iter()
            .map(|fields| {
                let variant = InsertProductVariantParams {
                    guid: EntityId::generate(),
                    product_id: product.guid.clone(),
                    name: fields.name,
                    sku: fields.sku,
                    is_active: fields.is_active,
                    created_by: actor.as_entity_id().clone(),
                };
                let owner = Owner::variant(product.guid.clone(), variant.guid.clone());

                NewVariant {
                    price: insert_price(owner.clone(), fields.price, actor),
                    ledger_seed: seed_ledger_entry(
                        EntityId::generate(),
                        owner.clone(),
                        fields.stock,
                        actor,
                    ),
                    stock: insert_stock(owner, fields.stock, actor),
                    variant,
                }
            })
            .collect();

        Self { product, variants }
    }

    pub fn product_id(&self) -> &EntityId {
        &self.product.guid
    }
}

/// Command to update a product without variants.
#[derive(Debug, Clone)]
pub struct UpdateProductWithoutVariant {
    pub product: UpdateProductParams,
    pub price: UpdateProductPriceParams,
    pub stock: StockChange,
    pub actor: ActorId,
}

impl UpdateProductWithoutVariant {
    pub fn new(
        product_id: EntityId,
        fields: ProductFields,
        price: PriceFields,
        stock: i64,
        actor: &ActorId,
    ) -> Self {
        let owner = Owner::product(product_id.clone());
        Self {
            price: update_price(owner, price, actor),
            product: update_product(product_id, fields, actor),
            stock: StockChange::new(stock),
            actor: actor.clone(),
        }
    }
}

/// Rows to update for one existing variant.
#[derive(Debug, Clone)]
pub struct VariantChange {
    pub variant: UpdateProductVariantParams,
    pub price: UpdateProductPriceParams,
    pub stock: StockChange,
}

impl VariantChange {
    pub fn owner(&self) -> Owner {
        Owner::variant(self.variant.product_id.clone(), self.variant.guid.clone())
    }
}

/// Command to update a product and its variants.
#[derive(Debug, Clone)]
pub struct UpdateProductWithVariant {
    pub product: UpdateProductParams,
    /// Applied in this order.
    pub variants: Vec<VariantChange>,
    pub actor: ActorId,
}

impl UpdateProductWithVariant {
    /// `variants` pairs each existing variant id with its new fields.
    pub fn new(
        product_id: EntityId,
        fields: ProductFields,
        variants: Vec<(EntityId, VariantFields)>,
        actor: &ActorId,
    ) -> Self {
        let variants = variants
            .into_iter()
            .map(|(variant_id, fields)| {
                let owner = Owner::variant(product_id.clone(), variant_id.clone());
                VariantChange {
                    variant: UpdateProductVariantParams {
                        guid: variant_id,
                        product_id: product_id.clone(),
                        name: fields.name,
                        sku: fields.sku,
                        is_active: fields.is_active,
                        updated_by: actor.as_entity_id().clone(),
                    },
                    price: update_price(owner, fields.price, actor),
                    stock: StockChange::new(fields.stock),
                }
            })
            .collect();

        Self {
            product: update_product(product_id, fields, actor),
            variants,
            actor: actor.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_store::StockType;

    fn fields() -> ProductFields {
        ProductFields {
            category_id: "C1".into(),
            name: "Shirt".to_string(),
            product_code: "SH".to_string(),
            product_sku: "SH-SKU".to_string(),
            description: String::new(),
            product_picture_url: None,
        }
    }

    fn variant(name: &str, stock: i64) -> VariantFields {
        VariantFields {
            name: name.to_string(),
            sku: format!("SH-{name}"),
            is_active: true,
            price: PriceFields {
                price: 1000,
                ..Default::default()
            },
            stock,
        }
    }

    #[test]
    fn test_flat_create_links_every_row_to_the_product() {
        let actor = ActorId::from("admin");
        let cmd = CreateProductWithoutVariant::new(
            fields(),
            PriceFields {
                price: 1000,
                is_active: true,
                ..Default::default()
            },
            50,
            &actor,
        );

        let owner = Owner::product(cmd.product.guid.clone());
        assert!(!cmd.product.is_variant);
        assert_eq!(cmd.price.owner, owner);
        assert_eq!(cmd.stock.owner, owner);
        assert_eq!(cmd.ledger_seed.owner, owner);
        assert_eq!(cmd.ledger_seed.stock_type, StockType::In);
        assert_eq!(cmd.ledger_seed.stock_log, 50);
        assert_eq!(cmd.stock.stock, 50);
        assert_eq!(cmd.product.created_by.as_str(), "admin");
    }

    #[test]
    fn test_variant_create_keeps_request_order_and_owners() {
        let actor = ActorId::from("admin");
        let cmd = CreateProductWithVariant::new(
            fields(),
            vec![variant("Small", 3), variant("Large", 9)],
            &actor,
        );

        assert!(cmd.product.is_variant);
        let names: Vec<_> = cmd.variants.iter().map(|v| v.variant.name.as_str()).collect();
        assert_eq!(names, vec!["Small", "Large"]);

        for line in &cmd.variants {
            let owner = Owner::variant(cmd.product.guid.clone(), line.variant.guid.clone());
            assert_eq!(line.variant.product_id, cmd.product.guid);
            assert_eq!(line.price.owner, owner);
            assert_eq!(line.stock.owner, owner);
            assert_eq!(line.ledger_seed.owner, owner);
        }
        assert_eq!(cmd.variants[1].stock.stock, 9);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let actor = ActorId::from("admin");
        let cmd = CreateProductWithVariant::new(fields(), vec![variant("A", 1), variant("B", 1)], &actor);

        let mut ids = vec![cmd.product.guid.clone()];
        for line in &cmd.variants {
            ids.extend([
                line.variant.guid.clone(),
                line.price.guid.clone(),
                line.stock.guid.clone(),
                line.ledger_seed.guid.clone(),
            ]);
        }
        let total = ids.len();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_zero_discount_and_empty_picture_are_dropped() {
        let actor = ActorId::from("admin");
        let mut product = fields();
        product.product_picture_url = Some(String::new());
        let cmd = CreateProductWithoutVariant::new(
            product,
            PriceFields {
                price: 1,
                discount: Some(0),
                ..Default::default()
            },
            0,
            &actor,
        );

        assert_eq!(cmd.product.product_picture_url, None);
        assert_eq!(cmd.price.discount, None);
    }

    #[test]
    fn test_variant_update_is_keyed_by_product_and_variant() {
        let actor = ActorId::from("editor");
        let cmd = UpdateProductWithVariant::new(
            "P1".into(),
            fields(),
            vec![("V1".into(), variant("Large", 4))],
            &actor,
        );

        let change = &cmd.variants[0];
        assert_eq!(change.owner(), Owner::variant("P1".into(), "V1".into()));
        assert_eq!(change.price.owner, change.owner());
        assert_eq!(change.stock.requested, 4);
        assert_eq!(cmd.product.updated_by.as_str(), "editor");
    }
}
