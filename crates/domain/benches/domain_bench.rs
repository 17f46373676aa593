use common::ActorId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateProductWithVariant, CreateProductWithoutVariant, LedgerMovement, PriceFields,
    ProductFields, ProductService, StockService, UpdateProductWithoutVariant, UpdateStock,
    VariantFields,
};
use inventory_store::{EntityId, InMemoryInventoryStore};

fn fields(category_id: &EntityId, name: &str) -> ProductFields {
    ProductFields {
        category_id: category_id.clone(),
        name: name.to_string(),
        product_code: "BENCH".to_string(),
        product_sku: "BENCH-SKU".to_string(),
        description: String::new(),
        product_picture_url: None,
    }
}

fn price() -> PriceFields {
    PriceFields {
        price: 1000,
        is_active: true,
        ..Default::default()
    }
}

fn bench_ledger_policy(c: &mut Criterion) {
    c.bench_function("domain/ledger_movement", |b| {
        b.iter(|| {
            for requested in 0..100 {
                std::hint::black_box(LedgerMovement::between(50, requested));
            }
        });
    });
}

fn bench_create_flat(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let actor = ActorId::from("bench");
    let store = InMemoryInventoryStore::new();
    let category = rt.block_on(store.add_category("Bench", actor.as_entity_id().clone()));
    let service = ProductService::new(store);

    c.bench_function("domain/create_product_without_variant", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateProductWithoutVariant::new(
                    fields(&category.guid, "Widget"),
                    price(),
                    50,
                    &actor,
                );
                service.create_product_without_variant(cmd).await.unwrap();
            });
        });
    });
}

fn bench_create_with_variants(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let actor = ActorId::from("bench");

    c.bench_function("domain/create_product_with_5_variants", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryInventoryStore::new();
                let category = store.add_category("Bench", actor.as_entity_id().clone()).await;
                let service = ProductService::new(store);
                let variants = (0..5)
                    .map(|i| VariantFields {
                        name: format!("V{i}"),
                        sku: format!("SKU-{i}"),
                        is_active: true,
                        price: price(),
                        stock: i,
                    })
                    .collect();
                let cmd = CreateProductWithVariant::new(fields(&category.guid, "Shirt"), variants, &actor);
                service.create_product_with_variant(cmd).await.unwrap();
            });
        });
    });
}

fn bench_update_flat(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let actor = ActorId::from("bench");
    let store = InMemoryInventoryStore::new();
    let category = rt.block_on(store.add_category("Bench", actor.as_entity_id().clone()));
    let service = ProductService::new(store);
    let cmd = CreateProductWithoutVariant::new(fields(&category.guid, "Widget"), price(), 50, &actor);
    let product_id = cmd.product_id().clone();
    rt.block_on(async { service.create_product_without_variant(cmd).await.unwrap() });

    let mut quantity = 0;
    c.bench_function("domain/update_product_without_variant", |b| {
        b.iter(|| {
            quantity = (quantity + 7) % 100;
            rt.block_on(async {
                let cmd = UpdateProductWithoutVariant::new(
                    product_id.clone(),
                    fields(&category.guid, "Widget"),
                    price(),
                    quantity,
                    &actor,
                );
                service.update_product_without_variant(cmd).await.unwrap();
            });
        });
    });
}

fn bench_stock_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let actor = ActorId::from("bench");
    let store = InMemoryInventoryStore::new();
    let category = rt.block_on(store.add_category("Bench", actor.as_entity_id().clone()));
    let products = ProductService::new(store.clone());
    let stocks = StockService::new(store.clone());

    rt.block_on(async {
        for i in 0..10 {
            let cmd = CreateProductWithoutVariant::new(
                fields(&category.guid, &format!("Item {i}")),
                price(),
                i,
                &actor,
            );
            products.create_product_without_variant(cmd).await.unwrap();
        }
    });
    let stock_ids: Vec<EntityId> = rt.block_on(store.stocks()).into_iter().map(|s| s.guid).collect();

    c.bench_function("domain/update_stock_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = stock_ids
                    .iter()
                    .map(|id| UpdateStock::new(id.clone(), 42))
                    .collect();
                stocks.update_stock_batch(items, actor.clone()).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_ledger_policy,
    bench_create_flat,
    bench_create_with_variants,
    bench_update_flat,
    bench_stock_batch,
);
criterion_main!(benches);
