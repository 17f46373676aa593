//! Stock handlers: batch quantity updates and stock reads.

use common::{ActorId, EntityId};
use inventory_store::{InventoryRepository, InventoryStore, Stock, StockListing, StockLog, StockQuery};
use serde::Serialize;

use crate::error::{EngineError, StepExt};
use crate::ledger::{UPDATE_STOCK_NOTE, derive_ledger_entry, net_quantity, record_entries};
use crate::page::Page;
use crate::unit_of_work;

/// One item of a batch stock update: move a stock row, addressed by its own
/// id, to `quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStock {
    pub stock_id: EntityId,
    pub quantity: i64,
    pub ledger_id: EntityId,
}

impl UpdateStock {
    pub fn new(stock_id: EntityId, quantity: i64) -> Self {
        Self {
            stock_id,
            quantity,
            ledger_id: EntityId::generate(),
        }
    }
}

/// A stock row after an update together with the entry that recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMovement {
    pub stock: Stock,
    pub stock_log: StockLog,
}

/// The ledger of one stock row.
///
/// `net_quantity` is rebuilt from the entries and equals `stock.stock` when
/// every change went through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockHistory {
    pub stock: Stock,
    pub entries: Vec<StockLog>,
    pub net_quantity: i64,
}

/// Service for stock updates and reads.
pub struct StockService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> StockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies every item in one unit of work. A failing item rolls back
    /// the items before it.
    #[tracing::instrument(skip(self, items, actor), fields(items = items.len(), actor = %actor))]
    pub async fn update_stock_batch(
        &self,
        items: Vec<UpdateStock>,
        actor: ActorId,
    ) -> Result<Vec<StockMovement>, EngineError> {
        let movements = unit_of_work::run(&self.store, "update stock", |tx| {
            Box::pin(update_batch(tx, items, actor))
        })
        .await?;

        record_entries(movements.iter().map(|m| &m.stock_log));
        tracing::info!(moved = movements.len(), "stock updated");
        Ok(movements)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_stock(&self, stock_id: EntityId) -> Result<Stock, EngineError> {
        unit_of_work::read(&self.store, "get stock", |tx| {
            Box::pin(async move { tx.get_stock(&stock_id).await.step("get stock") })
        })
        .await
    }

    /// Lists live stock rows joined with their product and variant names.
    #[tracing::instrument(skip(self))]
    pub async fn list_stocks(&self, query: StockQuery) -> Result<Page<StockListing>, EngineError> {
        unit_of_work::read(&self.store, "list stocks", |tx| {
            Box::pin(async move {
                let items = tx.list_stocks(&query).await.step("list stocks")?;
                let total = tx.count_stocks(&query).await.step("count stocks")?;
                Ok(Page::new(items, total, query.page, query.limit))
            })
        })
        .await
    }

    /// Loads a stock row with its ledger, oldest entry first.
    #[tracing::instrument(skip(self))]
    pub async fn stock_history(&self, stock_id: EntityId) -> Result<StockHistory, EngineError> {
        unit_of_work::read(&self.store, "stock history", |tx| {
            Box::pin(async move {
                let stock = tx.get_stock(&stock_id).await.step("get stock")?;
                let entries = tx
                    .list_stock_logs(&stock.owner)
                    .await
                    .step("list stock logs")?;
                let net_quantity = net_quantity(&entries);
                Ok(StockHistory {
                    stock,
                    entries,
                    net_quantity,
                })
            })
        })
        .await
    }
}

async fn update_batch<U>(
    tx: &mut U,
    items: Vec<UpdateStock>,
    actor: ActorId,
) -> Result<Vec<StockMovement>, EngineError>
where
    U: InventoryRepository,
{
    let mut movements = Vec::with_capacity(items.len());
    for item in items {
        let existing = tx.get_stock(&item.stock_id).await.step("get stock")?;
        let (update, entry) = derive_ledger_entry(
            &existing,
            item.quantity,
            item.ledger_id,
            &actor,
            UPDATE_STOCK_NOTE,
        );
        let stock = tx.update_stock(update).await.step("update stock")?;
        let stock_log = tx.insert_stock_log(entry).await.step("insert stock log")?;
        movements.push(StockMovement { stock, stock_log });
    }
    Ok(movements)
}
