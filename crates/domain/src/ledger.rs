//! Stock ledger policy.
//!
//! A stock change never supplies its own direction: it is derived from the
//! quantity already stored and the quantity requested. The functions here
//! are pure and build the write parameters for the stock row and its single
//! ledger entry.

use common::{ActorId, EntityId};
use inventory_store::{InsertStockLogParams, Owner, Stock, StockLog, StockType, UpdateStockParams};
use serde::{Deserialize, Serialize};

/// Note stamped on the entry written when a stock row is created.
pub const CREATE_STOCK_NOTE: &str = "Create stock";

/// Note stamped on entries derived from a stock change.
pub const UPDATE_STOCK_NOTE: &str = "Update stock";

/// Direction and magnitude of one stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMovement {
    pub stock_type: StockType,
    pub magnitude: i64,
}

impl LedgerMovement {
    /// Classifies the change from `existing` to `requested`.
    ///
    /// A decrease is `OUT`. Anything else is `IN`, including no change at all,
    /// which yields `IN` with magnitude zero.
    ///
    /// For quantities in `0..=i64::MAX` the magnitude is exact and
    /// `existing + signed() == requested`. Only a span wider than `i64::MAX`,
    /// which needs a negative quantity, saturates.
    pub fn between(existing: i64, requested: i64) -> Self {
        let magnitude = i64::try_from(existing.abs_diff(requested)).unwrap_or(i64::MAX);
        let stock_type = if existing > requested {
            StockType::Out
        } else {
            StockType::In
        };
        Self {
            stock_type,
            magnitude,
        }
    }

    /// The movement as a signed quantity: positive for `IN`.
    pub fn signed(&self) -> i64 {
        match self.stock_type {
            StockType::In => self.magnitude,
            StockType::Out => -self.magnitude,
        }
    }
}

/// Builds the stock overwrite and ledger entry that move `existing` to
/// `requested`.
///
/// Callers pass non-negative quantities; stored quantities are never
/// negative. Under that precondition the entry reconciles exactly with the
/// overwrite.
pub fn derive_ledger_entry(
    existing: &Stock,
    requested: i64,
    entry_id: EntityId,
    actor: &ActorId,
    note: &str,
) -> (UpdateStockParams, InsertStockLogParams) {
    let movement = LedgerMovement::between(existing.stock, requested);

    let stock = UpdateStockParams {
        guid: existing.guid.clone(),
        stock: requested,
        updated_by: actor.as_entity_id().clone(),
    };
    let entry = InsertStockLogParams {
        guid: entry_id,
        owner: existing.owner.clone(),
        stock_log: movement.magnitude,
        stock_type: movement.stock_type,
        note: Some(note.to_string()),
        created_by: actor.as_entity_id().clone(),
    };

    (stock, entry)
}

/// The first ledger entry of a new stock row: a plain `IN` of the initial
/// quantity.
pub fn seed_ledger_entry(
    entry_id: EntityId,
    owner: Owner,
    quantity: i64,
    actor: &ActorId,
) -> InsertStockLogParams {
    InsertStockLogParams {
        guid: entry_id,
        owner,
        stock_log: quantity,
        stock_type: StockType::In,
        note: Some(CREATE_STOCK_NOTE.to_string()),
        created_by: actor.as_entity_id().clone(),
    }
}

/// Reconstructs a quantity by summing signed ledger entries.
pub fn net_quantity(entries: &[StockLog]) -> i64 {
    entries
        .iter()
        .fold(0i64, |total, entry| total.saturating_add(entry.signed_quantity()))
}

/// Counts committed ledger entries by direction.
pub(crate) fn record_entries<'a>(entries: impl IntoIterator<Item = &'a StockLog>) {
    for entry in entries {
        metrics::counter!("stock_ledger_entries_total", "direction" => entry.stock_type.as_str())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_store::Audit;

    fn stock(quantity: i64) -> Stock {
        Stock {
            guid: "S1".into(),
            owner: Owner::product("P1".into()),
            stock: quantity,
            audit: Audit::created("admin".into()),
        }
    }

    #[test]
    fn test_increase_is_in() {
        let movement = LedgerMovement::between(50, 80);
        assert_eq!(movement.stock_type, StockType::In);
        assert_eq!(movement.magnitude, 30);
        assert_eq!(movement.signed(), 30);
    }

    #[test]
    fn test_decrease_is_out() {
        let movement = LedgerMovement::between(80, 20);
        assert_eq!(movement.stock_type, StockType::Out);
        assert_eq!(movement.magnitude, 60);
        assert_eq!(movement.signed(), -60);
    }

    #[test]
    fn test_no_change_is_in_with_zero_magnitude() {
        let movement = LedgerMovement::between(42, 42);
        assert_eq!(movement.stock_type, StockType::In);
        assert_eq!(movement.magnitude, 0);
    }

    #[test]
    fn test_direction_and_magnitude_hold_over_a_grid() {
        for existing in -5..=5 {
            for requested in -5..=5 {
                let movement = LedgerMovement::between(existing, requested);
                assert_eq!(movement.magnitude, (requested - existing).abs());
                assert_eq!(movement.stock_type == StockType::Out, existing > requested);
                assert_eq!(existing + movement.signed(), requested);
            }
        }
    }

    #[test]
    fn test_extreme_quantities_saturate() {
        let movement = LedgerMovement::between(i64::MIN, i64::MAX);
        assert_eq!(movement.magnitude, i64::MAX);
    }

    #[test]
    fn test_non_negative_quantities_reconcile_exactly() {
        let bounds = [0, 1, i64::MAX / 2, i64::MAX - 1, i64::MAX];
        for existing in bounds {
            for requested in bounds {
                let movement = LedgerMovement::between(existing, requested);
                assert_eq!(existing + movement.signed(), requested);
                assert!(movement.magnitude >= 0);
            }
        }

        let actor = ActorId::from("editor");
        let (update, entry) =
            derive_ledger_entry(&stock(i64::MAX), 0, "L1".into(), &actor, UPDATE_STOCK_NOTE);
        let logged = StockLog {
            guid: entry.guid,
            owner: entry.owner,
            stock_log: entry.stock_log,
            stock_type: entry.stock_type,
            note: entry.note,
            audit: Audit::created(actor.as_entity_id().clone()),
        };
        assert_eq!(logged.stock_type, StockType::Out);
        assert_eq!(i64::MAX + logged.signed_quantity(), update.stock);
    }

    #[test]
    fn test_derived_entry_targets_existing_row_and_owner() {
        let actor = ActorId::from("editor");
        let (update, entry) =
            derive_ledger_entry(&stock(80), 20, "L1".into(), &actor, UPDATE_STOCK_NOTE);

        assert_eq!(update.guid.as_str(), "S1");
        assert_eq!(update.stock, 20);
        assert_eq!(update.updated_by.as_str(), "editor");
        assert_eq!(entry.guid.as_str(), "L1");
        assert_eq!(entry.owner, Owner::product("P1".into()));
        assert_eq!(entry.stock_type, StockType::Out);
        assert_eq!(entry.stock_log, 60);
        assert_eq!(entry.note.as_deref(), Some("Update stock"));
    }

    #[test]
    fn test_seed_is_plain_in() {
        let owner = Owner::variant("P1".into(), "V1".into());
        let entry = seed_ledger_entry("L1".into(), owner.clone(), 50, &ActorId::from("admin"));
        assert_eq!(entry.owner, owner);
        assert_eq!(entry.stock_type, StockType::In);
        assert_eq!(entry.stock_log, 50);
        assert_eq!(entry.note.as_deref(), Some(CREATE_STOCK_NOTE));
    }

    #[test]
    fn test_net_quantity_sums_signed_entries() {
        let actor = ActorId::from("admin");
        let owner = Owner::product("P1".into());
        let entries: Vec<StockLog> = [(StockType::In, 50), (StockType::In, 30), (StockType::Out, 60)]
            .into_iter()
            .enumerate()
            .map(|(i, (stock_type, qty))| StockLog {
                guid: EntityId::new(format!("L{i}")),
                owner: owner.clone(),
                stock_log: qty,
                stock_type,
                note: None,
                audit: Audit::created(actor.as_entity_id().clone()),
            })
            .collect();

        assert_eq!(net_quantity(&entries), 20);
        assert_eq!(net_quantity(&[]), 0);
    }
}
