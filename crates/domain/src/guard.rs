//! Variant duplicate guard.

use common::EntityId;
use inventory_store::InventoryRepository;

use crate::error::{EngineError, StepExt};

/// Fails with [`EngineError::DuplicateVariant`] when `product_id` already has
/// a live variant named exactly `name`.
///
/// The lookup does not exclude any variant, so an update that keeps a
/// variant's current name is reported as a duplicate of itself.
pub async fn ensure_variant_name_available<R>(
    repo: &mut R,
    product_id: &EntityId,
    name: &str,
) -> Result<(), EngineError>
where
    R: InventoryRepository + ?Sized,
{
    let existing = repo
        .get_product_variant_by_name(product_id, name)
        .await
        .step("check duplicate product variant")?;

    match existing {
        Some(variant) => {
            tracing::warn!(
                product_id = %product_id,
                variant_id = %variant.guid,
                name,
                "duplicate product variant"
            );
            Err(EngineError::DuplicateVariant {
                product_id: product_id.clone(),
                name: name.to_string(),
            })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use inventory_store::{
        InMemoryInventoryStore, InsertProductVariantParams, InventoryStore,
    };

    #[tokio::test]
    async fn test_free_name_passes() {
        let store = InMemoryInventoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let result = ensure_variant_name_available(&mut uow, &"P1".into(), "Red").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_taken_name_is_a_conflict() {
        let store = InMemoryInventoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_product_variant(InsertProductVariantParams {
            guid: "V1".into(),
            product_id: "P1".into(),
            name: "Red".to_string(),
            sku: "R".to_string(),
            is_active: true,
            created_by: "admin".into(),
        })
        .await
        .unwrap();

        let err = ensure_variant_name_available(&mut uow, &"P1".into(), "Red")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Same name under another product is fine.
        let other = ensure_variant_name_available(&mut uow, &"P2".into(), "Red").await;
        assert!(other.is_ok());
    }
}
