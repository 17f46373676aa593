//! Engine error types.

use common::EntityId;
use inventory_store::StoreError;
use thiserror::Error;

/// The class of an engine failure, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced row does not exist.
    NotFound,
    /// The request conflicts with existing state.
    Conflict,
    /// Storage or transaction failure.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

/// Errors returned by the command handlers.
///
/// Store failures keep their cause as `source` so it can be logged; callers
/// should branch on [`EngineError::kind`] only.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced product, category, variant or stock row is missing.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A variant with the same name already exists under the product.
    #[error("duplicate product variant '{name}' for product {product_id}")]
    DuplicateVariant { product_id: EntityId, name: String },

    /// The command's write shape does not match the product's variant flag.
    #[error("product {product_id} has is_variant={is_variant}, which does not match the command")]
    ShapeMismatch {
        product_id: EntityId,
        is_variant: bool,
    },

    /// A repository call failed.
    #[error("{operation} failed")]
    Infrastructure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Rolling back after a failed step failed as well.
    #[error("rollback of {operation} failed after: {original}")]
    RollbackFailed {
        operation: &'static str,
        original: Box<EngineError>,
        #[source]
        source: StoreError,
    },

    /// Every step succeeded but the transaction did not commit.
    #[error("commit of {operation} failed")]
    CommitFailed {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::DuplicateVariant { .. } | EngineError::ShapeMismatch { .. } => {
                ErrorKind::Conflict
            }
            EngineError::Infrastructure { .. }
            | EngineError::RollbackFailed { .. }
            | EngineError::CommitFailed { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Classifies a store failure raised while performing `operation`.
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => EngineError::NotFound { entity, key },
            source => EngineError::Infrastructure { operation, source },
        }
    }
}

/// Attaches the attempted operation to a store result.
pub(crate) trait StepExt<T> {
    fn step(self, operation: &'static str) -> Result<T, EngineError>;
}

impl<T> StepExt<T> for Result<T, StoreError> {
    fn step(self, operation: &'static str) -> Result<T, EngineError> {
        self.map_err(|err| {
            tracing::error!(operation, error = %err, "inventory step failed");
            EngineError::from_store(operation, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_keeps_its_kind() {
        let err = EngineError::from_store(
            "get product category",
            StoreError::not_found("product category", "C1"),
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "product category not found: C1");
    }

    #[test]
    fn test_other_store_failures_are_infrastructure() {
        let err = EngineError::from_store("insert stock", StoreError::Injected("write 3".into()));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_rollback_failure_is_infrastructure_even_for_conflicts() {
        let err = EngineError::RollbackFailed {
            operation: "create product with variant",
            original: Box::new(EngineError::DuplicateVariant {
                product_id: "P1".into(),
                name: "Large".into(),
            }),
            source: StoreError::Injected("rollback".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.to_string().contains("Large"));
    }
}
