use thiserror::Error;

/// Errors that can occur when interacting with the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row looked up by its key does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A price, stock or ledger row carries an owner pair that is neither
    /// product-only nor product+variant.
    #[error("invalid owner columns: product_id={product_id:?}, product_variant_id={variant_id:?}")]
    InvalidOwner {
        product_id: Option<String>,
        variant_id: Option<String>,
    },

    /// The stored stock type is not `IN` or `OUT`.
    #[error("unknown stock type: {0}")]
    UnknownStockType(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A failure injected by the in-memory store's fault plan.
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns true if the error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
