//! Transaction scope for one command or query.

use std::time::Instant;

use futures_util::future::BoxFuture;
use inventory_store::{InventoryStore, UnitOfWork};

use crate::error::{EngineError, StepExt};

/// Runs `f` inside one unit of work.
///
/// The unit of work is committed when `f` succeeds and rolled back when it
/// fails. A failed rollback is reported as [`EngineError::RollbackFailed`]
/// wrapping the step error; a failed commit as [`EngineError::CommitFailed`].
/// Either way nothing `f` wrote is visible afterwards.
pub async fn run<S, R, F>(store: &S, operation: &'static str, f: F) -> Result<R, EngineError>
where
    S: InventoryStore,
    F: for<'t> FnOnce(&'t mut S::UnitOfWork) -> BoxFuture<'t, Result<R, EngineError>>,
{
    let started = Instant::now();
    metrics::counter!("inventory_commands_total", "operation" => operation).increment(1);

    let result = execute(store, operation, f).await;

    metrics::histogram!("inventory_command_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
    if let Err(ref err) = result {
        metrics::counter!(
            "inventory_commands_failed",
            "operation" => operation,
            "kind" => err.kind().as_str()
        )
        .increment(1);
    }

    result
}

/// Runs the read-only `f` inside one unit of work.
///
/// The unit of work is dropped without committing, so anything `f` wrote is
/// discarded. Queries are counted apart from commands and never touch the
/// commit or rollback paths.
pub async fn read<S, R, F>(store: &S, operation: &'static str, f: F) -> Result<R, EngineError>
where
    S: InventoryStore,
    F: for<'t> FnOnce(&'t mut S::UnitOfWork) -> BoxFuture<'t, Result<R, EngineError>>,
{
    let started = Instant::now();
    metrics::counter!("inventory_queries_total", "operation" => operation).increment(1);

    let result = match store.begin().await.step("begin transaction") {
        Ok(mut tx) => f(&mut tx).await,
        Err(err) => Err(err),
    };

    metrics::histogram!("inventory_query_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
    if let Err(ref err) = result {
        tracing::debug!(operation, error = %err, "query failed");
    }

    result
}

async fn execute<S, R, F>(store: &S, operation: &'static str, f: F) -> Result<R, EngineError>
where
    S: InventoryStore,
    F: for<'t> FnOnce(&'t mut S::UnitOfWork) -> BoxFuture<'t, Result<R, EngineError>>,
{
    let mut tx = store.begin().await.step("begin transaction")?;

    let outcome = f(&mut tx).await;
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|source| {
                tracing::error!(operation, error = %source, "commit failed");
                EngineError::CommitFailed { operation, source }
            })?;
            tracing::debug!(operation, "committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(source) = tx.rollback().await {
                tracing::error!(operation, error = %source, "rollback failed");
                return Err(EngineError::RollbackFailed {
                    operation,
                    original: Box::new(err),
                    source,
                });
            }
            tracing::debug!(operation, error = %err, "rolled back");
            Err(err)
        }
    }
}
