use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod balances;
mod budgets;
mod expenses;
mod goals;
mod wallets;

pub use expenses::ExpenseOutcome;
pub use goals::GoalFunded;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Evaluate a transactional call, running it a second time if the first
/// attempt lost a compare-and-set race. A second `Conflict` is returned.
macro_rules! retry_on_conflict {
    ($op:literal, $call:expr) => {{
        match $call {
            Err(crate::EngineError::Conflict(reason)) => {
                tracing::debug!(operation = $op, %reason, "conflict, retrying once");
                $call
            }
            other => other,
        }
    }};
}

pub(crate) use retry_on_conflict;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::retry_on_conflict;
    use crate::{EngineError, ResultEngine};

    /// Fails with `Conflict` on the first `conflicts` calls, then succeeds.
    async fn attempt(calls: &AtomicUsize, conflicts: usize) -> ResultEngine<usize> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= conflicts {
            return Err(EngineError::Conflict(format!("attempt {call}")));
        }
        Ok(call)
    }

    async fn invalid(calls: &AtomicUsize) -> ResultEngine<usize> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::Validation("bad".to_string()))
    }

    #[tokio::test]
    async fn conflict_is_retried_exactly_once() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict!("test", attempt(&calls, 1).await);
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_conflict_is_surfaced() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict!("test", attempt(&calls, 2).await);
        assert_eq!(result, Err(EngineError::Conflict("attempt 2".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict!("test", invalid(&calls).await);
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
