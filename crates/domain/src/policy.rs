//! What an order does when an operation violates one of its preconditions.

use std::fmt::Debug;

use common::EntityId;

use crate::order::OrderError;

/// Decides whether a precondition violation aborts the operation.
///
/// Operations check every precondition before touching any state, so
/// either way the order is left exactly as it was.
pub trait ErrorPolicy: Debug + Send + Sync {
    /// Returns the error to abort, or `Ok(())` to continue with a neutral
    /// result.
    fn on_violation(&self, order_id: EntityId, error: OrderError) -> Result<(), OrderError>;
}

/// Every violation is returned to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl ErrorPolicy for StrictPolicy {
    fn on_violation(&self, _order_id: EntityId, error: OrderError) -> Result<(), OrderError> {
        Err(error)
    }
}

/// Violations are logged and counted, and the operation yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientPolicy;

impl ErrorPolicy for LenientPolicy {
    fn on_violation(&self, order_id: EntityId, error: OrderError) -> Result<(), OrderError> {
        tracing::warn!(
            %order_id,
            kind = ?error.kind(),
            error = %error,
            "order operation skipped"
        );
        metrics::counter!("order_violations_tolerated_total").increment(1);
        Ok(())
    }
}
