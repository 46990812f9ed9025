//! Shared helpers for Diesel repository implementations.
//!
//! Every repository maps pool and Diesel failures into its own port error
//! through the generic mappers below, passing the port error constructors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use pagination::PageWindow;
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query or connection errors.
///
/// Unique violations are reported as query errors here; repositories that
/// expose a duplicate variant check [`is_unique_violation`] first.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Whether the error is a unique constraint violation.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Convert a SQL `COUNT(*)` into an item count.
#[expect(clippy::cast_sign_loss, reason = "COUNT(*) is never negative")]
pub fn count_to_u64(count: i64) -> u64 {
    count.max(0) as u64
}

/// `OFFSET` and `LIMIT` values for a page window.
pub fn window_bounds(window: PageWindow) -> (i64, i64) {
    let offset = i64::try_from(window.offset()).unwrap_or(i64::MAX);
    let limit = i64::try_from(window.limit()).unwrap_or(i64::MAX);
    (offset, limit)
}

/// Convert a `usize` limit into a SQL `LIMIT`.
pub fn limit_to_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
