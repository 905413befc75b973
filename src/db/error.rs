//! Errors raised by the store.
//!
//! Constraint violations on insert and empty matches are not errors: insert
//! reports them as `Ok(None)` and the other operations as an empty snapshot
//! or a zero count.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The address does not match any known table/row shape, or does not fit
    /// the operation. Always a bug in the caller.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// A bulk sync batch failed and was rolled back as a whole. `failed_at`
    /// is the offending record, or `None` when begin/commit itself failed.
    #[error("batch of {submitted} episode updates rolled back: {source}")]
    TransactionFailure {
        submitted: usize,
        failed_at: Option<usize>,
        #[source]
        source: diesel::result::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_address_names_the_address() {
        let err = StoreError::InvalidAddress {
            address: "content://x/seasons".to_string(),
            reason: "unknown table",
        };
        assert_eq!(
            err.to_string(),
            "invalid address 'content://x/seasons': unknown table"
        );
    }

    #[test]
    fn transaction_failure_keeps_its_source() {
        use std::error::Error as _;

        let err = StoreError::TransactionFailure {
            submitted: 5,
            failed_at: Some(2),
            source: diesel::result::Error::RollbackTransaction,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("batch of 5 episode updates rolled back"));
    }
}
