//! Bulk episode refresh.
//!
//! Refreshing a show from the catalog rewrites many episode rows at once.
//! The whole batch runs in one write transaction and produces a single
//! change notification, so subscribers recompute once per refresh instead
//! of once per row.

use diesel::prelude::*;
use log::*;
use url::Url;

use super::error::{Result, StoreError};
use super::Database;
use crate::address::AddressKind;
use crate::models::EpisodeUpdate;
use crate::schema::episodes;

/// Outcome of a committed batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// Records the caller handed in.
    pub submitted: usize,
    /// Records whose id matched an existing episode.
    pub matched: usize,
}

struct BatchError {
    failed_at: Option<usize>,
    source: diesel::result::Error,
}

impl From<diesel::result::Error> for BatchError {
    fn from(source: diesel::result::Error) -> Self {
        BatchError {
            failed_at: None,
            source,
        }
    }
}

fn apply(conn: &mut SqliteConnection, update: &EpisodeUpdate) -> QueryResult<usize> {
    let target = episodes::table.find(update.id);
    if update.changes.is_empty() {
        let found = target.count().get_result::<i64>(conn)?;
        return Ok(found as usize);
    }

    diesel::update(target).set(&update.changes).execute(conn)
}

impl Database {
    /// Apply `updates` to the episodes table as one atomic unit.
    ///
    /// Each record overwrites only the fields it carries on the episode with
    /// its `id`. If any record fails the whole batch is rolled back, nothing
    /// is published, and the failing record's position is reported.
    pub fn bulk_update(&self, uri: &Url, updates: &[EpisodeUpdate]) -> Result<BatchReport> {
        let address = self.router.resolve(uri)?;
        if address.kind() != AddressKind::EpisodeCollection {
            return Err(StoreError::InvalidAddress {
                address: uri.to_string(),
                reason: "bulk update needs the episodes table address",
            });
        }

        let submitted = updates.len();
        let conn = &mut self.pool().get()?;
        let outcome = conn.immediate_transaction(|conn| {
            let mut matched = 0;
            for (index, update) in updates.iter().enumerate() {
                matched += apply(conn, update).map_err(|source| BatchError {
                    failed_at: Some(index),
                    source,
                })?;
            }
            Ok::<usize, BatchError>(matched)
        });

        match outcome {
            Ok(matched) => {
                info!(
                    "bulk updated episodes: {} submitted, {} matched",
                    submitted, matched
                );
                self.changes().publish(address);
                Ok(BatchReport { submitted, matched })
            }
            Err(BatchError { failed_at, source }) => {
                warn!(
                    "rolled back batch of {} episode updates (failed at {:?}): {}",
                    submitted, failed_at, source
                );
                Err(StoreError::TransactionFailure {
                    submitted,
                    failed_at,
                    source,
                })
            }
        }
    }

    /// Convenience form of [`Database::bulk_update`] on the episodes table.
    pub fn sync_episodes(&self, updates: &[EpisodeUpdate]) -> Result<BatchReport> {
        self.bulk_update(&self.router.episodes(), updates)
    }
}
