//! Persistence seam for the ledger tables.

use std::sync::Arc;

use async_trait::async_trait;
use gymledger_shared::types::RecordId;

use super::error::StoreError;
use super::rows::{NewSourceRow, SourcePatch, SourceQuery, SourceRow};
use super::types::LedgerSource;

/// Access to the three finance tables.
///
/// Implementations report failures per call; the aggregator decides which
/// failures are tolerated.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads the rows of one table matching `query`, newest business date first.
    async fn list(
        &self,
        source: LedgerSource,
        query: &SourceQuery,
    ) -> Result<Vec<SourceRow>, StoreError>;

    /// Inserts a row into the table it is addressed to and returns the stored row.
    async fn insert(&self, row: NewSourceRow) -> Result<SourceRow, StoreError>;

    /// Applies `patch` to the row `id` of the patch's table. Returns the
    /// number of rows changed.
    async fn update(&self, id: RecordId, patch: SourcePatch) -> Result<u64, StoreError>;

    /// Deletes the row `id` from `source`. Returns the number of rows removed.
    async fn delete(&self, source: LedgerSource, id: RecordId) -> Result<u64, StoreError>;
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn list(
        &self,
        source: LedgerSource,
        query: &SourceQuery,
    ) -> Result<Vec<SourceRow>, StoreError> {
        (**self).list(source, query).await
    }

    async fn insert(&self, row: NewSourceRow) -> Result<SourceRow, StoreError> {
        (**self).insert(row).await
    }

    async fn update(&self, id: RecordId, patch: SourcePatch) -> Result<u64, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, source: LedgerSource, id: RecordId) -> Result<u64, StoreError> {
        (**self).delete(source, id).await
    }
}
