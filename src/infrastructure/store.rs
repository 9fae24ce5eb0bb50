use crate::domain::{AccountId, SubscriptionDocument, SubscriptionPatch};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Connectivity failures a caller may retry.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::DatabaseError(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StoreError::InvalidData(_) => false,
        }
    }
}

/// One delivery on a live feed: the document as committed (`None` when the
/// account has no document), or a feed failure.
pub type SnapshotEvent = Result<Option<SubscriptionDocument>, StoreError>;

/// Registration returned by [`SubscriptionStore::listen`].
///
/// The first event is the initial read. Later events follow the store's
/// commit order. Dropping `events` or calling `unlisten(id)` ends delivery.
#[derive(Debug)]
pub struct DocumentListener {
    pub id: Uuid,
    pub events: mpsc::UnboundedReceiver<SnapshotEvent>,
}

/// Document store holding one subscription document per account.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    #[must_use]
    async fn get(&self, account: &AccountId) -> Result<Option<SubscriptionDocument>, StoreError>;
    #[must_use]
    async fn listen(&self, account: &AccountId) -> Result<DocumentListener, StoreError>;
    /// Unregister a listener. Unknown or already released ids are ignored.
    async fn unlisten(&self, listener_id: Uuid);
    /// Merge `patch` into the account's document, creating it if absent.
    /// Returns once the store has acknowledged the write.
    #[must_use]
    async fn merge_write(
        &self,
        account: &AccountId,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError>;
    #[must_use]
    async fn ping(&self) -> Result<(), StoreError>;
}
