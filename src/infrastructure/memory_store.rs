use crate::domain::{AccountId, SubscriptionDocument, SubscriptionPatch};
use crate::infrastructure::{DocumentListener, SnapshotEvent, StoreError, SubscriptionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Process-local store. Used by the standalone server when no database is
/// configured, and by tests.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<AccountId, SubscriptionDocument>,
    listeners: HashMap<Uuid, Registration>,
}

struct Registration {
    account: AccountId,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document verbatim, bypassing merge semantics. Listeners are
    /// notified as for any other commit.
    pub async fn put_document(&self, account: &AccountId, doc: SubscriptionDocument) {
        let mut inner = self.inner.write().await;
        inner.documents.insert(account.clone(), doc);
        inner.notify(account);
    }

    pub async fn listener_count(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.listeners.retain(|_, reg| !reg.sender.is_closed());
        inner.listeners.len()
    }
}

impl Inner {
    // Runs under the write lock, so deliveries follow commit order.
    fn notify(&mut self, account: &AccountId) {
        let doc = self.documents.get(account).cloned();
        self.listeners.retain(|id, reg| {
            if &reg.account != account {
                return true;
            }
            let delivered = reg.sender.send(Ok(doc.clone())).is_ok();
            if !delivered {
                debug!(listener_id = %id, account_id = %account, "Pruning closed listener");
            }
            delivered
        });
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, account: &AccountId) -> Result<Option<SubscriptionDocument>, StoreError> {
        Ok(self.inner.read().await.documents.get(account).cloned())
    }

    async fn listen(&self, account: &AccountId) -> Result<DocumentListener, StoreError> {
        let mut inner = self.inner.write().await;
        let (sender, events) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let initial = inner.documents.get(account).cloned();
        // receiver is still held here
        let _ = sender.send(Ok(initial));

        inner.listeners.insert(
            id,
            Registration {
                account: account.clone(),
                sender,
            },
        );
        debug!(listener_id = %id, account_id = %account, "Listener registered");

        Ok(DocumentListener { id, events })
    }

    async fn unlisten(&self, listener_id: Uuid) {
        if self.inner.write().await.listeners.remove(&listener_id).is_some() {
            debug!(listener_id = %listener_id, "Listener released");
        }
    }

    async fn merge_write(
        &self,
        account: &AccountId,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .documents
            .entry(account.clone())
            .and_modify(|doc| doc.apply(&patch))
            .or_insert_with(|| SubscriptionDocument::from(&patch));
        inner.notify(account);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
