use crate::domain::{AccountId, SubscriptionDocument, SubscriptionPatch};
use crate::infrastructure::{DocumentListener, SnapshotEvent, StoreError, SubscriptionStore};
use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Channel the `subscriptions` trigger publishes account ids on.
pub const SUBSCRIPTION_CHANNEL: &str = "subscription_changes";

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct PostgresSubscriptionStore {
    pool: PgPool,
    listeners: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            listeners: Mutex::new(HashMap::new()),
        }
    }
}

async fn fetch_document(
    pool: &PgPool,
    account: &AccountId,
) -> Result<Option<SubscriptionDocument>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT plan, upgraded_at, user_id
        FROM subscriptions
        WHERE account_id = $1
        "#,
    )
    .bind(account.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_document).transpose()
}

fn row_to_document(row: &PgRow) -> Result<SubscriptionDocument, StoreError> {
    Ok(SubscriptionDocument {
        plan: row.try_get("plan")?,
        upgraded_at: row.try_get("upgraded_at")?,
        user_id: row.try_get("user_id")?,
    })
}

/// What the change feed does with one result from the notification listener.
#[derive(Debug, PartialEq, Eq)]
enum FeedStep {
    /// A change for this account: re-read the row.
    Reread,
    /// A change for some other account.
    Skip,
    /// The connection dropped. Notifications may have been lost, so listen
    /// again and re-read the row.
    Resync,
}

fn feed_step(received: Result<Option<&str>, &sqlx::Error>, account: &AccountId) -> FeedStep {
    match received {
        Ok(Some(payload)) if payload == account.as_str() => FeedStep::Reread,
        Ok(Some(_)) => FeedStep::Skip,
        Ok(None) | Err(_) => FeedStep::Resync,
    }
}

async fn connect_listener(pool: &PgPool) -> Result<PgListener, sqlx::Error> {
    let mut pg_listener = PgListener::connect_with(pool).await?;
    pg_listener.listen(SUBSCRIPTION_CHANNEL).await?;
    Ok(pg_listener)
}

/// Re-reads the row whenever the trigger reports a change for `account`, and
/// after every reconnect so commits made while disconnected are not missed.
async fn forward_changes(
    pool: PgPool,
    mut pg_listener: PgListener,
    account: AccountId,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
) {
    loop {
        let received = tokio::select! {
            _ = sender.closed() => break,
            received = pg_listener.try_recv() => received,
        };

        let step = feed_step(
            received
                .as_ref()
                .map(|n| n.as_ref().map(|n| n.payload())),
            &account,
        );
        let event = match step {
            FeedStep::Skip => continue,
            FeedStep::Reread => fetch_document(&pool, &account).await,
            FeedStep::Resync => {
                match &received {
                    Err(e) => warn!(account_id = %account, error = %e, "Subscription change feed interrupted"),
                    Ok(_) => warn!(account_id = %account, "Subscription change feed lost its connection"),
                }
                // LISTEN again before the re-read, as in `listen`
                match connect_listener(&pool).await {
                    Ok(fresh) => {
                        pg_listener = fresh;
                        debug!(account_id = %account, "Subscription change feed resynced");
                        fetch_document(&pool, &account).await
                    }
                    Err(e) => {
                        tokio::time::sleep(LISTENER_RETRY_DELAY).await;
                        Err(StoreError::Unavailable(e.to_string()))
                    }
                }
            }
        };
        if sender.send(event).is_err() {
            break;
        }
    }
    debug!(account_id = %account, "Change feed stopped");
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn get(&self, account: &AccountId) -> Result<Option<SubscriptionDocument>, StoreError> {
        fetch_document(&self.pool, account).await
    }

    async fn listen(&self, account: &AccountId) -> Result<DocumentListener, StoreError> {
        // LISTEN before the initial read so no commit falls between the two.
        let pg_listener = connect_listener(&self.pool).await?;

        let initial = fetch_document(&self.pool, account).await?;
        let (sender, events) = mpsc::unbounded_channel();
        let _ = sender.send(Ok(initial));

        let id = Uuid::new_v4();
        let task = tokio::spawn(forward_changes(
            self.pool.clone(),
            pg_listener,
            account.clone(),
            sender,
        ));

        let mut listeners = self.listeners.lock().await;
        listeners.retain(|_, handle| !handle.is_finished());
        listeners.insert(id, task);
        debug!(listener_id = %id, account_id = %account, "Listener registered");

        Ok(DocumentListener { id, events })
    }

    async fn unlisten(&self, listener_id: Uuid) {
        if let Some(task) = self.listeners.lock().await.remove(&listener_id) {
            task.abort();
            debug!(listener_id = %listener_id, "Listener released");
        }
    }

    async fn merge_write(
        &self,
        account: &AccountId,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (account_id, plan, upgraded_at, user_id, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (account_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                upgraded_at = COALESCE(EXCLUDED.upgraded_at, subscriptions.upgraded_at),
                user_id = COALESCE(EXCLUDED.user_id, subscriptions.user_id),
                updated_at = NOW()
            "#,
        )
        .bind(account.as_str())
        .bind(patch.plan.as_str())
        .bind(patch.upgraded_at)
        .bind(patch.user_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_rereads_only_for_its_own_account() {
        let account = AccountId::new("uid-1");
        assert_eq!(feed_step(Ok(Some("uid-1")), &account), FeedStep::Reread);
        assert_eq!(feed_step(Ok(Some("uid-2")), &account), FeedStep::Skip);
    }

    #[test]
    fn lost_connection_forces_resync() {
        let account = AccountId::new("uid-1");
        assert_eq!(feed_step(Ok(None), &account), FeedStep::Resync);
        assert_eq!(feed_step(Err(&sqlx::Error::PoolClosed), &account), FeedStep::Resync);
    }
}
