//! Live view of an account's plan.
//!
//! [`PlanWatcher`] hands out [`PlanSubscription`] handles. The caller that
//! subscribes owns the handle and is responsible for releasing it. Releasing
//! resolves the state to free; observers cloned from the handle see that one
//! last update and nothing after it. [`PlanSession`] keeps at most one live
//! handle for the current identity and swaps it on account changes.

use crate::application::upgrade::{PlanUpgradeService, UpgradeError};
use crate::domain::{
    check_access, effective_plan, limits_for, AccessDecision, AccountId, FeatureKey,
    FeatureLimits, LimitValue, Plan,
};
use crate::infrastructure::{IdentityProvider, SnapshotEvent, StoreError, SubscriptionStore};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Resolved plan as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanState {
    pub plan: Plan,
    /// False until the first snapshot (or feed failure) has been handled.
    pub loaded: bool,
}

impl PlanState {
    const PENDING: PlanState = PlanState {
        plan: Plan::Free,
        loaded: false,
    };
    const FREE: PlanState = PlanState {
        plan: Plan::Free,
        loaded: true,
    };
}

pub struct PlanWatcher<S>
where
    S: SubscriptionStore + ?Sized,
{
    store: Arc<S>,
}

impl<S> PlanWatcher<S>
where
    S: SubscriptionStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Establish a live subscription for `account`. Anonymous callers get a
    /// handle already resolved to free, with nothing registered in the store.
    pub async fn subscribe(
        &self,
        account: Option<&AccountId>,
    ) -> Result<PlanSubscription<S>, StoreError> {
        let Some(account) = account else {
            return Ok(PlanSubscription::anonymous());
        };

        let listener = self.store.listen(account).await?;
        let (sender, state) = watch::channel(PlanState::PENDING);
        let publisher = Arc::new(sender);
        let task = tokio::spawn(forward_snapshots(
            account.clone(),
            listener.events,
            publisher.clone(),
        ));
        debug!(account_id = %account, listener_id = %listener.id, "Plan subscription established");

        Ok(PlanSubscription {
            account: Some(account.clone()),
            store: Some(self.store.clone()),
            listener_id: Some(listener.id),
            state,
            publisher: Some(publisher),
            task: Some(task),
            released: false,
        })
    }
}

async fn forward_snapshots(
    account: AccountId,
    mut events: mpsc::UnboundedReceiver<SnapshotEvent>,
    sender: Arc<watch::Sender<PlanState>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            Ok(doc) => {
                let plan = effective_plan(doc.as_ref());
                debug!(account_id = %account, plan = %plan, "Plan snapshot");
                sender.send_replace(PlanState { plan, loaded: true });
            }
            Err(e) => {
                // keep the last known plan; free if nothing arrived yet
                warn!(account_id = %account, error = %e, "Plan feed failed, keeping last known plan");
                sender.send_if_modified(|state| !std::mem::replace(&mut state.loaded, true));
            }
        }
    }

    debug!(account_id = %account, "Plan feed ended");
    sender.send_replace(PlanState::FREE);
}

/// Owned handle to a live plan subscription.
pub struct PlanSubscription<S>
where
    S: SubscriptionStore + ?Sized,
{
    account: Option<AccountId>,
    store: Option<Arc<S>>,
    listener_id: Option<Uuid>,
    state: watch::Receiver<PlanState>,
    publisher: Option<Arc<watch::Sender<PlanState>>>,
    task: Option<JoinHandle<()>>,
    released: bool,
}

impl<S> PlanSubscription<S>
where
    S: SubscriptionStore + ?Sized,
{
    fn anonymous() -> Self {
        let (_, state) = watch::channel(PlanState::FREE);
        Self {
            account: None,
            store: None,
            listener_id: None,
            state,
            publisher: None,
            task: None,
            released: false,
        }
    }

    pub fn account(&self) -> Option<&AccountId> {
        self.account.as_ref()
    }

    pub fn state(&self) -> PlanState {
        if self.released {
            return PlanState::FREE;
        }
        *self.state.borrow()
    }

    pub fn current(&self) -> Plan {
        self.state().plan
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    pub fn limits(&self) -> &'static FeatureLimits {
        limits_for(self.current())
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// New observer of this subscription. On release it sees one final
    /// `free` state, then the channel closes.
    pub fn watch(&self) -> watch::Receiver<PlanState> {
        self.state.clone()
    }

    /// Wait for the next update. `None` once released or the feed has closed.
    pub async fn changed(&mut self) -> Option<Plan> {
        if self.released {
            return None;
        }
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().plan)
    }

    /// Wait until the first snapshot has been resolved.
    pub async fn loaded(&mut self) -> Option<Plan> {
        if self.released {
            return None;
        }
        let state = self.state.wait_for(|s| s.loaded).await.ok()?;
        Some(state.plan)
    }

    /// Unregister from the store and stop delivering updates. Safe to call
    /// more than once.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        // stop the forwarder before unlistening, otherwise it sees the feed
        // close and publishes a final free state
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        if let Some(publisher) = self.publisher.take() {
            publisher.send_replace(PlanState::FREE);
        }
        if let (Some(store), Some(id)) = (self.store.as_ref(), self.listener_id.take()) {
            store.unlisten(id).await;
        }
        if let Some(account) = &self.account {
            debug!(account_id = %account, "Plan subscription released");
        }
    }
}

impl<S> Drop for PlanSubscription<S>
where
    S: SubscriptionStore + ?Sized,
{
    fn drop(&mut self) {
        // The task owns the store receiver; stopping it closes the channel,
        // which the store treats as unregistration.
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(publisher) = self.publisher.take() {
            publisher.send_replace(PlanState::FREE);
        }
    }
}

/// Plan context for one consumer: the current identity, at most one live
/// subscription, and the entitlement checks built on it.
pub struct PlanSession<S>
where
    S: SubscriptionStore + ?Sized,
{
    watcher: PlanWatcher<S>,
    upgrades: PlanUpgradeService<S>,
    identity: Arc<dyn IdentityProvider>,
    active: Option<PlanSubscription<S>>,
    /// Last plan observed for the current account, kept while a refresh for
    /// that same account cannot reach the store.
    last_known: Option<(AccountId, Plan)>,
}

impl<S> PlanSession<S>
where
    S: SubscriptionStore + ?Sized,
{
    pub fn new(store: Arc<S>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            watcher: PlanWatcher::new(store.clone()),
            upgrades: PlanUpgradeService::new(store),
            identity,
            active: None,
            last_known: None,
        }
    }

    /// Re-establish the subscription for whoever is signed in now. The
    /// previous subscription is released first.
    ///
    /// If the store cannot be reached, the session keeps the last plan seen
    /// for the same account. A different account, or none, starts from free.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let mut carried = self.last_known.take();
        if let Some(mut previous) = self.active.take() {
            if previous.is_loaded() {
                carried = previous.account().cloned().map(|a| (a, previous.current()));
            }
            previous.release().await;
        }

        let account = self.identity.current_account();
        match self.watcher.subscribe(account.as_ref()).await {
            Ok(subscription) => {
                self.active = Some(subscription);
                Ok(())
            }
            Err(e) => {
                self.last_known = carried.filter(|(a, _)| Some(a) == account.as_ref());
                match &self.last_known {
                    Some((account, plan)) => warn!(
                        account_id = %account,
                        plan = %plan,
                        error = %e,
                        "Could not resubscribe to plan updates, keeping last known plan"
                    ),
                    None => warn!(error = %e, "Could not subscribe to plan updates, plan is free"),
                }
                Err(e)
            }
        }
    }

    pub async fn release(&mut self) {
        self.last_known = None;
        if let Some(mut active) = self.active.take() {
            active.release().await;
        }
    }

    pub fn subscription(&self) -> Option<&PlanSubscription<S>> {
        self.active.as_ref()
    }

    pub fn subscription_mut(&mut self) -> Option<&mut PlanSubscription<S>> {
        self.active.as_mut()
    }

    pub fn plan(&self) -> Plan {
        match (&self.active, &self.last_known) {
            (Some(active), _) => active.current(),
            (None, Some((_, plan))) => *plan,
            (None, None) => Plan::Free,
        }
    }

    pub fn is_loaded(&self) -> bool {
        match &self.active {
            Some(active) => active.is_loaded(),
            None => self.last_known.is_some(),
        }
    }

    pub fn limits(&self) -> &'static FeatureLimits {
        limits_for(self.plan())
    }

    pub fn can_use(&self, key: FeatureKey) -> bool {
        self.limits().can_use(key)
    }

    pub fn is_under_limit(&self, key: FeatureKey, current: u32) -> bool {
        self.limits().is_under_limit(key, current)
    }

    pub fn limit_value(&self, key: FeatureKey) -> LimitValue {
        self.limits().limit_value(key)
    }

    pub fn check_access(&self, key: FeatureKey, current: u32) -> AccessDecision {
        check_access(self.plan(), key, current)
    }

    pub fn is_pro(&self) -> bool {
        self.plan().is_pro()
    }

    pub fn is_enterprise(&self) -> bool {
        self.plan().is_enterprise()
    }

    pub async fn upgrade(&self, plan_id: &str) -> Result<Plan, UpgradeError> {
        self.upgrades.upgrade(self.identity.as_ref(), plan_id).await
    }
}
