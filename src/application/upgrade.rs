use crate::domain::{effective_plan, AccountId, Plan, SubscriptionPatch};
use crate::infrastructure::{IdentityProvider, StoreError, SubscriptionStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum UpgradeError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Writes plan changes to the store.
///
/// No payment provider sits behind this yet: any signed-in account can move
/// itself to any known plan. Receipts and idempotency keys must be added
/// before it is used for real billing.
pub struct PlanUpgradeService<S>
where
    S: SubscriptionStore + ?Sized,
{
    store: Arc<S>,
}

impl<S> PlanUpgradeService<S>
where
    S: SubscriptionStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Upgrade the account reported by `identity` to `plan_id`.
    ///
    /// Checks authentication first, then the plan id; neither failure touches
    /// the store. Live subscriptions see the change asynchronously, so callers
    /// that need instant feedback should apply it locally as well.
    pub async fn upgrade(
        &self,
        identity: &dyn IdentityProvider,
        plan_id: &str,
    ) -> Result<Plan, UpgradeError> {
        let account = identity
            .current_account()
            .ok_or(UpgradeError::Unauthenticated)?;
        let plan =
            Plan::parse(plan_id).ok_or_else(|| UpgradeError::InvalidPlan(plan_id.to_string()))?;

        if let Err(e) = self
            .store
            .merge_write(&account, SubscriptionPatch::upgrade(&account, plan))
            .await
        {
            error!(account_id = %account, plan = %plan, error = %e, "Failed to upgrade plan");
            return Err(e.into());
        }

        info!(account_id = %account, plan = %plan, "Plan upgraded");
        Ok(plan)
    }

    /// Point read of the effective plan. Anonymous callers are on free.
    pub async fn current_plan(&self, account: Option<&AccountId>) -> Result<Plan, StoreError> {
        let Some(account) = account else {
            return Ok(Plan::Free);
        };
        let doc = self.store.get(account).await?;
        Ok(effective_plan(doc.as_ref()))
    }
}
