use crate::domain::features::{limits_for, FeatureLimits};
use crate::domain::plan::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable account identifier handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Subscription document as kept in the store, keyed by account id.
///
/// `plan` stays a raw string: documents written by older clients may carry
/// identifiers this build does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDocument {
    #[serde(default)]
    pub plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SubscriptionDocument {
    pub fn effective_plan(&self) -> Plan {
        Plan::resolve(Some(self.plan.as_str()))
    }

    pub fn limits(&self) -> &'static FeatureLimits {
        limits_for(self.effective_plan())
    }

    /// Merge a patch in place. Fields absent from the patch are kept.
    pub fn apply(&mut self, patch: &SubscriptionPatch) {
        self.plan = patch.plan.as_str().to_string();
        if patch.upgraded_at.is_some() {
            self.upgraded_at = patch.upgraded_at;
        }
        if patch.user_id.is_some() {
            self.user_id = patch.user_id.clone();
        }
    }
}

impl From<&SubscriptionPatch> for SubscriptionDocument {
    fn from(patch: &SubscriptionPatch) -> Self {
        Self {
            plan: patch.plan.as_str().to_string(),
            upgraded_at: patch.upgraded_at,
            user_id: patch.user_id.clone(),
        }
    }
}

/// Effective plan for an optional document; no document means free.
pub fn effective_plan(doc: Option<&SubscriptionDocument>) -> Plan {
    doc.map(SubscriptionDocument::effective_plan)
        .unwrap_or_default()
}

/// Body of a merge-write.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPatch {
    pub plan: Plan,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl SubscriptionPatch {
    pub fn upgrade(account: &AccountId, plan: Plan) -> Self {
        Self {
            plan,
            upgraded_at: Some(Utc::now()),
            user_id: Some(account.as_str().to_string()),
        }
    }
}
