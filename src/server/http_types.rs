use crate::domain::{AccessDecision, FeatureLimits, LimitValue, Plan, PlanInfo, Theme};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub(super) struct HealthResponse {
    pub(super) status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct PlanCatalogResponse {
    #[schema(value_type = Vec<Object>)]
    pub(super) plans: Vec<PlanInfo>,
    /// Display label per feature key.
    pub(super) feature_labels: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub(super) struct ThemeParams {
    /// Plan to list themes for; unknown or missing means free.
    pub(super) plan: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct ThemeListResponse {
    #[schema(value_type = String)]
    pub(super) plan: Plan,
    #[schema(value_type = Vec<Object>)]
    pub(super) themes: Vec<&'static Theme>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct MyPlanResponse {
    pub(super) account_id: Option<String>,
    #[schema(value_type = String, example = "pro")]
    pub(super) plan: Plan,
    pub(super) is_pro: bool,
    pub(super) is_enterprise: bool,
    #[schema(value_type = Object)]
    pub(super) limits: FeatureLimits,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct UpgradeRequest {
    #[schema(example = "enterprise")]
    pub(super) plan: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct UpgradeResponse {
    #[schema(value_type = String)]
    pub(super) plan: Plan,
}

#[derive(Deserialize, Debug, IntoParams)]
pub(super) struct EntitlementParams {
    /// Current usage, for count features.
    pub(super) count: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct EntitlementResponse {
    pub(super) feature: String,
    /// False when the feature key is not recognized.
    pub(super) known: bool,
    #[schema(value_type = String)]
    pub(super) plan: Plan,
    pub(super) allowed: bool,
    /// Present when `count` was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) under_limit: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub(super) limit: Option<LimitValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub(super) decision: Option<AccessDecision>,
}
