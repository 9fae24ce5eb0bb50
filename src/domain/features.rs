//! Feature limits per plan and the evaluator over them.
//!
//! Count features carry a ceiling; flag features are on/off. `watermark` is a
//! restriction flag: `true` means a watermark is imposed, the opposite polarity
//! of every other flag. It is kept that way so stored data and UI rules line up.

use crate::domain::plan::Plan;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Ceiling used for "unlimited" counts.
pub const UNLIMITED: u32 = 999;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FeatureKey {
    MaxLinks,
    MaxProducts,
    CustomThemes,
    Analytics,
    MultiPage,
    LineNotify,
    Watermark,
    QrCodeColors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Count,
    Flag,
}

impl FeatureKey {
    pub fn all() -> impl Iterator<Item = FeatureKey> {
        FeatureKey::iter()
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureKey::MaxLinks | FeatureKey::MaxProducts | FeatureKey::QrCodeColors => {
                FeatureKind::Count
            }
            FeatureKey::CustomThemes
            | FeatureKey::Analytics
            | FeatureKey::MultiPage
            | FeatureKey::LineNotify
            | FeatureKey::Watermark => FeatureKind::Flag,
        }
    }

    /// Label for the plan comparison table.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKey::MaxLinks => "Quick links",
            FeatureKey::MaxProducts => "Products",
            FeatureKey::CustomThemes => "Custom themes",
            FeatureKey::Analytics => "Analytics",
            FeatureKey::MultiPage => "Multiple pages",
            FeatureKey::LineNotify => "LINE notifications",
            FeatureKey::Watermark => "No watermark",
            FeatureKey::QrCodeColors => "QR code colors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLimits {
    pub max_links: u32,
    pub max_products: u32,
    pub custom_themes: bool,
    pub analytics: bool,
    pub multi_page: bool,
    pub line_notify: bool,
    pub watermark: bool,
    pub qr_code_colors: u32,
}

static FREE_LIMITS: FeatureLimits = FeatureLimits {
    max_links: 3,
    max_products: 2,
    custom_themes: false,
    analytics: false,
    multi_page: false,
    line_notify: false,
    watermark: true,
    qr_code_colors: 2,
};

static PRO_LIMITS: FeatureLimits = FeatureLimits {
    max_links: UNLIMITED,
    max_products: UNLIMITED,
    custom_themes: true,
    analytics: false,
    multi_page: false,
    line_notify: false,
    watermark: false,
    qr_code_colors: 7,
};

static ENTERPRISE_LIMITS: FeatureLimits = FeatureLimits {
    max_links: UNLIMITED,
    max_products: UNLIMITED,
    custom_themes: true,
    analytics: true,
    multi_page: true,
    line_notify: true,
    watermark: false,
    qr_code_colors: UNLIMITED,
};

pub fn limits_for(plan: Plan) -> &'static FeatureLimits {
    match plan {
        Plan::Free => &FREE_LIMITS,
        Plan::Pro => &PRO_LIMITS,
        Plan::Enterprise => &ENTERPRISE_LIMITS,
    }
}

/// Lookup by stored identifier; anything unrecognized gets the free limits.
pub fn limits_for_id(plan_id: &str) -> &'static FeatureLimits {
    limits_for(Plan::resolve(Some(plan_id)))
}

/// Raw limit, a count or a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LimitValue {
    Count(u32),
    Flag(bool),
}

impl LimitValue {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, LimitValue::Count(n) if *n >= UNLIMITED)
    }
}

pub fn limit_value(limits: &FeatureLimits, key: FeatureKey) -> LimitValue {
    match key {
        FeatureKey::MaxLinks => LimitValue::Count(limits.max_links),
        FeatureKey::MaxProducts => LimitValue::Count(limits.max_products),
        FeatureKey::QrCodeColors => LimitValue::Count(limits.qr_code_colors),
        FeatureKey::CustomThemes => LimitValue::Flag(limits.custom_themes),
        FeatureKey::Analytics => LimitValue::Flag(limits.analytics),
        FeatureKey::MultiPage => LimitValue::Flag(limits.multi_page),
        FeatureKey::LineNotify => LimitValue::Flag(limits.line_notify),
        FeatureKey::Watermark => LimitValue::Flag(limits.watermark),
    }
}

/// Flags pass through as stored; counts are usable when the ceiling is above zero.
pub fn can_use(limits: &FeatureLimits, key: FeatureKey) -> bool {
    match limit_value(limits, key) {
        LimitValue::Flag(on) => on,
        LimitValue::Count(ceiling) => ceiling > 0,
    }
}

/// `current < ceiling` for counts. Flags have no ceiling, so this is always
/// true for them.
pub fn is_under_limit(limits: &FeatureLimits, key: FeatureKey, current: u32) -> bool {
    match limit_value(limits, key) {
        LimitValue::Count(ceiling) => current < ceiling,
        LimitValue::Flag(_) => true,
    }
}

// String-keyed variants for keys that arrive from outside the crate.
// Unknown keys fail closed.

pub fn can_use_key(limits: &FeatureLimits, key: &str) -> bool {
    key.parse::<FeatureKey>()
        .map(|k| can_use(limits, k))
        .unwrap_or(false)
}

pub fn is_under_limit_key(limits: &FeatureLimits, key: &str, current: u32) -> bool {
    key.parse::<FeatureKey>()
        .map(|k| is_under_limit(limits, k, current))
        .unwrap_or(true)
}

pub fn limit_value_key(limits: &FeatureLimits, key: &str) -> Option<LimitValue> {
    key.parse::<FeatureKey>().ok().map(|k| limit_value(limits, k))
}

impl FeatureLimits {
    pub fn can_use(&self, key: FeatureKey) -> bool {
        can_use(self, key)
    }

    pub fn is_under_limit(&self, key: FeatureKey, current: u32) -> bool {
        is_under_limit(self, key, current)
    }

    pub fn limit_value(&self, key: FeatureKey) -> LimitValue {
        limit_value(self, key)
    }
}

/// Outcome of gating an action against a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed,
    UpgradeRequired {
        feature: FeatureKey,
        current_plan: Plan,
        /// Lowest tier that allows the action, if any does.
        required_plan: Option<Plan>,
    },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

// For `Watermark` the gated action is removing the watermark.
fn allows(limits: &FeatureLimits, key: FeatureKey, current: u32) -> bool {
    match key {
        FeatureKey::Watermark => !limits.watermark,
        _ if key.kind() == FeatureKind::Count => is_under_limit(limits, key, current),
        _ => can_use(limits, key),
    }
}

/// Lowest plan that allows using `key` at `current` usage.
pub fn required_plan(key: FeatureKey, current: u32) -> Option<Plan> {
    Plan::all().find(|plan| allows(limits_for(*plan), key, current))
}

/// Gate an action: adding item number `current + 1` for counts, enabling a
/// flag feature, or dropping the watermark.
pub fn check_access(plan: Plan, key: FeatureKey, current: u32) -> AccessDecision {
    if allows(limits_for(plan), key, current) {
        return AccessDecision::Allowed;
    }
    AccessDecision::UpgradeRequired {
        feature: key,
        current_plan: plan,
        required_plan: required_plan(key, current).filter(|p| *p > plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> impl Iterator<Item = FeatureKey> {
        FeatureKey::all().filter(|k| k.kind() == FeatureKind::Count)
    }

    fn flags() -> impl Iterator<Item = FeatureKey> {
        FeatureKey::all().filter(|k| k.kind() == FeatureKind::Flag)
    }

    #[test]
    fn free_tier_matches_table() {
        let free = limits_for(Plan::Free);
        assert_eq!(free.max_links, 3);
        assert_eq!(free.max_products, 2);
        assert_eq!(free.qr_code_colors, 2);
        assert!(!free.custom_themes);
        assert!(!free.analytics);
        assert!(free.watermark);
    }

    #[test]
    fn pro_tier_matches_table() {
        let pro = limits_for(Plan::Pro);
        assert_eq!(pro.max_links, UNLIMITED);
        assert_eq!(pro.qr_code_colors, 7);
        assert!(pro.custom_themes);
        assert!(!pro.analytics);
        assert!(!pro.line_notify);
        assert!(!pro.watermark);
    }

    #[test]
    fn enterprise_tier_matches_table() {
        let ent = limits_for(Plan::Enterprise);
        assert_eq!(ent.qr_code_colors, UNLIMITED);
        assert!(ent.analytics && ent.multi_page && ent.line_notify);
        assert!(!ent.watermark);
    }

    #[test]
    fn numeric_limits_never_shrink_with_tier() {
        for key in counts() {
            let free = limit_value(limits_for(Plan::Free), key);
            let pro = limit_value(limits_for(Plan::Pro), key);
            let ent = limit_value(limits_for(Plan::Enterprise), key);
            match (free, pro, ent) {
                (LimitValue::Count(f), LimitValue::Count(p), LimitValue::Count(e)) => {
                    assert!(f <= p && p <= e, "{key} not monotonic");
                }
                other => panic!("{key} is not a count: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_plan_id_gets_free_limits() {
        for id in ["platinum", "", "FREE", "enterprise "] {
            assert_eq!(limits_for_id(id), limits_for(Plan::Free));
        }
        assert_eq!(limits_for_id("pro"), limits_for(Plan::Pro));
    }

    #[test]
    fn can_use_passes_flags_through() {
        for plan in Plan::all() {
            let limits = limits_for(plan);
            for key in flags() {
                assert_eq!(can_use(limits, key), limit_value(limits, key) == LimitValue::Flag(true));
            }
        }
        // restriction flag, raw value
        assert!(can_use(limits_for(Plan::Free), FeatureKey::Watermark));
    }

    #[test]
    fn can_use_counts_means_positive_ceiling() {
        let zeroed = FeatureLimits {
            max_links: 0,
            ..*limits_for(Plan::Free)
        };
        assert!(!can_use(&zeroed, FeatureKey::MaxLinks));
        assert!(can_use(&zeroed, FeatureKey::MaxProducts));
    }

    #[test]
    fn is_under_limit_compares_counts_strictly() {
        let free = limits_for(Plan::Free);
        assert!(is_under_limit(free, FeatureKey::MaxLinks, 2));
        assert!(!is_under_limit(free, FeatureKey::MaxLinks, 3));
        assert!(!is_under_limit(free, FeatureKey::MaxLinks, 4));
        assert!(is_under_limit(free, FeatureKey::MaxProducts, 0));
    }

    #[test]
    fn is_under_limit_is_permissive_for_flags() {
        let free = limits_for(Plan::Free);
        for key in flags() {
            for count in [0, 1, UNLIMITED, u32::MAX] {
                assert!(is_under_limit(free, key, count));
            }
        }
    }

    #[test]
    fn string_keys_fail_closed() {
        let ent = limits_for(Plan::Enterprise);
        assert!(!can_use_key(ent, "teleport"));
        assert!(is_under_limit_key(ent, "teleport", 10_000));
        assert_eq!(limit_value_key(ent, "teleport"), None);

        assert!(can_use_key(ent, "analytics"));
        assert!(!is_under_limit_key(limits_for(Plan::Free), "maxLinks", 3));
        assert_eq!(limit_value_key(ent, "qrCodeColors"), Some(LimitValue::Count(UNLIMITED)));
    }

    #[test]
    fn evaluator_is_deterministic() {
        for plan in Plan::all() {
            for key in FeatureKey::all() {
                assert_eq!(limits_for(plan), limits_for(plan));
                assert_eq!(can_use(limits_for(plan), key), can_use(limits_for(plan), key));
                assert_eq!(
                    is_under_limit(limits_for(plan), key, 5),
                    is_under_limit(limits_for(plan), key, 5)
                );
                assert_eq!(limit_value(limits_for(plan), key), limit_value(limits_for(plan), key));
            }
        }
    }

    #[test]
    fn feature_keys_use_camel_case_wire_names() {
        assert_eq!(FeatureKey::QrCodeColors.to_string(), "qrCodeColors");
        assert_eq!("lineNotify".parse::<FeatureKey>().ok(), Some(FeatureKey::LineNotify));
        let json = serde_json::to_value(limits_for(Plan::Free)).unwrap();
        assert_eq!(json["maxLinks"], 3);
        assert_eq!(json["watermark"], true);
    }

    #[test]
    fn limit_value_serializes_untagged() {
        assert_eq!(serde_json::to_value(LimitValue::Count(7)).unwrap(), serde_json::json!(7));
        assert_eq!(serde_json::to_value(LimitValue::Flag(false)).unwrap(), serde_json::json!(false));
        assert!(LimitValue::Count(UNLIMITED).is_unlimited());
        assert!(!LimitValue::Flag(true).is_unlimited());
    }

    #[test]
    fn access_decision_serializes_with_outcome_tag() {
        assert_eq!(
            serde_json::to_value(AccessDecision::Allowed).unwrap(),
            serde_json::json!({ "outcome": "allowed" })
        );
        assert_eq!(
            serde_json::to_value(check_access(Plan::Free, FeatureKey::Analytics, 0)).unwrap(),
            serde_json::json!({
                "outcome": "upgrade_required",
                "feature": "analytics",
                "current_plan": "free",
                "required_plan": "enterprise"
            })
        );
    }

    #[test]
    fn check_access_points_to_lowest_sufficient_plan() {
        assert_eq!(
            check_access(Plan::Free, FeatureKey::MaxLinks, 3),
            AccessDecision::UpgradeRequired {
                feature: FeatureKey::MaxLinks,
                current_plan: Plan::Free,
                required_plan: Some(Plan::Pro),
            }
        );
        assert_eq!(required_plan(FeatureKey::Analytics, 0), Some(Plan::Enterprise));
        assert!(check_access(Plan::Pro, FeatureKey::MaxLinks, 500).is_allowed());
        assert!(check_access(Plan::Enterprise, FeatureKey::LineNotify, 0).is_allowed());
    }

    #[test]
    fn check_access_without_any_sufficient_plan() {
        assert_eq!(
            check_access(Plan::Enterprise, FeatureKey::MaxLinks, UNLIMITED),
            AccessDecision::UpgradeRequired {
                feature: FeatureKey::MaxLinks,
                current_plan: Plan::Enterprise,
                required_plan: None,
            }
        );
    }

    #[test]
    fn watermark_removal_needs_a_paid_plan() {
        assert!(!check_access(Plan::Free, FeatureKey::Watermark, 0).is_allowed());
        assert!(check_access(Plan::Pro, FeatureKey::Watermark, 0).is_allowed());
        assert_eq!(required_plan(FeatureKey::Watermark, 0), Some(Plan::Pro));
    }
}
