use crate::domain::features::{limits_for, FeatureLimits};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Subscription tier. Declaration order is the tier order (`Free < Pro < Enterprise`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    /// Strict parse, for identifiers supplied by a caller.
    pub fn parse(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    /// Lenient resolution for stored identifiers. Missing or unrecognized
    /// values resolve to `Free` so legacy documents never break gating.
    pub fn resolve(id: Option<&str>) -> Self {
        id.and_then(Self::parse).unwrap_or_default()
    }

    pub fn all() -> impl Iterator<Item = Plan> {
        Plan::iter()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn is_at_least(&self, other: Plan) -> bool {
        *self >= other
    }

    /// Paid tiers count as "pro" for display purposes.
    pub fn is_pro(&self) -> bool {
        self.is_at_least(Plan::Pro)
    }

    pub fn is_enterprise(&self) -> bool {
        *self == Plan::Enterprise
    }

    pub fn limits(&self) -> &'static FeatureLimits {
        limits_for(*self)
    }
}

/// Catalog entry shown on the plan comparison page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanInfo {
    pub id: Plan,
    pub name: &'static str,
    /// Whole NT$ amount.
    pub price: u32,
    pub price_label: &'static str,
    pub price_note: Option<&'static str>,
    pub description: &'static str,
    pub popular: bool,
    pub features: FeatureLimits,
}

impl PlanInfo {
    pub fn for_plan(plan: Plan) -> Self {
        let features = *plan.limits();
        match plan {
            Plan::Free => Self {
                id: plan,
                name: "Free",
                price: 0,
                price_label: "Free",
                price_note: None,
                description: "For trying things out on a personal page",
                popular: false,
                features,
            },
            Plan::Pro => Self {
                id: plan,
                name: "Pro",
                price: 3600,
                price_label: "NT$3,600",
                price_note: Some("One-time lifetime purchase"),
                description: "For personal brands and small shops",
                popular: true,
                features,
            },
            Plan::Enterprise => Self {
                id: plan,
                name: "Enterprise",
                price: 9900,
                price_label: "NT$9,900",
                price_note: Some("One-time lifetime purchase"),
                description: "For companies and teams",
                popular: false,
                features,
            },
        }
    }
}

/// All catalog entries in tier order.
pub fn plan_catalog() -> Vec<PlanInfo> {
    Plan::all().map(PlanInfo::for_plan).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Plan::Free < Plan::Pro);
        assert!(Plan::Pro < Plan::Enterprise);
        assert_eq!(Plan::all().collect::<Vec<_>>(), vec![Plan::Free, Plan::Pro, Plan::Enterprise]);
    }

    #[test]
    fn parse_is_strict_and_resolve_is_lenient() {
        assert_eq!(Plan::parse("enterprise"), Some(Plan::Enterprise));
        assert_eq!(Plan::parse("platinum"), None);
        assert_eq!(Plan::parse("Pro"), None);

        assert_eq!(Plan::resolve(Some("pro")), Plan::Pro);
        assert_eq!(Plan::resolve(Some("platinum")), Plan::Free);
        assert_eq!(Plan::resolve(Some("")), Plan::Free);
        assert_eq!(Plan::resolve(None), Plan::Free);
    }

    #[test]
    fn display_matches_stored_identifier() {
        for plan in Plan::all() {
            assert_eq!(plan.to_string(), plan.as_str());
            assert_eq!(Plan::parse(plan.as_str()), Some(plan));
        }
    }

    #[test]
    fn pro_and_enterprise_flags() {
        assert!(!Plan::Free.is_pro());
        assert!(Plan::Pro.is_pro());
        assert!(Plan::Enterprise.is_pro());
        assert!(!Plan::Pro.is_enterprise());
        assert!(Plan::Enterprise.is_enterprise());
    }

    #[test]
    fn catalog_lists_every_plan_once() {
        let catalog = plan_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].id, Plan::Free);
        assert_eq!(catalog[1].price, 3600);
        assert!(catalog[1].popular);
        assert_eq!(catalog[2].features, *Plan::Enterprise.limits());
    }
}
