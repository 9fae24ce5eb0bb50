use crate::domain::plan::Plan;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    /// Minimum plan that unlocks the theme.
    pub tier: Plan,
    pub primary_color: &'static str,
}

impl Theme {
    pub fn is_available_for(&self, plan: Plan) -> bool {
        plan.is_at_least(self.tier)
    }
}

pub static THEMES: &[Theme] = &[
    Theme {
        id: "classic",
        name: "Classic Black Gold",
        category: "Business",
        tier: Plan::Free,
        primary_color: "#D4AF37",
    },
    Theme {
        id: "fresh",
        name: "Fresh White Blue",
        category: "Minimal",
        tier: Plan::Free,
        primary_color: "#3B82F6",
    },
    Theme {
        id: "warm",
        name: "Warm Amber",
        category: "Vibrant",
        tier: Plan::Pro,
        primary_color: "#F59E0B",
    },
    Theme {
        id: "tech",
        name: "Tech Neon Violet",
        category: "Futuristic",
        tier: Plan::Pro,
        primary_color: "#8B5CF6",
    },
    Theme {
        id: "nature",
        name: "Nature Green",
        category: "Eco",
        tier: Plan::Pro,
        primary_color: "#10B981",
    },
    Theme {
        id: "ocean",
        name: "Deep Ocean",
        category: "Calm",
        tier: Plan::Pro,
        primary_color: "#0EA5E9",
    },
    Theme {
        id: "luxury",
        name: "Luxury Rose Gold",
        category: "Boutique",
        tier: Plan::Enterprise,
        primary_color: "#EC4899",
    },
    Theme {
        id: "midnight",
        name: "Midnight Sky",
        category: "Dreamy",
        tier: Plan::Enterprise,
        primary_color: "#6366F1",
    },
];

pub fn find_theme(id: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.id == id)
}

pub fn available_themes(plan: Plan) -> Vec<&'static Theme> {
    THEMES.iter().filter(|t| t.is_available_for(plan)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_only_gets_free_themes() {
        let ids: Vec<_> = available_themes(Plan::Free).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["classic", "fresh"]);
    }

    #[test]
    fn higher_tiers_include_lower_tier_themes() {
        assert_eq!(available_themes(Plan::Pro).len(), 6);
        assert_eq!(available_themes(Plan::Enterprise).len(), THEMES.len());
    }

    #[test]
    fn find_theme_by_id() {
        let luxury = find_theme("luxury").expect("luxury theme");
        assert_eq!(luxury.tier, Plan::Enterprise);
        assert!(!luxury.is_available_for(Plan::Pro));
        assert!(find_theme("neon").is_none());
    }
}
