use crate::application::UpgradeError;
use crate::domain::Plan;
use crate::infrastructure::StoreError;
use axum::http::StatusCode;

pub(super) fn map_store_error(err: &StoreError) -> (StatusCode, serde_json::Value) {
    if err.is_transient() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": "Subscription store unavailable, please retry" }),
        );
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "error": "Failed to read subscription" }),
    )
}

pub(super) fn map_upgrade_error(err: &UpgradeError) -> (StatusCode, serde_json::Value) {
    match err {
        UpgradeError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "error": "Sign in to upgrade" }),
        ),
        UpgradeError::InvalidPlan(id) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": format!("Invalid plan: {}", id),
                "allowed": Plan::all().map(|p| p.as_str()).collect::<Vec<_>>()
            }),
        ),
        UpgradeError::Store(e) if e.is_transient() => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": "Subscription store unavailable, please retry" }),
        ),
        UpgradeError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to upgrade plan" }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_errors_map_to_distinct_statuses() {
        assert_eq!(map_upgrade_error(&UpgradeError::Unauthenticated).0, StatusCode::UNAUTHORIZED);

        let (status, body) = map_upgrade_error(&UpgradeError::InvalidPlan("platinum".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["allowed"], serde_json::json!(["free", "pro", "enterprise"]));

        let unavailable = UpgradeError::Store(StoreError::Unavailable("down".to_string()));
        assert_eq!(map_upgrade_error(&unavailable).0, StatusCode::SERVICE_UNAVAILABLE);

        let invalid = UpgradeError::Store(StoreError::InvalidData("bad row".to_string()));
        assert_eq!(map_upgrade_error(&invalid).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_split_on_transience() {
        let (status, _) = map_store_error(&StoreError::Unavailable("down".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = map_store_error(&StoreError::InvalidData("bad".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
