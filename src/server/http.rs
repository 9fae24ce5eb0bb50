use super::http_auth::extract_account_id;
use super::http_errors::{map_store_error, map_upgrade_error};
use super::http_types::{
    EntitlementParams, EntitlementResponse, HealthResponse, MyPlanResponse, PlanCatalogResponse,
    ThemeListResponse, ThemeParams, UpgradeRequest, UpgradeResponse,
};
use super::state::AppState;
use crate::domain::{
    available_themes, can_use_key, check_access, is_under_limit_key, limit_value_key, limits_for,
    plan_catalog, FeatureKey, Plan, PlanInfo,
};
use crate::infrastructure::StaticIdentity;
use axum::{
    extract::{Path, Query, State},
    http::{header::HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/plans", get(list_plans))
        .route("/plans/:id", get(get_plan))
        .route("/themes", get(list_themes))
        .route("/me/plan", get(get_my_plan))
        .route("/me/plan/upgrade", post(upgrade_plan))
        .route("/me/entitlements/:feature", get(get_entitlement))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        list_plans,
        get_plan,
        list_themes,
        get_my_plan,
        upgrade_plan,
        get_entitlement,
    ),
    components(
        schemas(
            HealthResponse,
            PlanCatalogResponse,
            ThemeListResponse,
            MyPlanResponse,
            UpgradeRequest,
            UpgradeResponse,
            EntitlementResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Plans", description = "Plan catalog and themes"),
        (name = "Account", description = "Caller's plan, upgrades and entitlement checks"),
    ),
    info(
        title = "Biolink Entitlements API",
        version = "0.1.0",
        description = "Plan tiers, feature limits and plan upgrades for bio-link pages",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Health check endpoint
///
/// Verifies the subscription store is reachable.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    error: Some("Subscription store unreachable".to_string()),
                }),
            )
        }
    }
}

/// Plan catalog in tier order, with feature labels for the comparison table.
#[utoipa::path(
    get,
    path = "/plans",
    tag = "Plans",
    responses((status = 200, description = "Plan catalog", body = PlanCatalogResponse))
)]
async fn list_plans() -> impl IntoResponse {
    let feature_labels = FeatureKey::all()
        .map(|k| (k.to_string(), k.label().to_string()))
        .collect();

    Json(PlanCatalogResponse {
        plans: plan_catalog(),
        feature_labels,
    })
}

#[utoipa::path(
    get,
    path = "/plans/{id}",
    tag = "Plans",
    params(("id" = String, Path, description = "Plan id: free, pro or enterprise")),
    responses(
        (status = 200, description = "Plan found", body = Object),
        (status = 404, description = "Unknown plan", body = Object)
    )
)]
async fn get_plan(Path(id): Path<String>) -> impl IntoResponse {
    match Plan::parse(&id) {
        Some(plan) => (
            StatusCode::OK,
            Json(serde_json::json!(PlanInfo::for_plan(plan))),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Plan not found" })),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/themes",
    tag = "Plans",
    params(ThemeParams),
    responses((status = 200, description = "Themes available to the plan", body = ThemeListResponse))
)]
async fn list_themes(Query(params): Query<ThemeParams>) -> impl IntoResponse {
    let plan = Plan::resolve(params.plan.as_deref());
    Json(ThemeListResponse {
        plan,
        themes: available_themes(plan),
    })
}

/// Caller's effective plan. Anonymous callers are on free.
#[utoipa::path(
    get,
    path = "/me/plan",
    tag = "Account",
    responses(
        (status = 200, description = "Effective plan and limits", body = MyPlanResponse),
        (status = 503, description = "Subscription store unavailable", body = Object),
        (status = 500, description = "Failed to read subscription", body = Object)
    )
)]
async fn get_my_plan(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let account = extract_account_id(&headers, &state.account_header);

    match state.upgrades.current_plan(account.as_ref()).await {
        Ok(plan) => (
            StatusCode::OK,
            Json(serde_json::json!(MyPlanResponse {
                account_id: account.map(|a| a.to_string()),
                plan,
                is_pro: plan.is_pro(),
                is_enterprise: plan.is_enterprise(),
                limits: *limits_for(plan),
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Failed to read plan");
            let (status, body) = map_store_error(&e);
            (status, Json(body))
        }
    }
}

/// Move the caller to another plan.
///
/// Placeholder for a payment flow: no charge is made.
#[utoipa::path(
    post,
    path = "/me/plan/upgrade",
    tag = "Account",
    request_body = UpgradeRequest,
    responses(
        (status = 200, description = "Plan upgraded", body = UpgradeResponse),
        (status = 400, description = "Unknown plan id", body = Object),
        (status = 401, description = "Caller is not signed in", body = Object),
        (status = 503, description = "Subscription store unavailable", body = Object),
        (status = 500, description = "Failed to upgrade plan", body = Object)
    )
)]
async fn upgrade_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpgradeRequest>,
) -> impl IntoResponse {
    let identity = StaticIdentity::from(extract_account_id(&headers, &state.account_header));

    match state.upgrades.upgrade(&identity, req.plan.as_str()).await {
        Ok(plan) => {
            info!(plan = %plan, "Upgrade request completed");
            (StatusCode::OK, Json(serde_json::json!(UpgradeResponse { plan })))
        }
        Err(e) => {
            warn!(error = %e, "Upgrade request rejected");
            let (status, body) = map_upgrade_error(&e);
            (status, Json(body))
        }
    }
}

/// Entitlement check for one feature. Unknown feature keys fail closed.
#[utoipa::path(
    get,
    path = "/me/entitlements/{feature}",
    tag = "Account",
    params(
        ("feature" = String, Path, description = "Feature key, e.g. maxLinks"),
        EntitlementParams
    ),
    responses(
        (status = 200, description = "Entitlement result", body = EntitlementResponse),
        (status = 503, description = "Subscription store unavailable", body = Object),
        (status = 500, description = "Failed to read subscription", body = Object)
    )
)]
async fn get_entitlement(
    State(state): State<AppState>,
    Path(feature): Path<String>,
    Query(params): Query<EntitlementParams>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let account = extract_account_id(&headers, &state.account_header);
    let plan = match state.upgrades.current_plan(account.as_ref()).await {
        Ok(plan) => plan,
        Err(e) => {
            warn!(error = %e, "Failed to read plan");
            let (status, body) = map_store_error(&e);
            return (status, Json(body));
        }
    };

    let limits = limits_for(plan);
    let key = feature.parse::<FeatureKey>().ok();
    let response = EntitlementResponse {
        known: key.is_some(),
        plan,
        allowed: can_use_key(limits, &feature),
        under_limit: params
            .count
            .map(|count| is_under_limit_key(limits, &feature, count)),
        limit: limit_value_key(limits, &feature),
        decision: key.map(|k| check_access(plan, k, params.count.unwrap_or(0))),
        feature,
    };

    (StatusCode::OK, Json(serde_json::json!(response)))
}
