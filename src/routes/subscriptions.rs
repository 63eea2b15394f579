use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::subscriptions::{PlanList, SubscribeRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Subscription,
    response::ApiResponse,
    services::subscription_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(subscribe))
        .route("/plans", get(list_plans))
        .route("/me", get(get_my_subscription))
        .route("/cancel", post(cancel_subscription))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    responses(
        (status = 200, description = "Available plans with limits and categories", body = ApiResponse<PlanList>)
    ),
    tag = "Subscriptions"
)]
pub async fn list_plans() -> Json<ApiResponse<PlanList>> {
    Json(subscription_service::list_plans())
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/me",
    responses(
        (status = 200, description = "Subscription with remaining allowance", body = ApiResponse<Subscription>),
        (status = 404, description = "No subscription"),
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn get_my_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    let resp = subscription_service::get_my_subscription(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscription started or plan changed", body = ApiResponse<Subscription>),
        (status = 400, description = "Unknown plan or usage above the new limit"),
        (status = 403, description = "Only customers subscribe"),
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    let resp = subscription_service::subscribe(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/cancel",
    responses(
        (status = 200, description = "Subscription deactivated", body = ApiResponse<Subscription>),
        (status = 404, description = "No subscription"),
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    let resp = subscription_service::cancel_subscription(&state, &user).await?;
    Ok(Json(resp))
}
