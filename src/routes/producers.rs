use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::producers::{CreateProducerRequest, ProducerList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Producer,
    response::ApiResponse,
    routes::params::Pagination,
    services::producer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_producers))
        .route("/me", get(get_my_producer).post(create_my_producer))
        .route("/{id}", get(get_producer))
}

#[utoipa::path(
    get,
    path = "/api/producers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List producers", body = ApiResponse<ProducerList>)
    ),
    tag = "Producers"
)]
pub async fn list_producers(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProducerList>>> {
    let resp = producer_service::list_producers(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/producers/{id}",
    params(("id" = Uuid, Path, description = "Producer ID")),
    responses(
        (status = 200, description = "Get producer", body = ApiResponse<Producer>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Producers"
)]
pub async fn get_producer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Producer>>> {
    let resp = producer_service::get_producer(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/producers/me",
    responses(
        (status = 200, description = "Producer profile of the caller or their employer", body = ApiResponse<Producer>),
        (status = 403, description = "No producer scope"),
    ),
    security(("bearer_auth" = [])),
    tag = "Producers"
)]
pub async fn get_my_producer(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Producer>>> {
    let resp = producer_service::get_my_producer(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/producers/me",
    request_body = CreateProducerRequest,
    responses(
        (status = 201, description = "Producer profile created", body = ApiResponse<Producer>),
        (status = 403, description = "Caller is not a producer"),
        (status = 409, description = "Profile already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Producers"
)]
pub async fn create_my_producer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProducerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Producer>>)> {
    let resp = producer_service::create_my_producer(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
