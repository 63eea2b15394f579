use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::role::Role,
    dto::producers::{CreateProducerRequest, ProducerList},
    entity::{
        producers::{ActiveModel as ProducerActive, Column as ProducerCol, Entity as Producers},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::Producer,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// The producer whose orders and catalog the caller may act on: the profile
/// a producer owns, or the producer an employee is assigned to.
///
/// The role is read from `users` rather than the token, so a role change by
/// an admin takes effect before the caller's token expires.
pub async fn resolve_producer_scope(state: &AppState, user: &AuthUser) -> AppResult<Uuid> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;
    let role: Role = account.role.parse()?;

    match role {
        Role::Producer => {
            let producer = Producers::find()
                .filter(ProducerCol::UserId.eq(account.id))
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::Forbidden("Create a producer profile first".into()))?;
            Ok(producer.id)
        }
        Role::Employee => account
            .producer_id
            .ok_or_else(|| AppError::Forbidden("Employee is not assigned to a producer".into())),
        Role::Customer | Role::Admin => Err(AppError::forbidden()),
    }
}

pub async fn list_producers(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProducerList>> {
    let (page, limit, offset) = pagination.normalize()?;
    let finder = Producers::find().order_by_asc(ProducerCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Producer::from)
        .collect();

    Ok(ApiResponse::success(
        "Producers",
        ProducerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_producer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Producer>> {
    let producer = Producers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Producer", producer.into(), None))
}

pub async fn get_my_producer(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Producer>> {
    let producer_id = resolve_producer_scope(state, user).await?;
    get_producer(state, producer_id).await
}

pub async fn create_my_producer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProducerRequest,
) -> AppResult<ApiResponse<Producer>> {
    ensure_role(user, Role::Producer)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let existing = Producers::find()
        .filter(ProducerCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Producer profile already exists".into()));
    }

    let producer = ProducerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(name),
        description: Set(payload.description),
        location: Set(payload.location),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "producer_create",
        "producers",
        serde_json::json!({ "producer_id": producer.id }),
    )
    .await;

    Ok(ApiResponse::success("Producer created", producer.into(), None))
}
