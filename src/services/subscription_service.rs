use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    domain::{plan::Plan, role::Role},
    dto::subscriptions::{PlanInfo, PlanList, SubscribeRequest},
    entity::subscriptions::{
        ActiveModel as SubscriptionActive, Column as SubCol, Entity as Subscriptions,
        Model as SubscriptionModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::Subscription,
    response::ApiResponse,
    state::AppState,
};

pub fn list_plans() -> ApiResponse<PlanList> {
    let items = Plan::ALL.into_iter().map(PlanInfo::from).collect();
    ApiResponse::success("Plans", PlanList { items }, None)
}

pub async fn get_my_subscription(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Subscription>> {
    let subscription = Subscriptions::find()
        .filter(SubCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Subscription", subscription.into(), None))
}

/// Start a subscription, or move an existing one to another plan.
///
/// A plan change keeps the usage of the current period, so a downgrade below
/// what was already consumed is refused.
pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<Subscription>> {
    ensure_role(user, Role::Customer)?;
    let plan: Plan = payload.plan.parse()?;

    let txn = state.orm.begin().await?;
    let existing = lock_for_user(&txn, user.user_id).await?;
    let now = Utc::now();

    let subscription = match existing {
        Some(current) if current.is_active => {
            if current.used_kg > plan.limit_in_kg() {
                return Err(AppError::BadRequest(format!(
                    "Current usage of {:.2} kg exceeds the {} plan limit of {:.2} kg",
                    current.used_kg,
                    plan,
                    plan.limit_in_kg()
                )));
            }
            let mut active: SubscriptionActive = current.into();
            active.plan = Set(plan.as_str().to_string());
            active.limit_in_kg = Set(plan.limit_in_kg());
            active.updated_at = Set(now.into());
            active.update(&txn).await?
        }
        Some(current) => {
            let mut active: SubscriptionActive = current.into();
            active.plan = Set(plan.as_str().to_string());
            active.limit_in_kg = Set(plan.limit_in_kg());
            active.used_kg = Set(0.0);
            active.is_active = Set(true);
            active.started_at = Set(now.into());
            active.updated_at = Set(now.into());
            active.update(&txn).await?
        }
        None => {
            SubscriptionActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                plan: Set(plan.as_str().to_string()),
                limit_in_kg: Set(plan.limit_in_kg()),
                used_kg: Set(0.0),
                is_active: Set(true),
                started_at: Set(now.into()),
                created_at: NotSet,
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "subscription_set",
        "subscriptions",
        serde_json::json!({ "subscription_id": subscription.id, "plan": subscription.plan }),
    )
    .await;
    tracing::info!(user_id = %user.user_id, plan = %plan, "subscription set");

    Ok(ApiResponse::success(
        "Subscription active",
        subscription.into(),
        None,
    ))
}

pub async fn cancel_subscription(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Subscription>> {
    let existing = Subscriptions::find()
        .filter(SubCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: SubscriptionActive = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().into());
    let subscription = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "subscription_cancel",
        "subscriptions",
        serde_json::json!({ "subscription_id": subscription.id }),
    )
    .await;
    tracing::info!(user_id = %user.user_id, "subscription cancelled");

    Ok(ApiResponse::success(
        "Subscription cancelled",
        subscription.into(),
        None,
    ))
}

/// Fetch a user's subscription row with `FOR UPDATE` inside a transaction.
pub async fn lock_for_user<C>(conn: &C, user_id: Uuid) -> AppResult<Option<SubscriptionModel>>
where
    C: ConnectionTrait,
{
    let row = Subscriptions::find()
        .filter(SubCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(row)
}

/// The plan of an active subscription, or `None` when the user has none.
pub async fn active_plan<C>(conn: &C, user_id: Uuid) -> AppResult<Option<Plan>>
where
    C: ConnectionTrait,
{
    let row = Subscriptions::find()
        .filter(SubCol::UserId.eq(user_id))
        .filter(SubCol::IsActive.eq(true))
        .one(conn)
        .await?;

    match row {
        Some(subscription) => Ok(Some(subscription.plan.parse()?)),
        None => Ok(None),
    }
}
