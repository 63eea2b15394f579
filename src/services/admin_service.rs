use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

use crate::{
    audit,
    domain::{order_status::OrderStatus, role::Role},
    dto::{
        admin::{DashboardStats, InventoryAdjustRequest, UpdateUserRoleRequest, UserList},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::ProductList,
        subscriptions::SubscriptionList,
    },
    entity::{
        orders::Entity as Orders,
        producers::Entity as Producers,
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        subscriptions::{
            ActiveModel as SubscriptionActive, Column as SubCol, Entity as Subscriptions,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Product, Subscription, User},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, Pagination},
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    order_service::list_orders_where(state, Condition::all(), query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::with_items(state, order).await?;
    Ok(ApiResponse::success("Order found", data, None))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next: OrderStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = order_service::transition(&txn, existing, next).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated by admin");

    Ok(ApiResponse::success("Order updated", order.into(), None))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize()?;
    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Change a user's role. Employees must be attached to an existing producer;
/// every other role drops any producer assignment.
pub async fn update_user_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let role: Role = payload.role.parse()?;

    let producer_id = match role {
        Role::Employee => {
            let producer_id = payload.producer_id.ok_or_else(|| {
                AppError::BadRequest("producer_id is required for employees".into())
            })?;
            Producers::find_by_id(producer_id)
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::BadRequest("producer not found".into()))?;
            Some(producer_id)
        }
        _ => None,
    };

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    active.role = Set(role.as_str().to_string());
    active.producer_id = Set(producer_id);
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role, "producer_id": producer_id }),
    )
    .await;

    Ok(ApiResponse::success("User updated", updated.into(), None))
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SubscriptionList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize()?;
    let finder = Subscriptions::find().order_by_desc(SubCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Subscription::from)
        .collect();

    Ok(ApiResponse::success(
        "Subscriptions",
        SubscriptionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Start a new period for a customer: usage goes back to zero.
pub async fn reset_subscription_usage(
    state: &AppState,
    user: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<Subscription>> {
    ensure_admin(user)?;
    let existing = Subscriptions::find()
        .filter(SubCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let mut active: SubscriptionActive = existing.into();
    active.used_kg = Set(0.0);
    active.started_at = Set(now.into());
    active.updated_at = Set(now.into());
    let subscription = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "subscription_reset",
        "subscriptions",
        serde_json::json!({ "subscription_id": subscription.id, "user_id": user_id }),
    )
    .await;
    tracing::info!(user_id = %user_id, "subscription usage reset");

    Ok(ApiResponse::success(
        "Subscription usage reset",
        subscription.into(),
        None,
    ))
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let users_by_role: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
            .fetch_all(&state.pool)
            .await?;

    let orders_by_status: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(&state.pool)
            .await?;

    let (active_subscriptions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE is_active")
            .fetch_one(&state.pool)
            .await?;

    let (total_ordered_kg, total_delivered_kg, total_revenue): (f64, f64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(total_weight_in_kg) FILTER (WHERE status <> 'cancelled'), 0)::FLOAT8,
            COALESCE(SUM(total_weight_in_kg) FILTER (WHERE status = 'delivered'), 0)::FLOAT8,
            COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT
        FROM orders
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let stats = DashboardStats {
        users_by_role: users_by_role.into_iter().collect::<BTreeMap<_, _>>(),
        orders_by_status: orders_by_status.into_iter().collect::<BTreeMap<_, _>>(),
        active_subscriptions,
        total_ordered_kg,
        total_delivered_kg,
        total_revenue,
    };

    Ok(ApiResponse::success("Dashboard", stats, None))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize()?;

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .ok_or_else(|| AppError::BadRequest("stock adjustment is out of range".into()))?;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success("Inventory updated", updated.into(), None))
}
