use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, Query};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        allowance::{Allowance, total_weight_in_kg},
        order_status::{OrderStatus, PaymentStatus, StatusError},
    },
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithItems, ProducerOrderList,
        UpdateOrderStatusRequest,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        subscriptions::ActiveModel as SubscriptionActive,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{producer_service::resolve_producer_scope, subscription_service::lock_for_user},
    state::AppState,
};

/// Turn the caller's cart into an order.
///
/// Runs in one transaction. The cart rows, the subscription row and the
/// product rows are locked, so two concurrent orders from the same user
/// cannot both pass the allowance check.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let subscription = lock_for_user(&txn, user.user_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| {
            AppError::Forbidden("An active subscription is required to place orders".into())
        })?;

    let total_weight = total_weight_in_kg(&cart);
    let allowance = Allowance::new(subscription.limit_in_kg, subscription.used_kg);
    let used_kg = match allowance.reserve(total_weight) {
        Ok(used_kg) => used_kg,
        Err(err) => {
            tracing::info!(
                user_id = %user.user_id,
                requested_kg = total_weight,
                remaining_kg = allowance.remaining_kg(),
                "order rejected by subscription limit"
            );
            return Err(err.into());
        }
    };

    let product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut total_amount: i64 = 0;
    for item in &cart {
        let product = products
            .get(&item.product_id)
            .filter(|p| p.is_available)
            .ok_or_else(|| {
                AppError::BadRequest(format!("{} is no longer available", item.product_name))
            })?;
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}: {} left, {} requested",
                product.name, product.stock, item.quantity
            )));
        }
        total_amount = product
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total_amount.checked_add(line))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().into()),
        total_weight_in_kg: Set(total_weight),
        total_amount: Set(total_amount),
        delivery_address: Set(payload.delivery_address),
        notes: Set(payload.notes),
        paid_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(cart.len());
    for item in &cart {
        let price = products
            .get(&item.product_id)
            .map(|p| p.price)
            .unwrap_or(item.price);

        let snapshot = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            producer_id: Set(item.producer_id),
            product_name: Set(item.product_name.clone()),
            quantity: Set(item.quantity),
            weight_in_kg: Set(item.weight_in_kg),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(snapshot.into());

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    let mut sub_active: SubscriptionActive = subscription.into();
    sub_active.used_kg = Set(used_kg);
    sub_active.updated_at = Set(now.into());
    sub_active.update(&txn).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "weight_in_kg": total_weight }),
    )
    .await;
    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.id,
        weight_in_kg = total_weight,
        used_kg,
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items: order_items,
        },
        None,
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders_where(state, condition, query).await
}

/// Paginated order listing shared by the customer and admin views.
pub async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize()?;
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(state, order).await?;
    Ok(ApiResponse::success("OK", data, None))
}

/// Simulated card payment: marks the order paid without calling a processor.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_own_order(&txn, user, id).await?;

    let status: OrderStatus = order.status.parse()?;
    if status.is_terminal() {
        return Err(StatusError::Terminal(status).into());
    }
    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(StatusError::AlreadyPaid.into());
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().into());
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id, "amount": order.total_amount }),
    )
    .await;

    let data = with_items(state, order).await?;
    Ok(ApiResponse::success("Payment recorded", data, None))
}

/// Customer withdrawal of a pending order. Stock and allowance are given back.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_own_order(&txn, user, id).await?;

    let current: OrderStatus = order.status.parse()?;
    current.cancel()?;
    let order = set_status(&txn, order, OrderStatus::Cancelled).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;
    tracing::info!(user_id = %user.user_id, order_id = %order.id, "order cancelled by customer");

    let data = with_items(state, order).await?;
    Ok(ApiResponse::success("Order cancelled", data, None))
}

/// Orders with at least one line from the caller's producer. Each order only
/// carries that producer's lines.
pub async fn list_producer_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<ProducerOrderList>> {
    let (page, limit, offset) = query.pagination().normalize()?;
    let producer_id = resolve_producer_scope(state, user).await?;

    let own_orders = Query::select()
        .column(OrderItemCol::OrderId)
        .from(OrderItems)
        .and_where(Expr::col(OrderItemCol::ProducerId).eq(producer_id))
        .to_owned();

    let mut condition = Condition::all().add(OrderCol::Id.in_subquery(own_orders));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut lines: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .filter(OrderItemCol::ProducerId.eq(producer_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
    {
        lines.entry(item.order_id).or_default().push(item.into());
    }

    let items = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: lines.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ProducerOrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_producer_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next: OrderStatus = payload.status.parse()?;
    let producer_id = resolve_producer_scope(state, user).await?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let own_lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .filter(OrderItemCol::ProducerId.eq(producer_id))
        .count(&txn)
        .await?;
    if own_lines == 0 {
        return Err(AppError::Forbidden(
            "Order does not contain any of your products".into(),
        ));
    }

    let order = transition(&txn, order, next).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status, "producer_id": producer_id }),
    )
    .await;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");

    Ok(ApiResponse::success("Order updated", order.into(), None))
}

/// Validate `current -> next` and persist it. Used by producer and admin updates.
pub async fn transition(
    txn: &DatabaseTransaction,
    order: OrderModel,
    next: OrderStatus,
) -> AppResult<OrderModel> {
    let current: OrderStatus = order.status.parse()?;
    let next = current.transition_to(next)?;
    set_status(txn, order, next).await
}

/// Persist a status change. Entering `cancelled` restores product stock and
/// gives the order weight back to the customer's allowance; `cancelled` is
/// terminal so this happens at most once per order.
async fn set_status(
    txn: &DatabaseTransaction,
    order: OrderModel,
    next: OrderStatus,
) -> AppResult<OrderModel> {
    if next == OrderStatus::Cancelled {
        release_order(txn, &order).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Lock order matches `create_order`: subscription row first, then products
/// by ascending id.
async fn release_order(txn: &DatabaseTransaction, order: &OrderModel) -> AppResult<()> {
    let subscription = lock_for_user(txn, order.user_id).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(txn)
        .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?;

    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(txn)
            .await?;
    }

    if let Some(subscription) = subscription {
        let used_kg = Allowance::new(subscription.limit_in_kg, subscription.used_kg)
            .release(order.total_weight_in_kg);
        let mut active: SubscriptionActive = subscription.into();
        active.used_kg = Set(used_kg);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
    }

    Ok(())
}

async fn lock_own_order(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn with_items(state: &AppState, order: OrderModel) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}
