use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use crate::{
    audit,
    domain::{allowance::total_weight_in_kg, category::Category},
    dto::cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::subscription_service::active_plan,
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items: Vec<CartItem> = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

    Ok(ApiResponse::success("OK", cart_view(items), None))
}

pub fn cart_view(items: Vec<CartItem>) -> CartView {
    let total_weight_in_kg = total_weight_in_kg(&items);
    // Display only; order creation does the checked total.
    let total_amount = items.iter().fold(0i64, |total, item| {
        total.saturating_add(item.price.saturating_mul(i64::from(item.quantity)))
    });
    CartView {
        item_count: items.len(),
        total_weight_in_kg,
        total_amount,
        items,
    }
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let product = validate_line(state, user, payload.product_id, payload.quantity).await?;

    let mut active = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product.id),
        created_at: NotSet,
        ..Default::default()
    };
    apply_line(&mut active, &product, payload.quantity);

    // One statement, so concurrent adds of the same product replace the line
    // instead of tripping the (user_id, product_id) unique key.
    let item = CartItems::insert(active)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                .update_columns([
                    CartCol::ProducerId,
                    CartCol::ProductName,
                    CartCol::UnitWeightInKg,
                    CartCol::Quantity,
                    CartCol::WeightInKg,
                    CartCol::Price,
                ])
                .to_owned(),
        )
        .exec_with_returning(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", item.into(), None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let product = validate_line(state, user, product_id, payload.quantity).await?;

    let mut active: CartActive = existing.into();
    apply_line(&mut active, &product, payload.quantity);
    let item = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Cart updated", item.into(), None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        None,
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartView>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success("Cart cleared", cart_view(Vec::new()), None))
}

/// Checks shared by add and update: quantity, availability, stock and the
/// category permissions of the caller's plan.
async fn validate_line(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ProductModel> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !product.is_available {
        return Err(AppError::BadRequest(format!(
            "{} is not available",
            product.name
        )));
    }
    if product.stock < quantity {
        return Err(AppError::BadRequest(format!(
            "Only {} of {} in stock",
            product.stock, product.name
        )));
    }

    if let Some(plan) = active_plan(&state.orm, user.user_id).await? {
        let category: Category = product.category.parse()?;
        if !plan.allows(category) {
            return Err(AppError::Forbidden(format!(
                "The {plan} plan does not include {category}"
            )));
        }
    }

    Ok(product)
}

fn apply_line(active: &mut CartActive, product: &ProductModel, quantity: i32) {
    active.producer_id = Set(product.producer_id);
    active.product_name = Set(product.name.clone());
    active.unit_weight_in_kg = Set(product.weight_in_kg);
    active.quantity = Set(quantity);
    active.weight_in_kg = Set(product.weight_in_kg * f64::from(quantity));
    active.price = Set(product.price);
}
