use uuid::Uuid;

use crate::{
    audit,
    domain::{category::Category, role::Role},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        producers::Entity as Producers,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_any_role},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::producer_service::resolve_producer_scope,
    state::AppState,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize()?;
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category: Category = category.parse()?;
        condition = condition.add(Column::Category.eq(category.as_str()));
    }

    if let Some(producer_id) = query.producer_id {
        condition = condition.add(Column::ProducerId.eq(producer_id));
    }

    if query.available_only.unwrap_or(false) {
        condition = condition
            .add(Column::IsAvailable.eq(true))
            .add(Column::Stock.gt(0));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Weight => Column::WeightInKg,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

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
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_any_role(user, &[Role::Producer, Role::Admin])?;

    let producer_id = if user.has_role(Role::Admin) {
        let producer_id = payload
            .producer_id
            .ok_or_else(|| AppError::BadRequest("producer_id is required".into()))?;
        Producers::find_by_id(producer_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::BadRequest("producer not found".into()))?;
        producer_id
    } else {
        resolve_producer_scope(state, user).await?
    };

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let category: Category = payload.category.parse()?;
    validate_numbers(Some(payload.price), Some(payload.weight_in_kg), Some(payload.stock))?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        producer_id: Set(producer_id),
        name: Set(name),
        description: Set(payload.description),
        category: Set(category.as_str().to_string()),
        price: Set(payload.price),
        weight_in_kg: Set(payload.weight_in_kg),
        stock: Set(payload.stock),
        is_available: Set(payload.is_available.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "producer_id": producer_id }),
    )
    .await;

    Ok(ApiResponse::success("Product created", product.into(), None))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = owned_product(state, user, id).await?;
    validate_numbers(payload.price, payload.weight_in_kg, payload.stock)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        let category: Category = category.parse()?;
        active.category = Set(category.as_str().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(weight_in_kg) = payload.weight_in_kg {
        active.weight_in_kg = Set(weight_in_kg);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", product.into(), None))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    owned_product(state, user, id).await?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Deleted", serde_json::json!({}), None))
}

/// Load a product the caller may modify: any product for admins, only their
/// own catalog for producers.
async fn owned_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ProductModel> {
    ensure_any_role(user, &[Role::Producer, Role::Admin])?;
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.has_role(Role::Admin) {
        let producer_id = resolve_producer_scope(state, user).await?;
        if product.producer_id != producer_id {
            return Err(AppError::Forbidden("Product belongs to another producer".into()));
        }
    }
    Ok(product)
}

fn validate_numbers(price: Option<i64>, weight_in_kg: Option<f64>, stock: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if weight_in_kg.is_some_and(|w| !w.is_finite() || w <= 0.0) {
        return Err(AppError::BadRequest("weight_in_kg must be greater than 0".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}
