mod common;

use farmbox_api::{
    dto::admin::InventoryAdjustRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};
use uuid::Uuid;

async fn adjust(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    delta: i32,
) -> AppResult<ApiResponse<Product>> {
    admin_service::adjust_inventory(state, user, product_id, InventoryAdjustRequest { delta }).await
}

#[tokio::test]
async fn inventory_adjustments_stay_in_range() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        eprintln!("skipping inventory_adjustments_stay_in_range: no database configured");
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let admin = common::create_user(&state, "admin", "stock-admin").await?;
    let farmer = common::create_user(&state, "producer", "stock-farmer").await?;
    let producer_id = common::create_producer(&state, &farmer, "Stock Farm").await?;
    let beans = common::create_product(&state, producer_id, "Beans", "vegetables", 0.5, 10).await?;

    let err = adjust(&state, &admin, beans, i32::MAX).await.expect_err("stock would overflow");
    match err {
        AppError::BadRequest(message) => assert_eq!(message, "stock adjustment is out of range"),
        other => panic!("expected BadRequest, got {other:?}"),
    }

    let err = adjust(&state, &admin, beans, -11).await.expect_err("stock would go negative");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = adjust(&state, &admin, beans, 0).await.expect_err("zero delta");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let product = adjust(&state, &admin, beans, -4).await?.data.expect("product");
    assert_eq!(product.stock, 6);

    let err = adjust(&state, &farmer, beans, 1)
        .await
        .expect_err("admins only");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    Ok(())
}
