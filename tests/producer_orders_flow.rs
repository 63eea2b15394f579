mod common;

use farmbox_api::{
    dto::{
        admin::UpdateUserRoleRequest,
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, UpdateOrderStatusRequest},
    },
    error::AppError,
    routes::params::OrderListQuery,
    services::{admin_service, cart_service, order_service, subscription_service},
};

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.to_string(),
    }
}

#[tokio::test]
async fn producers_only_touch_orders_with_their_products() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        eprintln!("skipping producers_only_touch_orders_with_their_products: no database configured");
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let admin = common::create_user(&state, "admin", "admin").await?;
    let farmer = common::create_user(&state, "producer", "farmer").await?;
    let baker = common::create_user(&state, "producer", "baker").await?;
    let butcher = common::create_user(&state, "producer", "butcher").await?;
    let helper = common::create_user(&state, "employee", "helper").await?;
    let customer = common::create_user(&state, "customer", "customer").await?;

    let farm_id = common::create_producer(&state, &farmer, "Green Acres").await?;
    let bakery_id = common::create_producer(&state, &baker, "Stone Oven").await?;
    common::create_producer(&state, &butcher, "Prime Cuts").await?;
    common::assign_employee(&state, &helper, farm_id).await?;

    let apples = common::create_product(&state, farm_id, "Apples", "fruits", 1.5, 10).await?;
    let bread = common::create_product(&state, bakery_id, "Rye loaf", "bakery", 0.5, 10).await?;
    common::create_subscription(&state, &customer, "premium", 20.0, 0.0).await?;

    for (product_id, quantity) in [(apples, 2), (bread, 1)] {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest {
                product_id,
                quantity,
            },
        )
        .await?;
    }
    let order = order_service::create_order(&state, &customer, CreateOrderRequest::default())
        .await?
        .data
        .expect("order");
    let order_id = order.order.id;
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.order.total_weight_in_kg, 3.5);

    // each producer sees the order with only their own lines
    let listed = order_service::list_producer_orders(&state, &farmer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].items.len(), 1);
    assert_eq!(listed.items[0].items[0].product_name, "Apples");

    let listed = order_service::list_producer_orders(&state, &butcher, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert!(listed.items.is_empty());

    let err = order_service::update_producer_order_status(&state, &butcher, order_id, status("confirmed"))
        .await
        .expect_err("producer without lines in the order");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let err = order_service::update_producer_order_status(&state, &farmer, order_id, status("shipped"))
        .await
        .expect_err("status outside the whitelist");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let updated = order_service::update_producer_order_status(&state, &farmer, order_id, status("confirmed"))
        .await?
        .data
        .expect("order");
    assert_eq!(updated.status, "confirmed");

    // employees act within their producer's scope
    let listed = order_service::list_producer_orders(&state, &helper, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(listed.items.len(), 1);
    let updated = order_service::update_producer_order_status(&state, &helper, order_id, status("preparing"))
        .await?
        .data
        .expect("order");
    assert_eq!(updated.status, "preparing");

    // the customer can no longer withdraw once it left pending
    let err = order_service::cancel_order(&state, &customer, order_id)
        .await
        .expect_err("only pending orders can be cancelled by the customer");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // cancelled is final and releases the allowance
    admin_service::update_order_status(&state, &admin, order_id, status("cancelled")).await?;
    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 0.0);

    let err = order_service::update_producer_order_status(&state, &baker, order_id, status("ready"))
        .await
        .expect_err("cancelled orders are terminal");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = order_service::update_producer_order_status(&state, &customer, order_id, status("ready"))
        .await
        .expect_err("customers have no producer scope");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    // a demoted producer loses the scope while the old token is still valid
    admin_service::update_user_role(
        &state,
        &admin,
        farmer.user_id,
        UpdateUserRoleRequest {
            role: "customer".into(),
            producer_id: None,
        },
    )
    .await?;
    assert_eq!(farmer.role, "producer");
    let err = order_service::list_producer_orders(&state, &farmer, OrderListQuery::default())
        .await
        .expect_err("role in the token is stale");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    Ok(())
}
