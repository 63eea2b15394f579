mod common;

use farmbox_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, OrderWithItems, UpdateOrderStatusRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{admin_service, cart_service, order_service, subscription_service},
    state::AppState,
};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[tokio::test]
async fn order_creation_respects_the_subscription_limit() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        eprintln!("skipping order_creation_respects_the_subscription_limit: no database configured");
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let admin = common::create_user(&state, "admin", "admin").await?;
    let farmer = common::create_user(&state, "producer", "farmer").await?;
    let customer = common::create_user(&state, "customer", "customer").await?;
    let producer_id = common::create_producer(&state, &farmer, "Green Acres").await?;
    let carrots =
        common::create_product(&state, producer_id, "Carrots", "vegetables", 1.0, 10).await?;
    common::create_subscription(&state, &customer, "basic", 5.0, 4.0).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: carrots,
            quantity: 2,
        },
    )
    .await?;

    // limit 5, used 4, cart 2: rejected with the remaining capacity reported
    let err = order_service::create_order(&state, &customer, CreateOrderRequest::default())
        .await
        .expect_err("order above the limit must be rejected");
    match err {
        AppError::BadRequest(message) => {
            assert!(message.contains("1.00 kg remaining"), "message: {message}")
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }

    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 4.0);
    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.item_count, 1);
    assert_eq!(cart.total_weight_in_kg, 2.0);

    // new period, same cart: accepted
    admin_service::reset_subscription_usage(&state, &admin, customer.user_id).await?;
    let created = order_service::create_order(&state, &customer, CreateOrderRequest::default())
        .await?
        .data
        .expect("order");
    assert_eq!(created.order.status, "pending");
    assert_eq!(created.order.payment_status, "unpaid");
    assert_eq!(created.order.total_weight_in_kg, 2.0);
    assert_eq!(created.order.total_amount, 600);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].product_name, "Carrots");

    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 2.0);
    assert_eq!(subscription.remaining_kg, 3.0);

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.item_count, 0);
    assert_eq!(cart.total_weight_in_kg, 0.0);
    assert_eq!(cart.total_amount, 0);

    // an empty cart cannot become an order
    let err = order_service::create_order(&state, &customer, CreateOrderRequest::default())
        .await
        .expect_err("empty cart must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // cancelling a pending order gives the weight back
    let cancelled = order_service::cancel_order(&state, &customer, created.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.order.status, "cancelled");
    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 0.0);

    let err = order_service::cancel_order(&state, &customer, created.order.id)
        .await
        .expect_err("cancelled order cannot be cancelled again");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // without a subscription the cart fills but no order is placed
    let walk_in = common::create_user(&state, "customer", "walkin").await?;
    cart_service::add_to_cart(
        &state,
        &walk_in,
        AddToCartRequest {
            product_id: carrots,
            quantity: 1,
        },
    )
    .await?;
    let err = order_service::create_order(&state, &walk_in, CreateOrderRequest::default())
        .await
        .expect_err("order without subscription must be rejected");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    plan_categories_limit_the_cart(&state).await
}

async fn plan_categories_limit_the_cart(state: &AppState) -> anyhow::Result<()> {
    let farmer = common::create_user(state, "producer", "dairy").await?;
    let customer = common::create_user(state, "customer", "basic").await?;
    let producer_id = common::create_producer(state, &farmer, "Hill Dairy").await?;
    let milk = common::create_product(state, producer_id, "Milk", "dairy", 1.0, 5).await?;
    common::create_subscription(state, &customer, "basic", 5.0, 0.0).await?;

    let err = cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest {
            product_id: milk,
            quantity: 1,
        },
    )
    .await
    .expect_err("basic plan excludes dairy");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let err = cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest {
            product_id: milk,
            quantity: 6,
        },
    )
    .await
    .expect_err("more than the stock");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    Ok(())
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

fn spawn_create(state: &AppState, user: &AuthUser) -> JoinHandle<AppResult<ApiResponse<OrderWithItems>>> {
    let (state, user) = (state.clone(), user.clone());
    tokio::spawn(async move {
        order_service::create_order(&state, &user, CreateOrderRequest::default()).await
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_and_cancellations_serialize() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        eprintln!("skipping concurrent_orders_and_cancellations_serialize: no database configured");
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let admin = common::create_user(&state, "admin", "race-admin").await?;
    let farmer = common::create_user(&state, "producer", "race-farmer").await?;
    let producer_id = common::create_producer(&state, &farmer, "Race Farm").await?;
    let apples = common::create_product(&state, producer_id, "Apples", "fruits", 1.0, 100_000).await?;
    let pears = common::create_product(&state, producer_id, "Pears", "fruits", 0.5, 100_000).await?;

    // two orders from one cart and one allowance: exactly one goes through
    let customer = common::create_user(&state, "customer", "race-customer").await?;
    common::create_subscription(&state, &customer, "basic", 3.0, 0.0).await?;
    add(&state, &customer, apples, 2).await?;

    let first = spawn_create(&state, &customer);
    let second = spawn_create(&state, &customer);
    let results = [first.await?, second.await?];
    let placed = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(placed, 1, "results: {results:?}");
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
        }
    }
    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 2.0);

    // concurrent adds of one product leave a single line
    let adds: Vec<_> = (1..=4)
        .map(|quantity| {
            let (state, customer) = (state.clone(), customer.clone());
            tokio::spawn(async move { add(&state, &customer, pears, quantity).await })
        })
        .collect();
    for handle in adds {
        handle.await??;
    }
    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.item_count, 1);
    cart_service::clear_cart(&state, &customer).await?;

    // placing an order while the previous one is cancelled, same products
    let regular = common::create_user(&state, "customer", "race-regular").await?;
    common::create_subscription(&state, &regular, "premium", 20.0, 0.0).await?;
    add(&state, &regular, apples, 1).await?;
    add(&state, &regular, pears, 1).await?;
    let mut previous = order_service::create_order(&state, &regular, CreateOrderRequest::default())
        .await?
        .data
        .expect("order")
        .order
        .id;

    for _ in 0..25 {
        add(&state, &regular, apples, 1).await?;
        add(&state, &regular, pears, 1).await?;

        let create = spawn_create(&state, &regular);
        let cancel = {
            let (state, admin) = (state.clone(), admin.clone());
            tokio::spawn(async move {
                admin_service::update_order_status(
                    &state,
                    &admin,
                    previous,
                    UpdateOrderStatusRequest {
                        status: "cancelled".into(),
                    },
                )
                .await
            })
        };

        let created = create.await?.map_err(|err| anyhow::anyhow!("create failed: {err:?}"))?;
        cancel.await?.map_err(|err| anyhow::anyhow!("cancel failed: {err:?}"))?;
        previous = created.data.expect("order").order.id;
    }

    // one live order of 1.5 kg remains
    let subscription = subscription_service::get_my_subscription(&state, &regular)
        .await?
        .data
        .expect("subscription");
    assert!((subscription.used_kg - 1.5).abs() < 1e-9, "used {}", subscription.used_kg);

    Ok(())
}

#[tokio::test]
async fn order_total_overflow_is_rejected() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        eprintln!("skipping order_total_overflow_is_rejected: no database configured");
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let farmer = common::create_user(&state, "producer", "luxury-farmer").await?;
    let customer = common::create_user(&state, "customer", "luxury-customer").await?;
    let producer_id = common::create_producer(&state, &farmer, "Gilded Greens").await?;
    let truffle = common::create_priced_product(
        &state,
        producer_id,
        "Truffle",
        "vegetables",
        0.1,
        10,
        i64::MAX,
    )
    .await?;
    common::create_subscription(&state, &customer, "premium", 20.0, 0.0).await?;
    add(&state, &customer, truffle, 2).await?;

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.total_amount, i64::MAX);

    let err = order_service::create_order(&state, &customer, CreateOrderRequest::default())
        .await
        .expect_err("total does not fit");
    match err {
        AppError::BadRequest(message) => assert_eq!(message, "Order total is too large"),
        other => panic!("expected BadRequest, got {other:?}"),
    }

    let subscription = subscription_service::get_my_subscription(&state, &customer)
        .await?
        .data
        .expect("subscription");
    assert_eq!(subscription.used_kg, 0.0);

    Ok(())
}
