use farmbox_api::{
    domain::{
        ParseError,
        allowance::{Allowance, AllowanceError, total_weight_in_kg},
        category::Category,
        order_status::{OrderStatus, StatusError},
        plan::Plan,
        role::Role,
    },
    dto::cart::CartView,
    models::CartItem,
    routes::params::Pagination,
    services::cart_service::cart_view,
};
use chrono::Utc;
use uuid::Uuid;

fn line(unit_weight: f64, quantity: i32, price: i64) -> CartItem {
    CartItem {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        producer_id: Uuid::new_v4(),
        product_name: "Carrots".into(),
        unit_weight_in_kg: unit_weight,
        quantity,
        weight_in_kg: unit_weight * f64::from(quantity),
        price,
        created_at: Utc::now(),
    }
}

#[test]
fn cart_weight_is_sum_of_line_weights() {
    let items = vec![line(1.0, 2, 100), line(0.25, 3, 50), line(1.5, 1, 10)];
    assert_eq!(total_weight_in_kg(&items), 2.0 + 0.75 + 1.5);

    let empty: Vec<CartItem> = Vec::new();
    assert_eq!(total_weight_in_kg(&empty), 0.0);
}

#[test]
fn cart_view_reports_totals() {
    let CartView {
        items,
        item_count,
        total_weight_in_kg,
        total_amount,
    } = cart_view(vec![line(1.0, 2, 100), line(0.5, 4, 25)]);

    assert_eq!(items.len(), 2);
    assert_eq!(item_count, 2);
    assert_eq!(total_weight_in_kg, 4.0);
    assert_eq!(total_amount, 300);

    let empty = cart_view(Vec::new());
    assert_eq!(empty.item_count, 0);
    assert_eq!(empty.total_weight_in_kg, 0.0);
}

#[test]
fn order_over_limit_reports_remaining_capacity() {
    let allowance = Allowance::new(5.0, 4.0);
    let err = allowance.reserve(2.0).unwrap_err();

    assert_eq!(
        err,
        AllowanceError::Exceeded {
            remaining_kg: 1.0,
            requested_kg: 2.0
        }
    );
    assert!(err.to_string().contains("1.00 kg remaining"));
}

#[test]
fn order_within_limit_adds_exact_weight() {
    assert_eq!(Allowance::new(5.0, 4.0).reserve(1.0), Ok(5.0));
    assert_eq!(Allowance::new(10.0, 2.5).reserve(3.25), Ok(5.75));
    assert_eq!(Allowance::new(5.0, 0.0).reserve(0.0), Ok(0.0));
}

#[test]
fn float_noise_does_not_reject_exact_fit() {
    let weights = [0.1, 0.2];
    let total = total_weight_in_kg(&weights);
    let used = Allowance::new(0.3, 0.0).reserve(total).expect("fits");
    assert!(used <= 0.3);
}

#[test]
fn invalid_weights_are_rejected() {
    let allowance = Allowance::new(5.0, 0.0);
    assert!(matches!(
        allowance.reserve(-1.0),
        Err(AllowanceError::InvalidWeight(_))
    ));
    assert!(matches!(
        allowance.reserve(f64::NAN),
        Err(AllowanceError::InvalidWeight(_))
    ));
}

#[test]
fn remaining_and_release_never_go_negative() {
    assert_eq!(Allowance::new(5.0, 7.0).remaining_kg(), 0.0);
    assert_eq!(Allowance::new(5.0, 1.0).release(3.0), 0.0);
    assert_eq!(Allowance::new(5.0, 4.0).release(1.5), 2.5);
}

#[test]
fn status_whitelist_is_fixed() {
    for status in ["pending", "confirmed", "preparing", "ready", "delivered", "cancelled"] {
        let parsed: OrderStatus = status.parse().expect("whitelisted");
        assert_eq!(parsed.as_str(), status);
    }

    for status in ["shipped", "paid", "PENDING", ""] {
        assert_eq!(
            status.parse::<OrderStatus>(),
            Err(StatusError::Invalid(status.to_string()))
        );
    }
}

#[test]
fn cancelled_is_terminal() {
    assert_eq!(
        OrderStatus::Cancelled.transition_to(OrderStatus::Pending),
        Err(StatusError::Terminal(OrderStatus::Cancelled))
    );
    assert_eq!(
        OrderStatus::Delivered.transition_to(OrderStatus::Cancelled),
        Ok(OrderStatus::Cancelled)
    );
    assert_eq!(
        OrderStatus::Pending.transition_to(OrderStatus::Ready),
        Ok(OrderStatus::Ready)
    );
}

#[test]
fn only_pending_orders_can_be_withdrawn() {
    assert_eq!(OrderStatus::Pending.cancel(), Ok(OrderStatus::Cancelled));
    assert_eq!(
        OrderStatus::Preparing.cancel(),
        Err(StatusError::NotCancellable(OrderStatus::Preparing))
    );
}

#[test]
fn plans_fix_limits_and_categories() {
    assert_eq!(Plan::Basic.limit_in_kg(), 5.0);
    assert_eq!(Plan::Standard.limit_in_kg(), 10.0);
    assert_eq!(Plan::Premium.limit_in_kg(), 20.0);

    assert!(Plan::Basic.allows(Category::Fruits));
    assert!(!Plan::Basic.allows(Category::Dairy));
    assert!(Plan::Standard.allows(Category::Bakery));
    assert!(!Plan::Standard.allows(Category::Meat));
    assert!(Category::ALL.iter().all(|c| Plan::Premium.allows(*c)));

    assert_eq!("premium".parse::<Plan>(), Ok(Plan::Premium));
    assert_eq!("gold".parse::<Plan>(), Err(ParseError::Plan("gold".into())));
}

#[test]
fn roles_and_categories_parse() {
    assert_eq!("employee".parse::<Role>(), Ok(Role::Employee));
    assert_eq!("root".parse::<Role>(), Err(ParseError::Role("root".into())));
    assert_eq!("dairy".parse::<Category>(), Ok(Category::Dairy));
    assert!("toys".parse::<Category>().is_err());
}

#[test]
fn pagination_defaults_clamps_and_rejects_overflow() {
    let defaults = Pagination::default().normalize().expect("defaults");
    assert_eq!(defaults, (1, 20, 0));

    let clamped = Pagination {
        page: Some(0),
        per_page: Some(1_000),
    }
    .normalize()
    .expect("clamped");
    assert_eq!(clamped, (1, 100, 0));

    let third = Pagination {
        page: Some(3),
        per_page: Some(10),
    }
    .normalize()
    .expect("third page");
    assert_eq!(third, (3, 10, 20));

    let huge = Pagination {
        page: Some(i64::MAX),
        per_page: Some(100),
    };
    assert!(huge.normalize().is_err());
}

#[test]
fn cart_total_saturates_instead_of_overflowing() {
    let view = cart_view(vec![line(0.5, 2, i64::MAX), line(0.5, 1, 10)]);
    assert_eq!(view.total_amount, i64::MAX);
    assert_eq!(view.total_weight_in_kg, 1.5);
}
