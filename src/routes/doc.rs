use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{category::Category, order_status::OrderStatus, plan::Plan, role::Role},
    dto::{
        admin::{DashboardStats, InventoryAdjustRequest, UpdateUserRoleRequest, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        orders::{
            CreateOrderRequest, OrderList, OrderWithItems, ProducerOrderList,
            UpdateOrderStatusRequest,
        },
        producers::{CreateProducerRequest, ProducerList},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        subscriptions::{PlanInfo, PlanList, SubscribeRequest, SubscriptionList},
    },
    models::{CartItem, Order, OrderItem, Producer, Product, Subscription, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, producers, products, subscriptions},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        producers::list_producers,
        producers::get_producer,
        producers::get_my_producer,
        producers::create_my_producer,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        subscriptions::list_plans,
        subscriptions::get_my_subscription,
        subscriptions::subscribe,
        subscriptions::cancel_subscription,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::pay_order,
        orders::cancel_order,
        orders::list_producer_orders,
        orders::update_producer_order_status,
        admin::dashboard,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::update_user_role,
        admin::list_subscriptions,
        admin::reset_subscription_usage,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Producer,
            Product,
            Subscription,
            CartItem,
            Order,
            OrderItem,
            Role,
            Plan,
            Category,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            ProducerOrderList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateProducerRequest,
            ProducerList,
            SubscribeRequest,
            PlanInfo,
            PlanList,
            SubscriptionList,
            UpdateUserRoleRequest,
            InventoryAdjustRequest,
            UserList,
            DashboardStats,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<Subscription>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProducerOrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Producers", description = "Producer profiles"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Subscriptions", description = "Plans and weight allowance"),
        (name = "Orders", description = "Customer and producer order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
