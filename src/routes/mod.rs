use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod producers;
pub mod products;
pub mod subscriptions;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/producers", producers::router())
        .nest("/cart", cart::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/orders", orders::router())
        .nest("/admin", admin::router())
}
