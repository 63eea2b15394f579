pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod producers;
pub mod products;
pub mod subscriptions;
