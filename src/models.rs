use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::allowance::{Allowance, Weighted},
    entity::{cart_items, order_items, orders, producers, products, subscriptions, users},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub producer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Producer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub weight_in_kg: f64,
    pub stock: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub limit_in_kg: f64,
    pub used_kg: f64,
    pub remaining_kg: f64,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub producer_id: Uuid,
    pub product_name: String,
    pub unit_weight_in_kg: f64,
    pub quantity: i32,
    pub weight_in_kg: f64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub total_weight_in_kg: f64,
    pub total_amount: i64,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub producer_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub weight_in_kg: f64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            producer_id: model.producer_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<producers::Model> for Producer {
    fn from(model: producers::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            location: model.location,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            producer_id: model.producer_id,
            name: model.name,
            description: model.description,
            category: model.category,
            price: model.price,
            weight_in_kg: model.weight_in_kg,
            stock: model.stock,
            is_available: model.is_available,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<subscriptions::Model> for Subscription {
    fn from(model: subscriptions::Model) -> Self {
        let remaining_kg = Allowance::new(model.limit_in_kg, model.used_kg).remaining_kg();
        Self {
            id: model.id,
            user_id: model.user_id,
            plan: model.plan,
            limit_in_kg: model.limit_in_kg,
            used_kg: model.used_kg,
            remaining_kg,
            is_active: model.is_active,
            started_at: model.started_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            producer_id: model.producer_id,
            product_name: model.product_name,
            unit_weight_in_kg: model.unit_weight_in_kg,
            quantity: model.quantity,
            weight_in_kg: model.weight_in_kg,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl Weighted for CartItem {
    fn weight_in_kg(&self) -> f64 {
        self.weight_in_kg
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            payment_status: model.payment_status,
            total_weight_in_kg: model.total_weight_in_kg,
            total_amount: model.total_amount,
            delivery_address: model.delivery_address,
            notes: model.notes,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            producer_id: model.producer_id,
            product_name: model.product_name,
            quantity: model.quantity,
            weight_in_kg: model.weight_in_kg,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
