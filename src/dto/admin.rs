use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRoleRequest {
    pub role: String,
    /// Producer an employee works for. Required for `employee`.
    pub producer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub users_by_role: BTreeMap<String, i64>,
    pub orders_by_status: BTreeMap<String, i64>,
    pub active_subscriptions: i64,
    pub total_ordered_kg: f64,
    pub total_delivered_kg: f64,
    pub total_revenue: i64,
}
