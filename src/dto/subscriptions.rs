use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{category::Category, plan::Plan},
    models::Subscription,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub plan: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanInfo {
    pub plan: Plan,
    pub limit_in_kg: f64,
    pub allowed_categories: Vec<Category>,
}

impl From<Plan> for PlanInfo {
    fn from(plan: Plan) -> Self {
        Self {
            plan,
            limit_in_kg: plan.limit_in_kg(),
            allowed_categories: plan.allowed_categories().to_vec(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PlanList {
    #[schema(value_type = Vec<PlanInfo>)]
    pub items: Vec<PlanInfo>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct SubscriptionList {
    #[schema(value_type = Vec<Subscription>)]
    pub items: Vec<Subscription>,
}
