use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Producer;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProducerRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProducerList {
    #[schema(value_type = Vec<Producer>)]
    pub items: Vec<Producer>,
}
