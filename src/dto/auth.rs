use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// New accounts are always customers; other roles are granted by an admin.
#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// At least 6 characters.
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Ready to use as the `Authorization` header value.
    pub token: String,
    pub user_id: Uuid,
    pub role: String,
    pub expires_in_hours: i64,
}

/// JWT payload. `sub` is the user id, `role` one of customer, employee,
/// producer or admin.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
