use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub agency_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub tenant_role: Option<String>,
    pub issuer: String,
    pub audience: String,
}

/// Get current authenticated user info
pub async fn get_me(auth: RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user_id,
        email: auth.email.clone(),
        agency_id: auth.agency_id,
        tenant_id: auth.tenant_id,
        tenant_role: auth.tenant_role.map(|r| r.as_claim().to_string()),
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
    })
}
