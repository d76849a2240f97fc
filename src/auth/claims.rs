use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure for auth collaborator tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp) - optional
    #[serde(default)]
    pub nbf: Option<i64>,

    /// User email - optional
    #[serde(default)]
    pub email: Option<String>,

    /// Marketplace context resolved by the auth collaborator - optional
    #[serde(default)]
    pub app_metadata: Option<AppMetadata>,
}

/// Resolved marketplace membership carried in the token.
///
/// Agency staff carry `agency_id`; supplier-side users carry `tenant_id` plus
/// a `tenant_role` string (`admin` or a supplier type). A token never needs
/// both, but nothing here forbids it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppMetadata {
    #[serde(default)]
    pub agency_id: Option<Uuid>,

    #[serde(default)]
    pub tenant_id: Option<Uuid>,

    #[serde(default)]
    pub tenant_role: Option<String>,
}
