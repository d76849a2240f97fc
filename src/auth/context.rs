use super::Claims;
use crate::domain::suppliers::TenantRole;
use uuid::Uuid;

/// Authenticated user context extracted from JWT
/// This is attached to request extensions after successful auth
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from JWT sub claim)
    pub user_id: Uuid,

    /// User email if available
    pub email: Option<String>,

    /// Agency membership, for agency staff
    pub agency_id: Option<Uuid>,

    /// Tenant membership, for supplier-side users
    pub tenant_id: Option<Uuid>,

    /// Tenant role, parsed from the claim string
    pub tenant_role: Option<TenantRole>,

    /// Token issuer
    pub issuer: String,

    /// Token audience
    pub audience: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        let meta = claims.app_metadata.as_ref();
        let tenant_role = meta
            .and_then(|m| m.tenant_role.as_deref())
            .and_then(TenantRole::from_claim);

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            agency_id: meta.and_then(|m| m.agency_id),
            tenant_id: meta.and_then(|m| m.tenant_id),
            tenant_role,
            issuer: claims.iss.clone(),
            audience: claims.aud.clone(),
        })
    }

    /// Tenant scope for supplier-side callers; None for agency staff.
    pub fn tenant_scope(&self) -> Option<(Uuid, TenantRole)> {
        match (self.tenant_id, self.tenant_role) {
            (Some(tenant_id), Some(role)) => Some((tenant_id, role)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::AppMetadata;
    use crate::domain::suppliers::SupplierType;

    fn claims(sub: &str, metadata: Option<AppMetadata>) -> Claims {
        Claims {
            sub: sub.to_string(),
            aud: "tripforge".to_string(),
            iss: "https://auth.example.com".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            nbf: None,
            email: Some("user@example.com".to_string()),
            app_metadata: metadata,
        }
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let result = AuthContext::from_claims(&claims("not-a-uuid", None));
        assert!(result.is_err());
    }

    #[test]
    fn parses_supplier_membership() {
        let tenant_id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(&claims(
            &Uuid::new_v4().to_string(),
            Some(AppMetadata {
                agency_id: None,
                tenant_id: Some(tenant_id),
                tenant_role: Some("hotel".to_string()),
            }),
        ))
        .unwrap();

        assert_eq!(
            ctx.tenant_scope(),
            Some((tenant_id, TenantRole::Supplier(SupplierType::Hotel)))
        );
    }

    #[test]
    fn tenant_scope_requires_both_halves() {
        let ctx = AuthContext::from_claims(&claims(
            &Uuid::new_v4().to_string(),
            Some(AppMetadata {
                agency_id: None,
                tenant_id: Some(Uuid::new_v4()),
                tenant_role: None,
            }),
        ))
        .unwrap();

        assert_eq!(ctx.tenant_scope(), None);
    }

    #[test]
    fn unknown_role_string_is_ignored() {
        let ctx = AuthContext::from_claims(&claims(
            &Uuid::new_v4().to_string(),
            Some(AppMetadata {
                agency_id: None,
                tenant_id: Some(Uuid::new_v4()),
                tenant_role: Some("janitor".to_string()),
            }),
        ))
        .unwrap();

        assert_eq!(ctx.tenant_role, None);
        assert_eq!(ctx.tenant_scope(), None);
    }
}
