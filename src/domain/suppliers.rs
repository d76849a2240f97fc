use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supplier category in the tenant catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Transport,
    Hotel,
    Guide,
    Sight,
}

impl SupplierType {
    pub const ALL: [SupplierType; 4] = [Self::Transport, Self::Hotel, Self::Guide, Self::Sight];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Hotel => "hotel",
            Self::Guide => "guide",
            Self::Sight => "sight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transport" => Some(Self::Transport),
            "hotel" => Some(Self::Hotel),
            "guide" => Some(Self::Guide),
            "sight" => Some(Self::Sight),
            _ => None,
        }
    }
}

/// Marketplace role a supplier-side user holds inside a tenant.
/// Parsed from the `tenant_role` claim string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantRole {
    Admin,
    Supplier(SupplierType),
}

impl TenantRole {
    pub fn from_claim(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            other => SupplierType::parse(other).map(Self::Supplier),
        }
    }

    /// The claim string this role round-trips through.
    pub fn as_claim(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supplier(t) => t.as_str(),
        }
    }

    /// Whether this role may act for suppliers of the given type.
    pub fn covers(&self, supplier_type: SupplierType) -> bool {
        match self {
            Self::Admin => true,
            Self::Supplier(t) => *t == supplier_type,
        }
    }
}

/// Supplier catalog entry. Catalog CRUD belongs to an external collaborator;
/// this service only reads these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_type: SupplierType,
    pub name: String,
    pub contact_email: Option<String>,
    pub owner_profile_id: Option<Uuid>,
    pub active: bool,
}

impl Supplier {
    pub fn ownership(&self) -> SupplierOwnership {
        match self.owner_profile_id {
            Some(owner) => SupplierOwnership::ExclusiveOwner(owner),
            None => SupplierOwnership::TenantRolePool,
        }
    }
}

/// Who may act for a supplier when quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierOwnership {
    /// The catalog row names an owning profile; only that user may act.
    ExclusiveOwner(Uuid),
    /// Legacy rows without an owner; any matching tenant role holder may act.
    TenantRolePool,
}

impl SupplierOwnership {
    /// Check whether a caller may act for a supplier of the given tenant and
    /// type. `tenant_scope` is the caller's resolved `(tenant, role)` pair,
    /// absent for agency staff.
    pub fn permits(
        &self,
        supplier_tenant: Uuid,
        supplier_type: SupplierType,
        user_id: Uuid,
        tenant_scope: Option<(Uuid, TenantRole)>,
    ) -> bool {
        match self {
            Self::ExclusiveOwner(owner) => *owner == user_id,
            Self::TenantRolePool => match tenant_scope {
                Some((tenant_id, role)) => {
                    tenant_id == supplier_tenant && role.covers(supplier_type)
                }
                None => false,
            },
        }
    }
}

/// Pool-arm bindings for supplier-facing reads: the tenant whose pooled
/// suppliers the caller may act for, and the types their role covers. A
/// caller without a tenant role matches no pool rows; rows owned by their
/// profile still match through the owner arm.
pub fn pool_visibility(
    tenant_scope: Option<(Uuid, TenantRole)>,
) -> (Option<Uuid>, Vec<SupplierType>) {
    match tenant_scope {
        Some((tenant_id, role)) => (
            Some(tenant_id),
            SupplierType::ALL
                .into_iter()
                .filter(|t| role.covers(*t))
                .collect(),
        ),
        None => (None, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier(owner: Option<Uuid>) -> Supplier {
        Supplier {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            supplier_type: SupplierType::Transport,
            name: "Altai Wheels".into(),
            contact_email: None,
            owner_profile_id: owner,
            active: true,
        }
    }

    #[test]
    fn exclusive_owner_admits_only_the_owner() {
        let owner = Uuid::new_v4();
        let s = supplier(Some(owner));
        let ownership = s.ownership();

        assert!(ownership.permits(s.tenant_id, s.supplier_type, owner, None));

        let stranger = Uuid::new_v4();
        assert!(!ownership.permits(s.tenant_id, s.supplier_type, stranger, None));
        // A matching tenant role does not override an explicit owner.
        assert!(!ownership.permits(
            s.tenant_id,
            s.supplier_type,
            stranger,
            Some((s.tenant_id, TenantRole::Supplier(SupplierType::Transport))),
        ));
    }

    #[test]
    fn pool_admits_matching_tenant_role_only() {
        let s = supplier(None);
        let ownership = s.ownership();
        let user = Uuid::new_v4();

        assert!(ownership.permits(
            s.tenant_id,
            SupplierType::Transport,
            user,
            Some((s.tenant_id, TenantRole::Supplier(SupplierType::Transport))),
        ));
        // Wrong role for the supplier type.
        assert!(!ownership.permits(
            s.tenant_id,
            SupplierType::Transport,
            user,
            Some((s.tenant_id, TenantRole::Supplier(SupplierType::Hotel))),
        ));
        // Right role, wrong tenant.
        assert!(!ownership.permits(
            s.tenant_id,
            SupplierType::Transport,
            user,
            Some((Uuid::new_v4(), TenantRole::Supplier(SupplierType::Transport))),
        ));
        // No tenant scope at all.
        assert!(!ownership.permits(s.tenant_id, SupplierType::Transport, user, None));
    }

    #[test]
    fn admin_role_covers_every_supplier_type() {
        let s = supplier(None);
        let user = Uuid::new_v4();

        for supplier_type in SupplierType::ALL {
            assert!(s.ownership().permits(
                s.tenant_id,
                supplier_type,
                user,
                Some((s.tenant_id, TenantRole::Admin)),
            ));
        }
    }

    #[test]
    fn pool_visibility_without_a_role_matches_nothing() {
        let (tenant, types) = pool_visibility(None);
        assert_eq!(tenant, None);
        assert!(types.is_empty());
    }

    #[test]
    fn pool_visibility_narrows_to_the_covered_types() {
        let tenant_id = Uuid::new_v4();

        let (tenant, types) =
            pool_visibility(Some((tenant_id, TenantRole::Supplier(SupplierType::Guide))));
        assert_eq!(tenant, Some(tenant_id));
        assert_eq!(types, vec![SupplierType::Guide]);

        let (_, types) = pool_visibility(Some((tenant_id, TenantRole::Admin)));
        assert_eq!(types, SupplierType::ALL.to_vec());
    }

    #[test]
    fn tenant_role_parses_admin_and_supplier_types() {
        assert_eq!(TenantRole::from_claim("admin"), Some(TenantRole::Admin));
        assert_eq!(
            TenantRole::from_claim("hotel"),
            Some(TenantRole::Supplier(SupplierType::Hotel))
        );
        assert_eq!(TenantRole::from_claim("accountant"), None);
    }

    #[test]
    fn supplier_type_round_trips_column_encoding() {
        for supplier_type in SupplierType::ALL {
            assert_eq!(
                SupplierType::parse(supplier_type.as_str()),
                Some(supplier_type)
            );
        }
        assert_eq!(SupplierType::parse("camel"), None);
    }
}
