//! Read side of the supplier catalog.
//!
//! Catalog CRUD belongs to an external collaborator; the workflow only lists
//! and resolves suppliers here. Directory lookups go through the cache since
//! segmentation fans out over them on every quote request.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::suppliers::{Supplier, SupplierType};
use crate::services::cache::{self, RedisCache};

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    tenant_id: Uuid,
    supplier_type: String,
    name: String,
    contact_email: Option<String>,
    owner_profile_id: Option<Uuid>,
    active: bool,
}

fn row_to_supplier(row: SupplierRow) -> Option<Supplier> {
    let Some(supplier_type) = SupplierType::parse(&row.supplier_type) else {
        tracing::warn!(
            supplier_id = %row.id,
            supplier_type = %row.supplier_type,
            "Skipping supplier with unknown type"
        );
        return None;
    };

    Some(Supplier {
        id: row.id,
        tenant_id: row.tenant_id,
        supplier_type,
        name: row.name,
        contact_email: row.contact_email,
        owner_profile_id: row.owner_profile_id,
        active: row.active,
    })
}

/// Active suppliers of one type in a tenant, read through the cache.
pub async fn suppliers_of_type(
    db: &PgPool,
    cache: &RedisCache,
    tenant_id: Uuid,
    supplier_type: SupplierType,
) -> Result<Vec<Supplier>, sqlx::Error> {
    let key = cache::keys::supplier_directory(tenant_id, supplier_type);
    if let Some(cached) = cache.get::<Vec<Supplier>>(&key).await {
        return Ok(cached);
    }

    let rows = sqlx::query_as::<_, SupplierRow>(
        r#"
        SELECT id, tenant_id, supplier_type, name, contact_email, owner_profile_id, active
        FROM suppliers
        WHERE tenant_id = $1 AND supplier_type = $2 AND active
        ORDER BY name
        "#,
    )
    .bind(tenant_id)
    .bind(supplier_type.as_str())
    .fetch_all(db)
    .await?;

    let suppliers: Vec<Supplier> = rows.into_iter().filter_map(row_to_supplier).collect();

    if let Err(e) = cache.set(&key, &suppliers).await {
        tracing::warn!(error = %e, tenant_id = %tenant_id, "Failed to cache supplier directory");
    }

    Ok(suppliers)
}

/// Resolve a batch of suppliers by id, uncached for the same reason as
/// [`supplier_by_id`].
pub async fn suppliers_by_ids(
    db: &PgPool,
    supplier_ids: &[Uuid],
) -> Result<Vec<Supplier>, sqlx::Error> {
    if supplier_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, SupplierRow>(
        r#"
        SELECT id, tenant_id, supplier_type, name, contact_email, owner_profile_id, active
        FROM suppliers
        WHERE id = ANY($1)
        "#,
    )
    .bind(supplier_ids)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().filter_map(row_to_supplier).collect())
}

/// Resolve one supplier by id. Goes straight to the store: ownership checks
/// hang off this row, so it must not be served stale.
pub async fn supplier_by_id(
    db: &PgPool,
    supplier_id: Uuid,
) -> Result<Option<Supplier>, sqlx::Error> {
    let row = sqlx::query_as::<_, SupplierRow>(
        r#"
        SELECT id, tenant_id, supplier_type, name, contact_email, owner_profile_id, active
        FROM suppliers
        WHERE id = $1
        "#,
    )
    .bind(supplier_id)
    .fetch_optional(db)
    .await?;

    Ok(row.and_then(row_to_supplier))
}
