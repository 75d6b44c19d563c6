//! Database repository for tenant management operations.
//!
//! Provides CRUD operations for tenants. RUT arguments are expected in
//! normalized form; normalization is the service layer's job.

use crate::{api::common::PaginationFilter, database::models::Tenant};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const TENANT_COLUMNS: &str = "id, name, rut, is_active, subscription_plan, settings, \
     created_at, updated_at, is_deleted, deleted_at";

/// Repository for tenant database operations.
pub struct TenantRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TenantRepository<'a> {
    /// Creates a new TenantRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a fully populated tenant row.
    ///
    /// # Returns
    /// The tenant as stored
    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant> {
        let sql = format!(
            "INSERT INTO tenants ({TENANT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {TENANT_COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, Tenant>(&sql)
            .bind(&tenant.id)
            .bind(&tenant.name)
            .bind(&tenant.rut)
            .bind(tenant.is_active)
            .bind(&tenant.subscription_plan)
            .bind(&tenant.settings)
            .bind(tenant.created_at)
            .bind(tenant.updated_at)
            .bind(tenant.is_deleted)
            .bind(tenant.deleted_at)
            .fetch_one(self.pool)
            .await?;

        Ok(tenant)
    }

    /// Retrieves a tenant by its unique identifier.
    ///
    /// # Returns
    /// `Some(Tenant)` if found and not deleted, `None` otherwise
    pub async fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ? AND is_deleted = 0");
        let tenant = sqlx::query_as::<_, Tenant>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(tenant)
    }

    /// Retrieves a tenant by its normalized RUT.
    pub async fn get_tenant_by_rut(&self, rut: &str) -> Result<Option<Tenant>> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE rut = ? AND is_deleted = 0");
        let tenant = sqlx::query_as::<_, Tenant>(&sql)
            .bind(rut)
            .fetch_optional(self.pool)
            .await?;

        Ok(tenant)
    }

    /// Lists tenants, newest first.
    pub async fn list_tenants(&self, pagination: &PaginationFilter) -> Result<Vec<Tenant>> {
        let sql = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE is_deleted = 0 \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let tenants = sqlx::query_as::<_, Tenant>(&sql)
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(self.pool)
            .await?;

        Ok(tenants)
    }

    /// Get total count of tenants
    pub async fn count_tenants(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE is_deleted = 0")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Checks if a normalized RUT is already registered.
    pub async fn rut_exists(&self, rut: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE rut = ? AND is_deleted = 0")
                .bind(rut)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if a normalized RUT belongs to any tenant other than `exclude_id`.
    pub async fn rut_exists_excluding(&self, rut: &str, exclude_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenants WHERE rut = ? AND id != ? AND is_deleted = 0",
        )
        .bind(rut)
        .bind(exclude_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Writes every mutable column of `tenant` and bumps `updated_at`.
    pub async fn update_tenant(&self, tenant: &Tenant) -> Result<Option<Tenant>> {
        let sql = format!(
            "UPDATE tenants SET name = ?, rut = ?, is_active = ?, subscription_plan = ?, \
             settings = ?, updated_at = ? WHERE id = ? AND is_deleted = 0 \
             RETURNING {TENANT_COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, Tenant>(&sql)
            .bind(&tenant.name)
            .bind(&tenant.rut)
            .bind(tenant.is_active)
            .bind(&tenant.subscription_plan)
            .bind(&tenant.settings)
            .bind(Utc::now())
            .bind(&tenant.id)
            .fetch_optional(self.pool)
            .await?;

        Ok(tenant)
    }

    /// Soft deletes a tenant.
    ///
    /// # Returns
    /// `true` if a live tenant was deleted
    pub async fn delete_tenant(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE tenants SET is_deleted = 1, deleted_at = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
