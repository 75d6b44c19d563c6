//! Tenant business logic service.
//!
//! Validates tenant payloads, keeps RUTs normalized and unique, and wraps
//! the repository's soft-delete semantics.

use crate::api::common::PaginationFilter;
use crate::database::models::{CreateTenant, Tenant, UpdateTenant};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::tenant_repository::TenantRepository;
use crate::utils::rut;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

/// Service layer for tenant operations.
pub struct TenantService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> TenantService<'a> {
    /// Creates a new TenantService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new tenant.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures (including an invalid RUT check digit)
    /// - A RUT already registered to another tenant
    pub async fn create_tenant(&self, create_tenant: CreateTenant) -> ServiceResult<Tenant> {
        if let Err(validation_errors) = create_tenant.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let repo = TenantRepository::new(self.pool);
        let rut = rut::normalize(&create_tenant.rut);

        if repo.rut_exists(&rut).await? {
            return Err(ServiceError::already_exists("Tenant", rut));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::now_v7().to_string(),
            name: create_tenant.name.trim().to_string(),
            rut,
            is_active: create_tenant.is_active,
            subscription_plan: create_tenant.subscription_plan,
            settings: create_tenant.settings.map(Json),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };

        let tenant = repo
            .create_tenant(&tenant)
            .await
            .map_err(|e| ServiceError::from_write_error(e, "Tenant", &tenant.rut))?;
        tracing::info!("Created tenant {} ({})", tenant.id, tenant.rut);
        Ok(tenant)
    }

    /// Retrieves a tenant by ID, failing with `NotFound` when absent.
    pub async fn get_tenant_required(&self, id: &str) -> ServiceResult<Tenant> {
        TenantRepository::new(self.pool)
            .get_tenant_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", id))
    }

    /// Retrieves a tenant by RUT in any punctuation or case.
    pub async fn get_tenant_by_rut(&self, raw_rut: &str) -> ServiceResult<Tenant> {
        let rut = rut::normalize(raw_rut);
        TenantRepository::new(self.pool)
            .get_tenant_by_rut(&rut)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", rut))
    }

    /// Lists one page of tenants together with the total count.
    pub async fn list_tenants(
        &self,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Tenant>, u64)> {
        if let Err(validation_errors) = pagination.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let repo = TenantRepository::new(self.pool);
        let tenants = repo.list_tenants(pagination).await?;
        let total = repo.count_tenants().await?;
        Ok((tenants, total))
    }

    /// Applies a partial update. Only fields present in `update` change.
    pub async fn update_tenant(&self, id: &str, update: UpdateTenant) -> ServiceResult<Tenant> {
        if let Err(validation_errors) = update.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let repo = TenantRepository::new(self.pool);
        let mut tenant = self.get_tenant_required(id).await?;

        if let Some(raw_rut) = update.rut {
            let rut = rut::normalize(&raw_rut);
            if repo.rut_exists_excluding(&rut, id).await? {
                return Err(ServiceError::already_exists("Tenant", rut));
            }
            tenant.rut = rut;
        }
        if let Some(name) = update.name {
            tenant.name = name.trim().to_string();
        }
        if let Some(is_active) = update.is_active {
            tenant.is_active = is_active;
        }
        if let Some(plan) = update.subscription_plan {
            tenant.subscription_plan = Some(plan);
        }
        if let Some(settings) = update.settings {
            tenant.settings = Some(Json(settings));
        }

        repo.update_tenant(&tenant)
            .await
            .map_err(|e| ServiceError::from_write_error(e, "Tenant", &tenant.rut))?
            .ok_or_else(|| ServiceError::not_found("Tenant", id))
    }

    /// Soft deletes a tenant and returns its last state.
    pub async fn delete_tenant(&self, id: &str) -> ServiceResult<Tenant> {
        let tenant = self.get_tenant_required(id).await?;

        if !TenantRepository::new(self.pool).delete_tenant(id).await? {
            return Err(ServiceError::not_found("Tenant", id));
        }

        tracing::info!("Deleted tenant {}", id);
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn create(name: &str, rut: &str) -> CreateTenant {
        CreateTenant {
            name: name.to_string(),
            rut: rut.to_string(),
            is_active: true,
            subscription_plan: None,
            settings: None,
        }
    }

    #[tokio::test]
    async fn test_create_tenant_normalizes_rut() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);

        let tenant = service
            .create_tenant(create("Acme SpA", "76.086.428-5"))
            .await
            .unwrap();
        assert_eq!(tenant.rut, "760864285");

        let found = service.get_tenant_by_rut("76086428-5").await.unwrap();
        assert_eq!(found.id, tenant.id);
    }

    #[tokio::test]
    async fn test_unique_index_violation_maps_to_already_exists() {
        let pool = test_pool().await;
        let tenant = TenantService::new(&pool)
            .create_tenant(create("Acme SpA", "76.086.428-5"))
            .await
            .unwrap();

        // A concurrent create that passed the existence check lands here
        let duplicate = Tenant {
            id: Uuid::now_v7().to_string(),
            name: "Acme Two".to_string(),
            ..tenant.clone()
        };
        let error = TenantRepository::new(&pool)
            .create_tenant(&duplicate)
            .await
            .unwrap_err();

        let error = ServiceError::from_write_error(error, "Tenant", &duplicate.rut);
        assert!(matches!(error, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_create_tenant_rejects_invalid_rut() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);

        let err = service
            .create_tenant(create("Acme SpA", "76.086.428-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert!(err.to_string().contains("rut"));
    }

    #[tokio::test]
    async fn test_duplicate_rut_differing_in_punctuation_conflicts() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);

        service
            .create_tenant(create("Acme", "10.000.013-k"))
            .await
            .unwrap();
        let err = service
            .create_tenant(create("Acme Copy", "10000013K"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_tenant_partial_fields() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);
        let tenant = service
            .create_tenant(create("Acme", "76086428-5"))
            .await
            .unwrap();

        let updated = service
            .update_tenant(
                &tenant.id,
                UpdateTenant {
                    is_active: Some(false),
                    subscription_plan: Some("pro".to_string()),
                    ..UpdateTenant::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme");
        assert_eq!(updated.rut, "760864285");
        assert!(!updated.is_active);
        assert_eq!(updated.subscription_plan.as_deref(), Some("pro"));
    }

    #[tokio::test]
    async fn test_update_tenant_rut_conflicts_with_other_tenant() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);
        service
            .create_tenant(create("Acme", "76086428-5"))
            .await
            .unwrap();
        let other = service
            .create_tenant(create("Other", "12345678-5"))
            .await
            .unwrap();

        let err = service
            .update_tenant(
                &other.id,
                UpdateTenant {
                    rut: Some("76.086.428-5".to_string()),
                    ..UpdateTenant::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        // Re-submitting its own RUT is fine
        let same = service
            .update_tenant(
                &other.id,
                UpdateTenant {
                    rut: Some("12.345.678-5".to_string()),
                    ..UpdateTenant::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.rut, "123456785");
    }

    #[tokio::test]
    async fn test_delete_tenant() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);
        let tenant = service
            .create_tenant(create("Acme", "76086428-5"))
            .await
            .unwrap();

        let deleted = service.delete_tenant(&tenant.id).await.unwrap();
        assert_eq!(deleted.id, tenant.id);

        let err = service.get_tenant_required(&tenant.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        let err = service.delete_tenant(&tenant.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_tenants_rejects_bad_pagination() {
        let pool = test_pool().await;
        let service = TenantService::new(&pool);

        let err = service
            .list_tenants(&PaginationFilter {
                page: Some(0),
                per_page: Some(10),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }
}
