//! User business logic service.
//!
//! Handles user registration, credential checks and profile management.

use crate::api::common::PaginationFilter;
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::tenant_repository::TenantRepository;
use crate::repositories::user_repository::UserRepository;
use bcrypt::{hash, verify};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// bcrypt's minimum cost keeps the test suite fast
#[cfg(test)]
const HASH_COST: u32 = 4;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user with full validation.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation failures
    /// - An email already in use
    /// - A tenant that does not exist
    pub async fn create_user(&self, create_user: CreateUser) -> ServiceResult<User> {
        if let Err(validation_errors) = create_user.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let user_repo = UserRepository::new(self.pool);
        let email = normalize_email(&create_user.email);

        if user_repo.email_exists(&email).await? {
            return Err(ServiceError::already_exists("User", email));
        }

        if let Some(tenant_id) = &create_user.tenant_id {
            self.ensure_tenant_exists(tenant_id).await?;
        }

        let password_hash = hash_password(&create_user.password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7().to_string(),
            tenant_id: create_user.tenant_id,
            email,
            password_hash,
            first_name: create_user.first_name.trim().to_string(),
            last_name: create_user.last_name.map(|name| name.trim().to_string()),
            is_active: create_user.is_active,
            is_superadmin: create_user.is_superadmin,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };

        let user = user_repo
            .create_user(&user)
            .await
            .map_err(|e| ServiceError::from_write_error(e, "User", &user.email))?;
        tracing::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> ServiceResult<User> {
        let user = UserRepository::new(self.pool)
            .get_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INCORRECT_CREDENTIALS))?;

        let valid = verify(password, &user.password_hash)
            .map_err(|e| ServiceError::internal_error(format!("Password check failed: {}", e)))?;
        if !valid {
            return Err(ServiceError::unauthorized(INCORRECT_CREDENTIALS));
        }

        if !user.is_active {
            return Err(ServiceError::unauthorized("Inactive user"));
        }

        Ok(user)
    }

    /// Retrieves a user by ID, failing with `NotFound` when absent.
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        UserRepository::new(self.pool)
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Lists one page of users, optionally for a single tenant.
    pub async fn list_users(
        &self,
        tenant_id: Option<&str>,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<User>, u64)> {
        if let Err(validation_errors) = pagination.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let repo = UserRepository::new(self.pool);
        let users = repo.list_users(tenant_id, pagination).await?;
        let total = repo.count_users(tenant_id).await?;
        Ok((users, total))
    }

    /// Applies a partial update. A new password is rehashed.
    pub async fn update_user(&self, id: &str, update: UpdateUser) -> ServiceResult<User> {
        if let Err(validation_errors) = update.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let repo = UserRepository::new(self.pool);
        let mut user = self.get_user_required(id).await?;

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if repo.email_exists_excluding(&email, id).await? {
                return Err(ServiceError::already_exists("User", email));
            }
            user.email = email;
        }
        if let Some(tenant_id) = update.tenant_id {
            self.ensure_tenant_exists(&tenant_id).await?;
            user.tenant_id = Some(tenant_id);
        }
        if let Some(password) = update.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            user.last_name = Some(last_name.trim().to_string());
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(is_superadmin) = update.is_superadmin {
            user.is_superadmin = is_superadmin;
        }

        repo.update_user(&user)
            .await
            .map_err(|e| ServiceError::from_write_error(e, "User", &user.email))?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Soft deletes a user and returns its last state.
    pub async fn delete_user(&self, id: &str) -> ServiceResult<User> {
        let user = self.get_user_required(id).await?;

        if !UserRepository::new(self.pool).delete_user(id).await? {
            return Err(ServiceError::not_found("User", id));
        }

        tracing::info!("Deleted user {}", id);
        Ok(user)
    }

    /// Creates the bootstrap superadmin unless the email is already taken.
    ///
    /// # Returns
    /// `true` if a user was created
    pub async fn ensure_superadmin(&self, email: &str, password: &str) -> ServiceResult<bool> {
        let existing = UserRepository::new(self.pool)
            .get_user_by_email(&normalize_email(email))
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        tracing::info!("Creating superadmin: {}", email);
        self.create_user(CreateUser {
            tenant_id: None,
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Super".to_string(),
            last_name: Some("Admin".to_string()),
            is_active: true,
            is_superadmin: true,
        })
        .await?;

        Ok(true)
    }

    async fn ensure_tenant_exists(&self, tenant_id: &str) -> ServiceResult<()> {
        TenantRepository::new(self.pool)
            .get_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", tenant_id))?;
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, HASH_COST)
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateTenant;
    use crate::database::test_pool;
    use crate::services::tenant_service::TenantService;

    fn create(email: &str, tenant_id: Option<String>) -> CreateUser {
        CreateUser {
            tenant_id,
            email: email.to_string(),
            password: "s3cret".to_string(),
            first_name: "Ana".to_string(),
            last_name: Some("Rojas".to_string()),
            is_active: true,
            is_superadmin: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_insert_maps_to_already_exists() {
        let pool = test_pool().await;
        let user = UserService::new(&pool)
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();

        let duplicate = User {
            id: Uuid::now_v7().to_string(),
            ..user.clone()
        };
        let error = UserRepository::new(&pool)
            .create_user(&duplicate)
            .await
            .unwrap_err();

        let error = ServiceError::from_write_error(error, "User", &duplicate.email);
        assert!(matches!(error, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_create_and_authenticate_user() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let user = service
            .create_user(create("Ana@Example.com", None))
            .await
            .unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_ne!(user.password_hash, "s3cret");

        let authenticated = service
            .authenticate_user("ANA@example.com", "s3cret")
            .await
            .unwrap();
        assert_eq!(authenticated.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials_uniformly() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);
        service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();

        let wrong_password = service
            .authenticate_user("ana@example.com", "nope")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate_user("bob@example.com", "s3cret")
            .await
            .unwrap_err();

        assert!(wrong_password.is_unauthorized());
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_user() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);
        let user = service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();
        service
            .update_user(
                &user.id,
                UpdateUser {
                    is_active: Some(false),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        let err = service
            .authenticate_user("ana@example.com", "s3cret")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);
        service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();

        let err = service
            .create_user(create("ANA@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_user_requires_existing_tenant() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let err = service
            .create_user(create("ana@example.com", Some("missing".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let tenant = TenantService::new(&pool)
            .create_tenant(CreateTenant {
                name: "Acme".to_string(),
                rut: "76086428-5".to_string(),
                is_active: true,
                subscription_plan: None,
                settings: None,
            })
            .await
            .unwrap();
        let user = service
            .create_user(create("ana@example.com", Some(tenant.id.clone())))
            .await
            .unwrap();
        assert_eq!(user.tenant_id, Some(tenant.id));
    }

    #[tokio::test]
    async fn test_update_user_rehashes_password() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);
        let user = service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();

        service
            .update_user(
                &user.id,
                UpdateUser {
                    password: Some("n3w".to_string()),
                    last_name: Some("Soto".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        assert!(
            service
                .authenticate_user("ana@example.com", "s3cret")
                .await
                .is_err()
        );
        let user = service
            .authenticate_user("ana@example.com", "n3w")
            .await
            .unwrap();
        assert_eq!(user.last_name.as_deref(), Some("Soto"));
    }

    #[tokio::test]
    async fn test_ensure_superadmin_only_once() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        assert!(
            service
                .ensure_superadmin("admin@example.com", "changeme")
                .await
                .unwrap()
        );
        assert!(
            !service
                .ensure_superadmin("admin@example.com", "changeme")
                .await
                .unwrap()
        );

        let admin = service
            .authenticate_user("admin@example.com", "changeme")
            .await
            .unwrap();
        assert!(admin.is_superadmin);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);
        let user = service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();

        service.delete_user(&user.id).await.unwrap();
        assert!(matches!(
            service.get_user_required(&user.id).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        // The email is free again after a soft delete
        service
            .create_user(create("ana@example.com", None))
            .await
            .unwrap();
    }
}
