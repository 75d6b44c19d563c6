//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users

use crate::{
    api::common::PaginationFilter,
    database::models::User,
    errors::ServiceResult,
    utils::jwt::{Principal, PrincipalLookup},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, tenant_id, email, password_hash, first_name, last_name, \
     is_active, is_superadmin, created_at, updated_at, is_deleted, deleted_at";

/// Repository for user database operations.
///
/// Handles all persistence operations for the User entity,
/// maintaining the optional relationship with tenants.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `user` - Fully populated user row (password already hashed)
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: &User) -> Result<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.id)
            .bind(&user.tenant_id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.is_active)
            .bind(user.is_superadmin)
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.is_deleted)
            .bind(user.deleted_at)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Arguments
    /// * `id` - User ID (UUID format)
    ///
    /// # Returns
    /// `Some(User)` if found and not deleted, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_deleted = 0");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their (lowercased) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? AND is_deleted = 0");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND is_deleted = 0")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Checks if email exists excluding a specific user.
    ///
    /// # Arguments
    /// * `email` - Email to check
    /// * `exclude_user_id` - User ID to exclude from check
    pub async fn email_exists_excluding(&self, email: &str, exclude_user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != ? AND is_deleted = 0",
        )
        .bind(email)
        .bind(exclude_user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Lists users, newest first, optionally restricted to one tenant.
    pub async fn list_users(
        &self,
        tenant_id: Option<&str>,
        pagination: &PaginationFilter,
    ) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE is_deleted = 0 AND (?1 IS NULL OR tenant_id = ?1) \
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(tenant_id)
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(self.pool)
            .await?;

        Ok(users)
    }

    /// Get total count of users, optionally for one tenant
    pub async fn count_users(&self, tenant_id: Option<&str>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE is_deleted = 0 AND (?1 IS NULL OR tenant_id = ?1)",
        )
        .bind(tenant_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count as u64)
    }

    /// Writes every mutable column of `user` and bumps `updated_at`.
    pub async fn update_user(&self, user: &User) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET tenant_id = ?, email = ?, password_hash = ?, first_name = ?, \
             last_name = ?, is_active = ?, is_superadmin = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.tenant_id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.is_active)
            .bind(user.is_superadmin)
            .bind(Utc::now())
            .bind(&user.id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Soft deletes a user.
    ///
    /// # Returns
    /// `true` if a live user was deleted
    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, updated_at = ? \
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

#[async_trait]
impl PrincipalLookup for UserRepository<'_> {
    async fn find_principal(&self, id: &str) -> ServiceResult<Option<Principal>> {
        let user = self.get_user_by_id(id).await?;
        Ok(user.as_ref().map(Principal::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn user(id: &str, email: &str, tenant_id: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            tenant_id: tenant_id.map(String::from),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ana".to_string(),
            last_name: Some("Rojas".to_string()),
            is_active: true,
            is_superadmin: false,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    async fn seed_tenant(pool: &SqlitePool, id: &str, rut: &str) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO tenants (id, name, rut, is_active, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, 1, ?, ?, 0)",
        )
        .bind(id)
        .bind(id)
        .bind(rut)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        repo.create_user(&user("u1", "ana@example.com", None))
            .await
            .unwrap();

        let by_email = repo
            .get_user_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, "u1");
        assert_eq!(by_email.last_name.as_deref(), Some("Rojas"));

        assert!(repo.email_exists("ana@example.com").await.unwrap());
        assert!(
            !repo
                .email_exists_excluding("ana@example.com", "u1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_list_users_filters_by_tenant() {
        let pool = test_pool().await;
        seed_tenant(&pool, "t1", "760864285").await;
        seed_tenant(&pool, "t2", "123456785").await;
        let repo = UserRepository::new(&pool);

        repo.create_user(&user("u1", "a@example.com", Some("t1")))
            .await
            .unwrap();
        repo.create_user(&user("u2", "b@example.com", Some("t1")))
            .await
            .unwrap();
        repo.create_user(&user("u3", "c@example.com", Some("t2")))
            .await
            .unwrap();

        let all = PaginationFilter::default();
        assert_eq!(repo.list_users(None, &all).await.unwrap().len(), 3);
        assert_eq!(repo.list_users(Some("t1"), &all).await.unwrap().len(), 2);
        assert_eq!(repo.count_users(Some("t2")).await.unwrap(), 1);
        assert_eq!(repo.count_users(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_principal_lookup_reflects_current_state() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let mut stored = repo
            .create_user(&user("u1", "ana@example.com", None))
            .await
            .unwrap();
        stored.is_active = false;
        repo.update_user(&stored).await.unwrap();

        let principal = repo.find_principal("u1").await.unwrap().unwrap();
        assert!(!principal.is_active);

        repo.delete_user("u1").await.unwrap();
        assert!(repo.find_principal("u1").await.unwrap().is_none());
    }
}
