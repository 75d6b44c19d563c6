//! Database repository for revoked token IDs.
//!
//! Backs the token revocation list: a `jti` stored here is refused by
//! verification until the row is purged after the token's own expiry.

use crate::database::models::RevokedToken;
use crate::errors::ServiceResult;
use crate::utils::jwt::RevocationList;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct RevokedTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> RevokedTokenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Records `jti` as revoked. Revoking twice is a no-op.
    pub async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at, revoked_at) VALUES (?, ?, ?)",
        )
        .bind(jti)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_revoked_token(&self, jti: &str) -> Result<Option<RevokedToken>> {
        let revoked = sqlx::query_as::<_, RevokedToken>(
            "SELECT jti, expires_at, revoked_at FROM revoked_tokens WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(self.pool)
        .await?;

        Ok(revoked)
    }

    /// Drops entries whose tokens expired before `now`; those tokens fail
    /// verification on their own.
    ///
    /// # Returns
    /// Number of rows removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RevocationList for RevokedTokenRepository<'_> {
    async fn is_revoked(&self, jti: &str) -> ServiceResult<bool> {
        Ok(self.get_revoked_token(jti).await?.is_some())
    }

    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> ServiceResult<()> {
        Ok(self.revoke_token(jti, expires_at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let pool = test_pool().await;
        let repo = RevokedTokenRepository::new(&pool);
        let expires_at = Utc::now() + Duration::days(7);

        assert!(!repo.is_revoked("jti-1").await.unwrap());
        repo.revoke("jti-1", expires_at).await.unwrap();
        repo.revoke("jti-1", expires_at).await.unwrap();
        assert!(repo.is_revoked("jti-1").await.unwrap());
        assert!(!repo.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let pool = test_pool().await;
        let repo = RevokedTokenRepository::new(&pool);
        let now = Utc::now();

        repo.revoke_token("old", now - Duration::hours(1))
            .await
            .unwrap();
        repo.revoke_token("live", now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
        assert!(repo.get_revoked_token("old").await.unwrap().is_none());
        let live = repo.get_revoked_token("live").await.unwrap().unwrap();
        assert_eq!(live.jti, "live");
        assert!(live.expires_at > now);
    }
}
