//! Core business logic for the authentication system.
//!
//! Binds the [`TokenManager`] to the user and revocation tables: login,
//! refresh, per-request authentication and logout.

use crate::auth::models::LoginRequest;
use crate::database::models::User;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::revoked_token_repository::RevokedTokenRepository;
use crate::repositories::tenant_repository::TenantRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::{
    Claims, Principal, RevocationList, SignedToken, TokenManager, TokenPair, TokenType,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Authentication service for handling login, token refresh and logout
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    tokens: &'a TokenManager,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, tokens: &'a TokenManager) -> Self {
        AuthService { pool, tokens }
    }

    /// Authenticate a user and issue an access/refresh token pair
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<TokenPair> {
        if let Err(validation_errors) = login_request.validate() {
            return Err(ServiceError::from_validation_errors(&validation_errors));
        }

        let user = UserService::new(self.pool)
            .authenticate_user(&login_request.username, &login_request.password)
            .await?;

        self.ensure_tenant_active(&user).await?;

        let pair = self.tokens.issue_pair(&Principal::from(&user))?;
        tracing::info!("User {} logged in", user.id);
        Ok(pair)
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<SignedToken> {
        let principals = UserRepository::new(self.pool);
        let revocations = RevokedTokenRepository::new(self.pool);

        self.tokens
            .refresh(refresh_token, &principals, &revocations)
            .await
    }

    /// Verify a bearer access token and load the user it names.
    ///
    /// The user must still exist and be active; the token's flag snapshot is
    /// not trusted for that.
    pub async fn authenticate(&self, access_token: &str) -> ServiceResult<(Claims, User)> {
        let revocations = RevokedTokenRepository::new(self.pool);
        let claims = self
            .tokens
            .verify_unrevoked(access_token, TokenType::Access, &revocations)
            .await?;

        let user = UserRepository::new(self.pool)
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Could not validate credentials"))?;

        if !user.is_active {
            return Err(ServiceError::unauthorized("Inactive user"));
        }

        Ok((claims, user))
    }

    /// Revoke the refresh token presented at logout.
    ///
    /// An invalid or expired token has nothing left to revoke and is ignored.
    pub async fn logout(&self, refresh_token: Option<&str>) -> ServiceResult<()> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        match self.tokens.verify(token, TokenType::Refresh) {
            Ok(claims) => {
                RevokedTokenRepository::new(self.pool)
                    .revoke(&claims.jti, claims.expires_at())
                    .await?;
                tracing::info!("Revoked refresh token {} for {}", claims.jti, claims.sub);
            }
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Ignoring unusable refresh token at logout: {}", e)
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    async fn ensure_tenant_active(&self, user: &User) -> ServiceResult<()> {
        let Some(tenant_id) = &user.tenant_id else {
            return Ok(());
        };

        let tenant = TenantRepository::new(self.pool)
            .get_tenant_by_id(tenant_id)
            .await?;
        match tenant {
            Some(tenant) if tenant.is_active => Ok(()),
            _ => Err(ServiceError::permission_denied("Tenant is inactive")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateTenant, CreateUser, UpdateTenant, UpdateUser};
    use crate::database::test_pool;
    use crate::services::tenant_service::TenantService;
    use crate::utils::jwt::tests::manager;

    async fn seed_user(pool: &SqlitePool, tenant_id: Option<String>) -> User {
        UserService::new(pool)
            .create_user(CreateUser {
                tenant_id,
                email: "ana@example.com".to_string(),
                password: "s3cret".to_string(),
                first_name: "Ana".to_string(),
                last_name: None,
                is_active: true,
                is_superadmin: false,
            })
            .await
            .unwrap()
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            username: "ana@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_pair() {
        let pool = test_pool().await;
        let tokens = manager();
        let user = seed_user(&pool, None).await;
        let service = AuthService::new(&pool, &tokens);

        let pair = service.login(login_request("s3cret")).await.unwrap();
        assert_eq!(pair.token_type, "bearer");

        let (claims, current) = service.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(current.id, user.id);

        // A refresh token is not a bearer credential
        assert!(
            service
                .authenticate(&pair.refresh_token)
                .await
                .unwrap_err()
                .is_unauthorized()
        );
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let pool = test_pool().await;
        let tokens = manager();
        seed_user(&pool, None).await;

        let err = AuthService::new(&pool, &tokens)
            .login(login_request("wrong"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_tenant() {
        let pool = test_pool().await;
        let tokens = manager();
        let tenants = TenantService::new(&pool);
        let tenant = tenants
            .create_tenant(CreateTenant {
                name: "Acme".to_string(),
                rut: "76086428-5".to_string(),
                is_active: true,
                subscription_plan: None,
                settings: None,
            })
            .await
            .unwrap();
        seed_user(&pool, Some(tenant.id.clone())).await;
        let service = AuthService::new(&pool, &tokens);

        assert!(service.login(login_request("s3cret")).await.is_ok());

        tenants
            .update_tenant(
                &tenant.id,
                UpdateTenant {
                    is_active: Some(false),
                    ..UpdateTenant::default()
                },
            )
            .await
            .unwrap();
        let err = service.login(login_request("s3cret")).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_refresh_fails_after_user_deactivated() {
        let pool = test_pool().await;
        let tokens = manager();
        let user = seed_user(&pool, None).await;
        let service = AuthService::new(&pool, &tokens);
        let pair = service.login(login_request("s3cret")).await.unwrap();

        let access = service.refresh(&pair.refresh_token).await.unwrap();
        assert!(tokens.verify(&access.token, TokenType::Access).is_ok());

        UserService::new(&pool)
            .update_user(
                &user.id,
                UpdateUser {
                    is_active: Some(false),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        assert!(
            service
                .refresh(&pair.refresh_token)
                .await
                .unwrap_err()
                .is_unauthorized()
        );
        assert!(
            service
                .authenticate(&pair.access_token)
                .await
                .unwrap_err()
                .is_unauthorized()
        );
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let pool = test_pool().await;
        let tokens = manager();
        seed_user(&pool, None).await;
        let service = AuthService::new(&pool, &tokens);
        let pair = service.login(login_request("s3cret")).await.unwrap();

        service.logout(Some(&pair.refresh_token)).await.unwrap();

        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("revoked"));
    }

    #[tokio::test]
    async fn test_logout_ignores_missing_or_bad_token() {
        let pool = test_pool().await;
        let tokens = manager();
        let service = AuthService::new(&pool, &tokens);

        service.logout(None).await.unwrap();
        service.logout(Some("garbage")).await.unwrap();
    }
}
