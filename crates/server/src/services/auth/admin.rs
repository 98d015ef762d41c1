//! Platform administrator authentication and account management.

use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{AdminUserId, Email};

use super::{AuthError, generate_session_token, hash_password, validate_password, verify_password};
use crate::db::{AdminUserRepository, RepositoryError};
use crate::error::AppError;
use crate::models::AdminUser;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            admins: AdminUserRepository::new(pool),
        }
    }

    /// Verify an admin's password and open a new session.
    ///
    /// Returns the admin and the session token to hand out as a cookie. Any
    /// previous session of this admin is invalidated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(AdminUser, String), AppError> {
        let email = Email::parse(email).map_err(AuthError::from)?;

        let (admin, password_hash) = self
            .admins
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = generate_session_token();
        self.admins.set_session_token(admin.id, &token).await?;

        tracing::info!(admin_id = %admin.id, "Admin logged in");
        Ok((admin, token))
    }

    /// Invalidate a session token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.admins.clear_session_token(token).await?;
        Ok(())
    }

    /// List every admin account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        Ok(self.admins.list_all().await?)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` for bad
    /// input and `AuthError::AlreadyExists` if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AdminUser, AppError> {
        let email = Email::parse(email).map_err(AuthError::from)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let admin = self
            .admins
            .create(&email, &password_hash, name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(admin_id = %admin.id, "Admin account created");
        Ok(admin)
    }

    /// Delete an admin account on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if an admin tries to delete themselves
    /// and `AppError::NotFound` if the target does not exist.
    #[instrument(skip(self))]
    pub async fn delete_admin(
        &self,
        actor: AdminUserId,
        target: AdminUserId,
    ) -> Result<(), AppError> {
        if actor == target {
            return Err(AppError::BadRequest(
                "you cannot delete your own account".to_string(),
            ));
        }

        self.admins.delete(target).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("admin {target} not found")),
            other => other.into(),
        })?;

        tracing::info!(admin_id = %target, "Admin account deleted");
        Ok(())
    }
}
