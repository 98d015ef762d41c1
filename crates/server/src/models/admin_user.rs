//! Platform identities: admin accounts and the legacy platform user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{AdminUserId, Email, PlatformUserId};

/// A platform administrator account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a legacy platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    User,
    Admin,
}

/// Legacy platform-level identity.
///
/// Admin sessions are mirrored into this table under the open id
/// `admin-{id}`; stores created from the platform panel record it as their
/// `user_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformUser {
    pub id: PlatformUserId,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: PlatformRole,
    pub last_signed_in: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PlatformUser {
    /// Open id under which an admin account is mirrored.
    #[must_use]
    pub fn open_id_for_admin(admin_id: AdminUserId) -> String {
        format!("admin-{admin_id}")
    }
}
