//! User domain types.

use chrono::{DateTime, Utc};

use wardrobe_core::{ApiTokenId, UserId};

/// A shopper.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An API token record. The plaintext token is never stored.
#[derive(Debug, Clone)]
pub struct ApiToken {
    /// Token record ID.
    pub id: ApiTokenId,
    /// User the token identifies.
    pub user_id: UserId,
    /// Optional label (e.g. "mobile app").
    pub label: Option<String>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token last authenticated a request.
    pub last_used_at: Option<DateTime<Utc>>,
}
