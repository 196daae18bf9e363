//! Database models for password reset tokens.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{auth::password::Argon2Params, types::UserId};

/// Database entity model. Only the Argon2 hash of the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    /// Unused and not yet expired.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}

/// Request for creating a password reset token
#[derive(Debug, Clone)]
pub struct PasswordResetTokenCreateRequest {
    pub user_id: UserId,
    pub raw_token: String,
    pub expires_at: DateTime<Utc>,
    pub argon2_params: Argon2Params,
}

/// Request for updating a password reset token (mark as used)
#[derive(Debug, Clone)]
pub struct PasswordResetTokenUpdateRequest {
    pub used_at: Option<DateTime<Utc>>,
}

pub type PasswordResetTokenResponse = PasswordResetToken;

/// Filter for password reset tokens
#[derive(Debug, Clone)]
pub struct PasswordResetTokenFilter {
    pub user_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration, used: bool) -> PasswordResetToken {
        let now = Utc::now();
        PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: String::new(),
            expires_at: now + expires_in,
            created_at: now,
            used_at: used.then_some(now),
        }
    }

    #[test]
    fn redeemable_only_while_fresh_and_unused() {
        let now = Utc::now();
        assert!(token(Duration::minutes(30), false).is_redeemable(now));
        assert!(!token(Duration::minutes(30), true).is_redeemable(now));
        assert!(!token(Duration::minutes(-1), false).is_redeemable(now));
    }
}
