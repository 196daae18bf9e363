//! Database repository for password reset tokens.

use chrono::Utc;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::password::{self, Argon2Params},
    config::Config,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::password_reset_tokens::{
            PasswordResetToken, PasswordResetTokenCreateRequest, PasswordResetTokenFilter, PasswordResetTokenResponse,
            PasswordResetTokenUpdateRequest,
        },
    },
    types::{UserId, abbrev_uuid},
};

const COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at, used_at";

pub struct PasswordResetTokens<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for PasswordResetTokens<'c> {
    type CreateRequest = PasswordResetTokenCreateRequest;
    type UpdateRequest = PasswordResetTokenUpdateRequest;
    type Response = PasswordResetTokenResponse;
    type Id = Uuid;
    type Filter = PasswordResetTokenFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let raw_token = request.raw_token.clone();
        let params = request.argon2_params;
        let token_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&raw_token, params))
            .await
            .map_err(|e| DbError::Other(anyhow::anyhow!("join reset token hashing: {e}")))?
            .map_err(|e| DbError::Other(anyhow::anyhow!(e)))?;

        let token = sqlx::query_as::<_, PasswordResetToken>(&format!(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(request.user_id)
        .bind(token_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let token = sqlx::query_as::<_, PasswordResetToken>(&format!(
            "SELECT {COLUMNS} FROM password_reset_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(token)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM password_reset_tokens WHERE 1=1"));
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let tokens = query.build_query_as::<PasswordResetToken>().fetch_all(&mut *self.db).await?;
        Ok(tokens)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM password_reset_tokens WHERE 1=1");
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let token = sqlx::query_as::<_, PasswordResetToken>(&format!(
            "UPDATE password_reset_tokens SET used_at = COALESCE($2, used_at) WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(request.used_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token)
    }
}

impl<'c> PasswordResetTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a reset token for a user. Returns the raw token, which is never
    /// stored, together with the persisted row.
    #[instrument(skip(self, config), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_for_user(&mut self, user_id: UserId, config: &Config) -> Result<(String, PasswordResetToken)> {
        let raw_token = password::generate_reset_token();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(config.auth.password_reset_token_duration).unwrap_or(chrono::Duration::minutes(30));

        let request = PasswordResetTokenCreateRequest {
            user_id,
            raw_token: raw_token.clone(),
            expires_at,
            argon2_params: Argon2Params::from(&config.auth.password),
        };

        let token = self.create(&request).await?;
        Ok((raw_token, token))
    }

    /// Find a redeemable token by ID and check the raw token against its hash.
    #[instrument(skip(self, raw_token), err)]
    pub async fn find_valid_token_by_id(&mut self, token_id: Uuid, raw_token: &str) -> Result<Option<PasswordResetToken>> {
        let Some(token) = self.get_by_id(token_id).await? else {
            return Ok(None);
        };
        if !token.is_redeemable(Utc::now()) {
            return Ok(None);
        }

        let raw_token = raw_token.to_string();
        let hash = token.token_hash.clone();
        let matches = password::verify_password(raw_token, hash).await;
        match matches {
            Ok(true) => Ok(Some(token)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::error!("Token verification error for token {}: {:?}", token_id, e);
                Ok(None)
            }
        }
    }

    /// Mark a token used. Returns false when it was already used or has
    /// expired, so only one redemption of a token can succeed.
    #[instrument(skip(self), err)]
    pub async fn claim(&mut self, token_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL AND expires_at > NOW()",
        )
        .bind(token_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Invalidate all outstanding tokens for a user
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn invalidate_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.auth.password.argon2_memory_kib = 1024;
        config.auth.password.argon2_iterations = 1;
        config
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_token_lifecycle(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let config = fast_config();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = PasswordResetTokens::new(&mut conn);

        let (raw, token) = repo.create_for_user(user.id, &config).await.unwrap();
        assert_ne!(token.token_hash, raw);

        assert!(repo.find_valid_token_by_id(token.id, &raw).await.unwrap().is_some());
        assert!(repo.find_valid_token_by_id(token.id, "wrong").await.unwrap().is_none());

        repo.update(token.id, &PasswordResetTokenUpdateRequest { used_at: Some(Utc::now()) })
            .await
            .unwrap();
        assert!(repo.find_valid_token_by_id(token.id, &raw).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_token_claimed_once(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let config = fast_config();
        let token = {
            let mut conn = pool.acquire().await.unwrap();
            let (_, token) = PasswordResetTokens::new(&mut conn).create_for_user(user.id, &config).await.unwrap();
            token
        };

        let mut first = pool.acquire().await.unwrap();
        let mut second = pool.acquire().await.unwrap();
        let mut first_repo = PasswordResetTokens::new(&mut first);
        let mut second_repo = PasswordResetTokens::new(&mut second);
        let (a, b) = tokio::join!(
            first_repo.claim(token.id),
            second_repo.claim(token.id),
        );
        let claimed = [a.unwrap(), b.unwrap()];
        assert_eq!(claimed.iter().filter(|c| **c).count(), 1);

        let mut conn = pool.acquire().await.unwrap();
        assert!(!PasswordResetTokens::new(&mut conn).claim(token.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalidate_for_user(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let config = fast_config();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = PasswordResetTokens::new(&mut conn);

        let (raw1, first) = repo.create_for_user(user.id, &config).await.unwrap();
        let (_, _) = repo.create_for_user(user.id, &config).await.unwrap();

        assert_eq!(repo.invalidate_for_user(user.id).await.unwrap(), 2);
        assert!(repo.find_valid_token_by_id(first.id, &raw1).await.unwrap().is_none());

        let filter = PasswordResetTokenFilter {
            user_id: Some(user.id),
            skip: 0,
            limit: 10,
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
    }
}
