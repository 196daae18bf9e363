use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::{self, TokenKind},
    db::handlers::{Repository, Users},
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Pull the bearer token out of the `Authorization` header.
/// Returns:
/// - None: no `Authorization` header
/// - Some(Ok(token)): a `Bearer` credential
/// - Some(Err(error)): the header is present but not a bearer token
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let header = parts.headers.get(AUTHORIZATION)?;

    let value = match header.to_str() {
        Ok(value) => value,
        Err(_) => {
            return Some(Err(Error::Unauthenticated {
                message: Some("Invalid authorization header".to_string()),
            }));
        }
    };

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Some(Ok(token.trim()))
        }
        _ => Some(Err(Error::Unauthenticated {
            message: Some("Invalid authorization header".to_string()),
        })),
    }
}

/// Verify an access token and load the account it names.
///
/// The admin flag and names come from the database rather than the token so
/// that demotion and deactivation take effect immediately.
#[instrument(skip_all)]
async fn authenticate(token: &str, state: &AppState) -> Result<CurrentUser> {
    let claims = session::verify_token(token, TokenKind::Access, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(claims.sub).await?;

    match user {
        Some(user) if user.is_active => {
            debug!("Authenticated user {}", user.id);
            Ok(CurrentUser::from(&user))
        }
        Some(_) => Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        }),
        None => {
            trace!("Token subject {} no longer exists", claims.sub);
            Err(Error::Unauthenticated {
                message: Some("User not found".to_string()),
            })
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match bearer_token(parts) {
            Some(Ok(token)) => authenticate(token, state).await,
            Some(Err(e)) => Err(e),
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

/// For routes that personalise their response when a caller is known.
/// A request without credentials is anonymous; bad credentials are still a 401.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match bearer_token(parts) {
            Some(Ok(token)) => authenticate(token, state).await.map(Some),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState,
        api::models::users::CurrentUser,
        auth::session::{create_access_token, create_refresh_token},
        db::handlers::{Repository, Users},
        db::models::users::UserUpdateDBRequest,
        test_utils::{create_test_config, create_test_user},
    };
    use axum::{
        extract::{FromRequestParts, OptionalFromRequestParts},
        http::{StatusCode, request::Parts},
    };
    use sqlx::PgPool;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn state(pool: &PgPool) -> AppState {
        AppState::builder().db(pool.clone()).config(create_test_config()).build()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_valid_access_token(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, false).await;
        let token = create_access_token(&CurrentUser::from(&user), &state.config).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(current.id, user.id);
        assert_eq!(current.email, user.email);
        assert!(!current.is_admin);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_token_rejected_as_access(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, false).await;
        let token = create_refresh_token(&CurrentUser::from(&user), &state.config).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deactivated_user_rejected(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, false).await;
        let token = create_access_token(&CurrentUser::from(&user), &state.config).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .update(
                user.id,
                &UserUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), "Account is deactivated");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_and_malformed_headers(pool: PgPool) {
        let state = state(&pool);

        let mut parts = parts_with_auth(None);
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with_auth(Some("Bearer not-a-jwt"));
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_optional_extraction(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, true).await;
        let token = create_access_token(&CurrentUser::from(&user), &state.config).unwrap();

        let mut parts = parts_with_auth(None);
        let anonymous = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(anonymous.is_none());

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let known = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(known.unwrap().is_admin);
    }
}
