use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::models::users::{
        AccessTokenResponse, AuthResponse, CurrentUser, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileUpdateResponse,
        RefreshRequest, RegisterRequest, ResetPasswordRequest, UserEnvelope, UserResponse,
    },
    auth::{
        password::{self, Argon2Params},
        session::{self, TokenKind},
    },
    db::{
        handlers::{PasswordResetTokens, Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
    notifications::{self, Notification},
    validation::{require_fields, sanitize_string, validate_email, validate_phone},
};

const RESET_REQUESTED: &str = "If an account with that email exists, a password reset link has been sent.";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_tokens(user: &CurrentUser, state: &AppState) -> Result<(String, String), Error> {
    Ok((
        session::create_access_token(user, &state.config)?,
        session::create_refresh_token(user, &state.config)?,
    ))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input, or email/username already in use"),
        (status = 403, description = "Registration is disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::Forbidden {
            message: "User registration is disabled".to_string(),
        });
    }

    require_fields(&[
        ("email", request.email.as_deref()),
        ("username", request.username.as_deref()),
        ("password", request.password.as_deref()),
        ("first_name", request.first_name.as_deref()),
        ("last_name", request.last_name.as_deref()),
    ])?;
    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let username = request.username.as_deref().unwrap_or_default().trim().to_string();
    let password = request.password.unwrap_or_default();
    let first_name = sanitize_string(request.first_name.as_deref().unwrap_or_default(), 50);
    let last_name = sanitize_string(request.last_name.as_deref().unwrap_or_default(), 50);

    if !validate_email(&email) {
        return Err(Error::bad_request("Invalid email format"));
    }
    if !(3..=80).contains(&username.chars().count()) {
        return Err(Error::bad_request("Username must be between 3 and 80 characters"));
    }
    let phone = match request.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(phone) if phone.chars().count() > 20 || !validate_phone(phone) => {
            return Err(Error::bad_request("Invalid phone format"));
        }
        other => other.map(str::to_string),
    };
    password::check_length(&password, &state.config.auth.password)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let created_user = {
        let mut user_repo = Users::new(&mut tx);
        if user_repo.get_user_by_email(&email).await?.is_some() {
            return Err(Error::bad_request("Email already registered"));
        }
        if user_repo.get_user_by_username(&username).await?.is_some() {
            return Err(Error::bad_request("Username already taken"));
        }

        let password_hash = password::hash_password(password, Argon2Params::from(&state.config.auth.password)).await?;
        let create_request = UserCreateDBRequest {
            email,
            username,
            password_hash,
            first_name,
            last_name,
            phone,
            dietary_preferences: request.dietary_preferences,
            health_goals: request.health_goals,
            is_admin: false,
        };

        // A concurrent registration can still slip past the checks above
        user_repo.create(&create_request).await.map_err(|e| {
            if e.is_unique_violation_of("users_email_key") {
                Error::bad_request("Email already registered")
            } else if e.is_unique_violation_of("users_username_key") {
                Error::bad_request("Username already taken")
            } else {
                Error::Database(e)
            }
        })?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(user_id = %created_user.id, "Registered new user");
    let (access_token, refresh_token) = issue_tokens(&CurrentUser::from(&created_user), &state)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token,
            refresh_token,
            user: UserResponse::from(created_user),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials or deactivated account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>, Error> {
    require_fields(&[("email", request.email.as_deref()), ("password", request.password.as_deref())])?;
    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let password = request.password.unwrap_or_default();

    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_user_by_email(&email).await?.ok_or_else(invalid_credentials)?;
    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }
    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    let user = user_repo.record_login(user.id).await?;
    let (access_token, refresh_token) = issue_tokens(&CurrentUser::from(&user), &state)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        access_token,
        refresh_token,
        user: UserResponse::from(user),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid refresh token or user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, Error> {
    let claims = session::verify_token(&request.refresh_token, TokenKind::Refresh, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid user".to_string()),
        })?;

    Ok(Json(AccessTokenResponse {
        access_token: session::create_access_token(&CurrentUser::from(&user), &state.config)?,
    }))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", current_user.id))?;

    Ok(Json(UserEnvelope {
        user: UserResponse::from(user),
    }))
}

/// Logout. Tokens are stateless, so the client simply discards them.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(current_user: CurrentUser) -> Json<MessageResponse> {
    tracing::debug!(user_id = %current_user.id, "User logged out");
    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}

/// Mark the caller's email address as verified
#[utoipa::path(
    post,
    path = "/auth/verify-email",
    tag = "authentication",
    responses(
        (status = 200, description = "Email verified", body = ProfileUpdateResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ProfileUpdateResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                is_verified: Some(true),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(ProfileUpdateResponse {
        message: "Email verified successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Reset requested. The response is identical whether or not the account exists.", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let email = normalize_email(&request.email);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut tx).get_user_by_email(&email).await?;

    if let Some(user) = user.filter(|user| user.is_active) {
        let mut token_repo = PasswordResetTokens::new(&mut tx);
        token_repo.invalidate_for_user(user.id).await?;
        let (raw_token, token) = token_repo.create_for_user(user.id, &state.config).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        notifications::dispatch(
            &state.config,
            Notification::PasswordReset {
                email: user.email,
                name: user.first_name,
                token_id: token.id,
                token: raw_token,
            },
        );
    }

    Ok(Json(MessageResponse {
        message: RESET_REQUESTED.to_string(),
    }))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or unacceptable password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    password::check_length(&request.new_password, &state.config.auth.password)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    {
        let mut token_repo = PasswordResetTokens::new(&mut tx);
        let token = token_repo
            .find_valid_token_by_id(request.token_id, &request.token)
            .await?
            .ok_or_else(|| Error::bad_request("Invalid or expired reset token"))?;

        if !token_repo.claim(token.id).await? {
            return Err(Error::bad_request("Invalid or expired reset token"));
        }
        token_repo.invalidate_for_user(token.user_id).await?;

        let password_hash =
            password::hash_password(request.new_password, Argon2Params::from(&state.config.auth.password)).await?;
        Users::new(&mut tx)
            .update(
                token.user_id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_PASSWORD, add_auth_headers, create_test_app, create_test_app_with_config, create_test_config, create_test_user};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn registration(email: &str, username: &str) -> Value {
        json!({
            "email": email,
            "username": username,
            "password": "password123",
            "first_name": "Ana",
            "last_name": "Lopes",
            "dietary_preferences": ["Vegan"],
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_success(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/register")
            .json(&registration("Ana@Example.com", "ana"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: AuthResponse = response.json();
        assert_eq!(body.user.email, "ana@example.com");
        assert_eq!(body.user.full_name, "Ana Lopes");
        assert_eq!(body.user.dietary_preferences, vec!["Vegan"]);
        assert!(!body.access_token.is_empty());
        assert!(!body.refresh_token.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_duplicates(pool: PgPool) {
        let server = create_test_app(pool).await;
        server
            .post("/api/auth/register")
            .json(&registration("ana@example.com", "ana"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/auth/register")
            .json(&registration("ana@example.com", "someone"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Email already registered");

        let response = server
            .post("/api/auth/register")
            .json(&registration("other@example.com", "ana"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Username already taken");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_validation(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({"email": "ana@example.com", "password": "password123"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Missing required field: username");

        let response = server
            .post("/api/auth/register")
            .json(&registration("not-an-email", "ana"))
            .await;
        assert_eq!(response.json::<Value>()["error"], "Invalid email format");

        let mut short_password = registration("ana@example.com", "ana");
        short_password["password"] = json!("short");
        let response = server.post("/api/auth/register").json(&short_password).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Password must be at least 8 characters");

        let mut bad_phone = registration("ana@example.com", "ana");
        bad_phone["phone"] = json!("call me");
        let response = server.post("/api/auth/register").json(&bad_phone).await;
        assert_eq!(response.json::<Value>()["error"], "Invalid phone format");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_disabled(pool: PgPool) {
        let mut config = create_test_config();
        config.auth.allow_registration = false;
        let server = create_test_app_with_config(pool, config).await;

        let response = server
            .post("/api/auth/register")
            .json(&registration("ana@example.com", "ana"))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_and_refresh(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({"email": user.email, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let body: AuthResponse = response.json();
        assert_eq!(body.user.id, user.id);
        assert!(body.user.last_login.is_some());

        let response = server
            .post("/api/auth/refresh")
            .json(&json!({"refresh_token": body.refresh_token}))
            .await;
        response.assert_status_ok();
        let refreshed: AccessTokenResponse = response.json();

        let response = server
            .get("/api/auth/me")
            .add_header("authorization", format!("Bearer {}", refreshed.access_token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<UserEnvelope>().user.id, user.id);

        // An access token is not a refresh token
        let response = server
            .post("/api/auth/refresh")
            .json(&json!({"refresh_token": body.access_token}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_failures(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool.clone()).await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({"email": user.email, "password": "wrong-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "Invalid email or password");

        let response = server
            .post("/api/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": TEST_PASSWORD}))
            .await;
        assert_eq!(response.json::<Value>()["error"], "Invalid email or password");

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

        let response = server
            .post("/api/auth/login")
            .json(&json!({"email": user.email, "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "Account is deactivated");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_logout_and_verify_require_auth(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        server.get("/api/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
        server.post("/api/auth/logout").await.assert_status(StatusCode::UNAUTHORIZED);

        let response = server.post("/api/auth/logout").add_header(&auth[0].0, &auth[0].1).await;
        response.assert_status_ok();
        assert_eq!(response.json::<MessageResponse>().message, "Successfully logged out");

        let response = server
            .post("/api/auth/verify-email")
            .add_header(&auth[0].0, &auth[0].1)
            .await;
        response.assert_status_ok();
        assert!(response.json::<ProfileUpdateResponse>().user.is_verified);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_forgot_password_does_not_reveal_accounts(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool.clone()).await;

        let known = server
            .post("/api/auth/forgot-password")
            .json(&json!({"email": user.email}))
            .await;
        let unknown = server
            .post("/api/auth/forgot-password")
            .json(&json!({"email": "nobody@example.com"}))
            .await;

        known.assert_status_ok();
        unknown.assert_status_ok();
        assert_eq!(known.json::<MessageResponse>().message, unknown.json::<MessageResponse>().message);

        let tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tokens, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reset_password_flow(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let config = create_test_config();
        let (raw_token, token) = {
            let mut conn = pool.acquire().await.unwrap();
            PasswordResetTokens::new(&mut conn)
                .create_for_user(user.id, &config)
                .await
                .unwrap()
        };
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/reset-password")
            .json(&json!({"token_id": token.id, "token": "wrong", "new_password": "brand-new-password"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/api/auth/reset-password")
            .json(&json!({"token_id": token.id, "token": raw_token, "new_password": "brand-new-password"}))
            .await;
        response.assert_status_ok();

        // Single use
        let response = server
            .post("/api/auth/reset-password")
            .json(&json!({"token_id": token.id, "token": raw_token, "new_password": "another-password"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid or expired reset token");

        server
            .post("/api/auth/login")
            .json(&json!({"email": user.email, "password": "brand-new-password"}))
            .await
            .assert_status_ok();
        server
            .post("/api/auth/login")
            .json(&json!({"email": user.email, "password": TEST_PASSWORD}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
