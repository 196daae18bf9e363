//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::users::CurrentUser;
use crate::auth::password::{Argon2Params, hash_string_with_params};
use crate::auth::session;
use crate::config::{Config, EmailTransportConfig, PoolSettings};
use crate::db::{
    handlers::{Cocktails, Ingredients, Locations, Repository, Users, VirtualClasses},
    models::{
        classes::{VirtualClassCreateDBRequest, VirtualClassDBResponse},
        cocktails::{CocktailCreateDBRequest, CocktailDBResponse},
        ingredients::{IngredientCreateDBRequest, IngredientDBResponse},
        locations::{LocationCreateDBRequest, LocationDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Password every user from [`create_test_user`] can log in with.
pub const TEST_PASSWORD: &str = "password123";

/// Full application router over `pool`, with the test config.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("cocotails-test-emails-{}", std::process::id()));

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    // Cheap hashing keeps the suite fast
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    config
}

pub async fn create_test_user(pool: &PgPool, is_admin: bool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let user_id = Uuid::new_v4();
    let prefix = if is_admin { "testadmin" } else { "testuser" };
    let username = format!("{prefix}_{}", user_id.simple());
    let email = format!("{username}@example.com");

    let password_config = &create_test_config().auth.password;
    let password_hash =
        hash_string_with_params(TEST_PASSWORD, Argon2Params::from(password_config)).expect("Failed to hash password");

    let user_create = UserCreateDBRequest {
        email,
        username,
        password_hash,
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        dietary_preferences: vec![],
        health_goals: vec![],
        is_admin,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// `Authorization` header carrying a fresh access token for `user`.
pub fn add_auth_headers(user: &UserDBResponse) -> Vec<(String, String)> {
    let token = session::create_access_token(&CurrentUser::from(user), &create_test_config())
        .expect("Failed to create access token");
    vec![("authorization".to_string(), format!("Bearer {token}"))]
}

/// An active cocktail with a slug derived from `name` plus a random suffix.
pub async fn create_test_cocktail(pool: &PgPool, name: &str, featured: bool) -> CocktailDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let slug = format!("{}-{}", name.to_lowercase().replace(' ', "-"), &Uuid::new_v4().simple().to_string()[..8]);

    Cocktails::new(&mut conn)
        .create(&CocktailCreateDBRequest {
            name: name.to_string(),
            slug,
            description: format!("{name}, shaken with fresh juice"),
            instructions: "Shake with ice and strain.".to_string(),
            calories_per_serving: 90,
            servings: 1,
            prep_time_minutes: 5,
            health_benefits: vec!["Immune Support".to_string()],
            dietary_tags: vec![],
            wellness_category: Some("Immunity".to_string()),
            difficulty_level: "beginner".to_string(),
            is_featured: featured,
            ..Default::default()
        })
        .await
        .expect("Failed to create test cocktail")
}

pub async fn create_test_ingredient(pool: &PgPool, name: &str, category: &str) -> IngredientDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let slug = format!("{}-{}", name.to_lowercase().replace(' ', "-"), &Uuid::new_v4().simple().to_string()[..8]);

    Ingredients::new(&mut conn)
        .create(&IngredientCreateDBRequest {
            name: name.to_string(),
            slug,
            category: category.to_string(),
            calories_per_100g: Some(40),
            health_benefits: vec!["Rich in Vitamin C".to_string()],
            ..Default::default()
        })
        .await
        .expect("Failed to create test ingredient")
}

pub async fn create_test_class(
    pool: &PgPool,
    scheduled_at: DateTime<Utc>,
    max_participants: i32,
) -> VirtualClassDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    VirtualClasses::new(&mut conn)
        .create(&VirtualClassCreateDBRequest {
            title: "Citrus Mocktails 101".to_string(),
            description: "Build three bright, low-sugar drinks.".to_string(),
            instructor_name: "Maya Chen".to_string(),
            scheduled_datetime: scheduled_at,
            duration_minutes: 60,
            max_participants,
            price: Decimal::new(2500, 2),
            difficulty_level: "beginner".to_string(),
            meeting_url: Some("https://meet.example.com/citrus".to_string()),
            meeting_id: Some("123-456".to_string()),
            meeting_password: Some("lime".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create test class")
}

pub async fn create_test_location(pool: &PgPool, slug: &str, is_primary: bool) -> LocationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    Locations::new(&mut conn)
        .create(&LocationCreateDBRequest {
            name: format!("SOBRE {slug}"),
            slug: slug.to_string(),
            street_address: "Boulevard de la Plage".to_string(),
            city: "Arcachon".to_string(),
            postal_code: "33120".to_string(),
            country: "France".to_string(),
            latitude: 44.6586,
            longitude: -1.1689,
            parking_info: Some("Free parking behind the building".to_string()),
            is_active: true,
            is_primary,
            ..Default::default()
        })
        .await
        .expect("Failed to create test location")
}
