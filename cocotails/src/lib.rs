//! # cocotails: backend for the SOBRE healthy cocktail bar
//!
//! `cocotails` serves the JSON API behind the SOBRE website: a browsable catalog
//! of alcohol-free cocktails and their ingredients, reviews and favorites,
//! monthly box subscriptions, paid virtual classes, private event inquiries and
//! the venue's contact form.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); all state lives in
//! PostgreSQL and is reached through [sqlx].
//!
//! A request under `/api/*` is matched to a handler in [`api::handlers`]. Handlers
//! that need a caller take a [`api::models::users::CurrentUser`], which is built
//! from the bearer JWT in the `Authorization` header (see [`auth`]). The handler
//! validates its input, opens a transaction, composes the repositories from
//! [`db::handlers`] it needs, and commits once. Emails triggered by a request
//! (inquiry confirmations, password resets) are sent from a spawned task after
//! the commit, so a mail outage never fails the request.
//!
//! Invariants that must hold under concurrent requests, such as one active
//! subscription per user, one review per user and cocktail, or a class never
//! being overbooked, are backed by database constraints or row locks rather
//! than by the handlers alone.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use cocotails::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = cocotails::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     cocotails::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
mod notifications;
mod openapi;
pub mod seed;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{config::CorsOrigin, openapi::ApiDoc};
use axum::{
    Router,
    extract::OriginalUri,
    http::{self, HeaderValue, Method},
    routing::{get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::UserId;

/// Shared state handed to every request handler.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Embedded migrations from `migrations/`.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

async fn connect(config: &config::DatabaseConfig) -> anyhow::Result<PgPool> {
    let settings = &config.pool;
    let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero(settings.idle_timeout_secs))
        .max_lifetime(non_zero(settings.max_lifetime_secs))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// Run migrations and the startup seeding on `pool`.
#[instrument(skip_all)]
async fn prepare_database(config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    seed::ensure_admin_user(config, pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure admin user: {e}"))?;

    if config.seed_demo_data {
        seed::seed_demo_data(pool).await?;
    }
    Ok(())
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let mut origins = Vec::new();
    for origin in &cors_config.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Unmatched paths get the same JSON error body as everything else.
async fn not_found(OriginalUri(uri): OriginalUri) -> errors::Error {
    errors::Error::not_found("Endpoint", uri.path())
}

/// Every `/api` route, relative to `/api`.
fn api_routes() -> Router<AppState> {
    use api::handlers::{auth, classes, cocktails, ingredients, location, private_events, subscriptions, users};

    Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        // Users
        .route("/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/users/favorites", get(users::get_favorites))
        .route("/users/dashboard", get(users::get_dashboard))
        .route("/users/preferences", get(users::get_preferences))
        // Cocktails; static segments win over `{id}`
        .route("/cocktails", get(cocktails::list_cocktails))
        .route("/cocktails/featured", get(cocktails::featured_cocktails))
        .route("/cocktails/categories", get(cocktails::cocktail_categories))
        .route("/cocktails/search", get(cocktails::search_cocktails))
        .route("/cocktails/{id}", get(cocktails::get_cocktail))
        .route(
            "/cocktails/{id}/reviews",
            get(cocktails::list_reviews).post(cocktails::create_review),
        )
        .route("/cocktails/{id}/favorite", post(cocktails::toggle_favorite))
        .route("/cocktails/reviews/{id}/approval", put(cocktails::moderate_review))
        // Ingredients
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/categories", get(ingredients::ingredient_categories))
        .route("/ingredients/{id}", get(ingredients::get_ingredient))
        // Subscriptions
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route("/subscriptions/plans", get(subscriptions::list_plans))
        .route("/subscriptions/{id}/cancel", post(subscriptions::cancel_subscription))
        .route("/subscriptions/{id}/deliveries", get(subscriptions::list_deliveries))
        // Virtual classes
        .route("/classes", get(classes::list_classes))
        .route("/classes/my-bookings", get(classes::my_bookings))
        .route("/classes/{id}", get(classes::get_class))
        .route("/classes/{id}/book", post(classes::book_class))
        .route("/classes/bookings/{id}/cancel", post(classes::cancel_booking))
        // Private events
        .route("/private-events/inquiry", post(private_events::submit_inquiry))
        .route("/private-events/inquiry/{id}/status", get(private_events::inquiry_status))
        .route("/private-events/packages", get(private_events::list_packages))
        .route("/private-events/packages/{slug}", get(private_events::get_package))
        .route("/private-events/testimonials", get(private_events::list_testimonials))
        .route(
            "/private-events/featured-testimonials",
            get(private_events::featured_testimonials),
        )
        .route("/private-events/admin/inquiries", get(private_events::admin_list_inquiries))
        .route(
            "/private-events/admin/inquiries/{id}",
            put(private_events::admin_update_inquiry),
        )
        // Location and contact
        .route("/location/info", get(location::location_info))
        .route("/location/all", get(location::all_locations))
        .route("/location/contact", post(location::submit_contact))
        .route("/location/business-hours", get(location::business_hours))
        .route("/location/directions", get(location::directions))
        .route("/location/admin/inquiries", get(location::admin_list_contacts))
        .route("/location/admin/inquiries/{id}", put(location::admin_update_contact))
        .route("/location/admin/locations", post(location::admin_create_location))
        .route("/location/{slug}", get(location::location_by_slug))
        // Documentation
        .route("/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}

/// Build the complete router: `/api/*`, `/healthz`, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Owns the router and the pool for the lifetime of the process.
///
/// 1. [`Application::new`] connects, migrates, ensures the admin account and
///    optionally seeds demo data
/// 2. [`Application::serve`] binds the configured address until the shutdown
///    future resolves, then closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Use `pool` instead of connecting to `config.database`; tests pass the
    /// pool `#[sqlx::test]` prepared.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => connect(&config.database).await?,
        };
        prepare_database(&config, &pool).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "cocotails listening on http://{}, API docs at http://localhost:{}/api/docs",
            bind_addr, self.config.port
        );

        // Peer addresses are recorded on contact inquiries
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
