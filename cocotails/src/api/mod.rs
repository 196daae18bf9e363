//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is mounted under `/api`:
//!
//! - **Authentication** (`/api/auth/*`): registration, tokens, password reset
//! - **Users** (`/api/users/*`): profile, favorites, dashboard
//! - **Cocktails** (`/api/cocktails/*`): catalog, reviews, favorites
//! - **Ingredients** (`/api/ingredients/*`): ingredient catalog
//! - **Subscriptions** (`/api/subscriptions/*`): plans and deliveries
//! - **Classes** (`/api/classes/*`): virtual classes and bookings
//! - **Private events** (`/api/private-events/*`): inquiries, packages, testimonials
//! - **Location** (`/api/location/*`): venue information and the contact form
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`. The rendered reference is served
//! at `/api/docs` and the raw document at `/api/openapi.json`.

pub mod handlers;
pub mod models;
