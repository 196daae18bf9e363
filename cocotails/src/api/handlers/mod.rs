//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: registration, login, token refresh and password reset
//! - [`users`]: profile, favorites, dashboard and preference options
//! - [`cocktails`]: catalog browsing, reviews, favorites and moderation
//! - [`ingredients`]: ingredient catalog
//! - [`subscriptions`]: plan catalog, subscribing, cancelling and deliveries
//! - [`classes`]: class listing, booking and cancellation
//! - [`private_events`]: event inquiries, packages, testimonials and admin triage
//! - [`location`]: venue details, contact form and admin triage
//!
//! # Authentication
//!
//! Handlers take a [`crate::api::models::users::CurrentUser`] argument when
//! they need a caller, or `Option<CurrentUser>` when a caller is optional.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as a JSON body with
//! the matching status code.

pub mod auth;
pub mod classes;
pub mod cocktails;
pub mod ingredients;
pub mod location;
pub mod private_events;
pub mod subscriptions;
pub mod users;
