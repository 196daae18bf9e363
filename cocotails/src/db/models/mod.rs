//! Database record models matching table schemas.
//!
//! Row structs derive `sqlx::FromRow`; request structs carry exactly the
//! columns a repository writes. API models live separately in
//! [`crate::api::models`] and convert from these with `From`.
//!
//! - [`users`] and [`password_reset_tokens`]: accounts and credential recovery
//! - [`cocktails`]: cocktails, their ingredient lines and reviews
//! - [`ingredients`]: ingredients and pairwise interactions
//! - [`subscriptions`]: subscriptions and deliveries
//! - [`classes`]: virtual classes and bookings
//! - [`private_events`]: event inquiries, packages and testimonials
//! - [`locations`]: locations and contact inquiries

pub mod classes;
pub mod cocktails;
pub mod ingredients;
pub mod locations;
pub mod password_reset_tokens;
pub mod private_events;
pub mod subscriptions;
pub mod users;
