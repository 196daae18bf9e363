//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open
//! transaction) and returns models from [`crate::db::models`]. Handlers open a
//! transaction, build whichever repositories they need on it, and commit once.
//!
//! # Available Repositories
//!
//! - [`Users`]: accounts, credentials and login bookkeeping
//! - [`PasswordResetTokens`]: password reset token lifecycle
//! - [`Cocktails`]: catalog, ingredient lists and favorites
//! - [`Reviews`]: cocktail reviews and moderation
//! - [`Ingredients`]: ingredient catalog and pairings
//! - [`Subscriptions`]: plans held by users and their deliveries
//! - [`VirtualClasses`] and [`Bookings`]: class schedule and seat reservations
//! - [`EventInquiries`] and [`EventShowcase`]: private event intake and marketing content
//! - [`Locations`] and [`ContactInquiries`]: venue details and the contact form
//!
//! # Common Pattern
//!
//! ```ignore
//! use cocotails::db::handlers::{Repository, Reviews};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Reviews::new(&mut tx);
//!
//!     let review = repo.create(&request).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! Entities with a plain create/read/update lifecycle implement [`Repository`].
//! Catalog repositories only expose the queries the API needs as inherent methods.

pub mod bookings;
pub mod classes;
pub mod cocktails;
pub mod ingredients;
pub mod locations;
pub mod password_reset_tokens;
pub mod private_events;
pub mod repository;
pub mod reviews;
pub mod subscriptions;
pub mod users;

pub use bookings::Bookings;
pub use classes::VirtualClasses;
pub use cocktails::Cocktails;
pub use ingredients::Ingredients;
pub use locations::{ContactInquiries, Locations};
pub use password_reset_tokens::PasswordResetTokens;
pub use private_events::{EventInquiries, EventShowcase};
pub use repository::Repository;
pub use reviews::Reviews;
pub use subscriptions::Subscriptions;
pub use users::Users;
