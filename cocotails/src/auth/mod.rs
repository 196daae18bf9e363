//! Authentication for the REST API.
//!
//! Accounts log in with email and password and receive a pair of JWTs: an
//! access token sent as `Authorization: Bearer <token>` on every authenticated
//! request, and a refresh token exchanged at `/api/auth/refresh` for a new
//! access token. Tokens are stateless; logging out is a client-side concern.
//!
//! Authorization is coarse. A route is public, requires any signed-in user, or
//! requires an admin; see [`CurrentUser::require_admin`]. Ownership of
//! subscriptions and bookings is enforced by filtering on the caller's id.
//!
//! # Modules
//!
//! - [`current_user`]: `CurrentUser` extractor (required and optional)
//! - [`password`]: Argon2 hashing, length rules, reset tokens
//! - [`session`]: JWT creation and verification
//! - [`utils`]: booking reference generation
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use cocotails::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.first_name)
//! }
//!
//! async fn personalised_handler(current_user: Option<CurrentUser>) -> String {
//!     current_user.map(|u| u.username).unwrap_or_else(|| "guest".to_string())
//! }
//! ```
//!
//! [`CurrentUser::require_admin`]: crate::api::models::users::CurrentUser::require_admin

pub mod current_user;
pub mod password;
pub mod session;
pub mod utils;
