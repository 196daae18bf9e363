//! API request and response data models.
//!
//! These types define the public JSON contract and are kept apart from the
//! database rows in [`crate::db::models`]. Every type is annotated for `utoipa`
//! so it appears in the OpenAPI document.
//!
//! Create payloads usually declare their required fields as `Option` so that a
//! missing field can be reported by name instead of as a generic JSON error.

pub mod classes;
pub mod cocktails;
pub mod ingredients;
pub mod locations;
pub mod pagination;
pub mod private_events;
pub mod subscriptions;
pub mod users;
