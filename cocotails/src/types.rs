//! Common type definitions shared across the API and database layers.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures read as what
//! they identify:
//!
//! - [`UserId`]: user account
//! - [`CocktailId`], [`IngredientId`], [`ReviewId`]: catalog entities
//! - [`SubscriptionId`], [`DeliveryId`]: subscriptions and their deliveries
//! - [`ClassId`], [`BookingId`]: virtual classes and bookings
//! - [`InquiryId`], [`PackageId`], [`TestimonialId`]: private events
//! - [`LocationId`], [`ContactInquiryId`]: locations and contact requests
//!
//! # Access control
//!
//! Authorization in this service is coarse: a route is public, requires any
//! authenticated user, or requires an admin. Row ownership is enforced by the
//! repositories filtering on `user_id`. [`Resource`] and [`Operation`] name what
//! was refused when an admin check fails.

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type CocktailId = Uuid;
pub type IngredientId = Uuid;
pub type ReviewId = Uuid;
pub type SubscriptionId = Uuid;
pub type DeliveryId = Uuid;
pub type ClassId = Uuid;
pub type BookingId = Uuid;
pub type InquiryId = Uuid;
pub type PackageId = Uuid;
pub type TestimonialId = Uuid;
pub type LocationId = Uuid;
pub type ContactInquiryId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Reviews,
    EventInquiries,
    ContactInquiries,
    Locations,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Moderate => write!(f, "moderate"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Reviews => write!(f, "reviews"),
            Resource::EventInquiries => write!(f, "event inquiries"),
            Resource::ContactInquiries => write!(f, "contact inquiries"),
            Resource::Locations => write!(f, "locations"),
        }
    }
}
