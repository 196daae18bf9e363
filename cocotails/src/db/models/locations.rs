//! Database models for locations and contact inquiries.

use crate::types::{ContactInquiryId, LocationId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

pub const CONTACT_STATUSES: &[&str] = &["new", "read", "responded", "resolved", "archived"];

#[derive(Debug, Clone, FromRow)]
pub struct LocationDBResponse {
    pub id: LocationId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Day name to `{open, close, closed}`
    pub business_hours: Option<Value>,
    pub social_media: Option<Value>,
    pub parking_info: Option<String>,
    pub public_transport_info: Option<String>,
    pub driving_directions: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub business_hours: Option<Value>,
    pub social_media: Option<Value>,
    pub parking_info: Option<String>,
    pub public_transport_info: Option<String>,
    pub driving_directions: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContactInquiryDBResponse {
    pub id: ContactInquiryId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
    pub status: String,
    pub priority: String,
    pub location_id: Option<LocationId>,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactInquiryCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
    pub location_id: Option<LocationId>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// A present `admin_response` also stamps `responded_at` and `responded_by`.
#[derive(Debug, Clone, Default)]
pub struct ContactInquiryUpdateDBRequest {
    pub status: Option<String>,
    pub admin_response: Option<String>,
    pub responded_by: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactInquiryFilter {
    pub status: Option<String>,
    pub inquiry_type: Option<String>,
    pub skip: i64,
    pub limit: i64,
}
