//! API request/response models for locations and contact inquiries.

use super::pagination::PageParams;
use crate::db::models::locations::{ContactInquiryDBResponse, LocationDBResponse};
use crate::types::{ContactInquiryId, LocationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

/// Opening hours served when no location has its own.
pub fn default_business_hours() -> Value {
    let weekday = json!({"open": "10:00", "close": "22:00", "closed": false});
    json!({
        "monday": weekday,
        "tuesday": weekday,
        "wednesday": weekday,
        "thursday": weekday,
        "friday": weekday,
        "saturday": weekday,
        "sunday": {"open": "12:00", "close": "20:00", "closed": false},
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    #[schema(value_type = String, format = "uuid")]
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
    #[schema(value_type = Option<Object>)]
    pub business_hours: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub social_media: Option<Value>,
    pub parking_info: Option<String>,
    pub public_transport_info: Option<String>,
    pub driving_directions: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocationDBResponse> for LocationResponse {
    fn from(db: LocationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            street_address: db.street_address,
            city: db.city,
            postal_code: db.postal_code,
            country: db.country,
            latitude: db.latitude,
            longitude: db.longitude,
            phone: db.phone,
            email: db.email,
            website: db.website,
            business_hours: db.business_hours,
            social_media: db.social_media,
            parking_info: db.parking_info,
            public_transport_info: db.public_transport_info,
            driving_directions: db.driving_directions,
            is_active: db.is_active,
            is_primary: db.is_primary,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// New location. Required fields are optional here so a missing one is
/// reported by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LocationCreate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub business_hours: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub social_media: Option<Value>,
    pub parking_info: Option<String>,
    pub public_transport_info: Option<String>,
    pub driving_directions: Option<String>,
    pub is_active: Option<bool>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Directions {
    pub address: Address,
    pub coordinates: Coordinates,
    pub parking_info: Option<String>,
    pub public_transport_info: Option<String>,
    pub driving_directions: Option<String>,
}

impl From<LocationDBResponse> for Directions {
    fn from(db: LocationDBResponse) -> Self {
        Self {
            address: Address {
                street: db.street_address,
                city: db.city,
                postal_code: db.postal_code,
                country: db.country,
            },
            coordinates: Coordinates {
                latitude: db.latitude,
                longitude: db.longitude,
            },
            parking_info: db.parking_info,
            public_transport_info: db.public_transport_info,
            driving_directions: db.driving_directions,
        }
    }
}

/// Contact form (camelCase keys, as posted by the website).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInquiryCreate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    /// Defaults to `general`
    pub inquiry_type: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmittedResponse {
    pub message: String,
    #[schema(value_type = String, format = "uuid")]
    pub inquiry_id: ContactInquiryId,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactInquiryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContactInquiryId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
    pub status: String,
    pub priority: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub location_id: Option<LocationId>,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactInquiryDBResponse> for ContactInquiryResponse {
    fn from(db: ContactInquiryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            subject: db.subject,
            message: db.message,
            inquiry_type: db.inquiry_type,
            status: db.status,
            priority: db.priority,
            location_id: db.location_id,
            admin_response: db.admin_response,
            responded_at: db.responded_at,
            responded_by: db.responded_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactInquiryUpdate {
    pub status: Option<String>,
    pub admin_response: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminContactQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,
    pub status: Option<String>,
    /// Inquiry type
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub inquiry_type: Option<String>,
}

// Envelopes

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationEnvelope {
    pub location: LocationResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationsResponse {
    pub locations: Vec<LocationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationCreatedResponse {
    pub message: String,
    pub location: LocationResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BusinessHoursResponse {
    #[schema(value_type = Object)]
    pub business_hours: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DirectionsResponse {
    pub directions: Directions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactInquiryPage {
    pub inquiries: Vec<ContactInquiryResponse>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactInquiryUpdatedResponse {
    pub message: String,
    pub inquiry: ContactInquiryResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hours_cover_the_week() {
        let hours = default_business_hours();
        assert_eq!(hours.as_object().unwrap().len(), 7);
        assert_eq!(hours["monday"]["open"], "10:00");
        assert_eq!(hours["sunday"]["close"], "20:00");
        assert_eq!(hours["saturday"]["closed"], false);
    }

    #[test]
    fn contact_form_reads_camel_case() {
        let form: ContactInquiryCreate = serde_json::from_value(json!({
            "name": "Sam",
            "email": "sam@example.com",
            "subject": "Partnership",
            "message": "Hello",
            "inquiryType": "partnership"
        }))
        .unwrap();
        assert_eq!(form.inquiry_type.as_deref(), Some("partnership"));
        assert!(form.location_id.is_none());
    }

    #[test]
    fn admin_query_reads_type() {
        let query: AdminContactQuery = serde_urlencoded::from_str("status=new&type=event").unwrap();
        assert_eq!(query.inquiry_type.as_deref(), Some("event"));
        assert_eq!(query.status.as_deref(), Some("new"));
    }
}
