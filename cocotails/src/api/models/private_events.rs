//! API request/response models for private events.

use super::pagination::PageParams;
use crate::db::models::private_events::{EventInquiryDBResponse, EventPackageDBResponse, EventTestimonialDBResponse};
use crate::types::{InquiryId, PackageId, TestimonialId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Event inquiry form, as posted by the website (camelCase keys).
///
/// Everything is optional at the type level so missing fields produce
/// `Missing required field: <name>` rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventInquiryCreate {
    pub event_type: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM`
    pub time: Option<String>,
    /// Number or numeric string
    #[schema(value_type = Option<i64>)]
    pub guests: Option<Value>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub drink_categories: Vec<String>,
    pub dietary_requirements: Option<String>,
    pub message: Option<String>,
}

impl EventInquiryCreate {
    /// `guests` rendered for the required-field check; blank when absent.
    pub fn guests_text(&self) -> Option<String> {
        match &self.guests {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// `guests` as an integer, if it is one.
    pub fn guest_count(&self) -> Option<i64> {
        match &self.guests {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InquirySubmittedResponse {
    pub message: String,
    #[schema(value_type = String, format = "uuid")]
    pub inquiry_id: InquiryId,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventInquiryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InquiryId,
    pub event_type: String,
    pub event_date: NaiveDate,
    /// `HH:MM`
    pub event_time: String,
    pub number_of_guests: i32,
    pub drink_categories: Vec<String>,
    pub dietary_requirements: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub message: Option<String>,
    pub status: String,
    pub priority: String,
    pub admin_notes: Option<String>,
    #[schema(value_type = Option<f64>)]
    #[serde(with = "rust_decimal::serde::float_option")]
    pub estimated_quote: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventInquiryDBResponse> for EventInquiryResponse {
    fn from(db: EventInquiryDBResponse) -> Self {
        Self {
            id: db.id,
            event_type: db.event_type,
            event_date: db.event_date,
            event_time: db.event_time.format("%H:%M").to_string(),
            number_of_guests: db.number_of_guests,
            drink_categories: db.drink_categories,
            dietary_requirements: db.dietary_requirements,
            contact_name: db.contact_name,
            contact_email: db.contact_email,
            contact_phone: db.contact_phone,
            message: db.message,
            status: db.status,
            priority: db.priority,
            admin_notes: db.admin_notes,
            estimated_quote: db.estimated_quote,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// What a client may see about their own inquiry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InquiryStatusResponse {
    #[schema(value_type = String, format = "uuid")]
    pub inquiry_id: InquiryId,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub event_date: NaiveDate,
    pub event_type: String,
}

impl From<EventInquiryDBResponse> for InquiryStatusResponse {
    fn from(db: EventInquiryDBResponse) -> Self {
        Self {
            inquiry_id: db.id,
            status: db.status,
            created_at: db.created_at,
            event_date: db.event_date,
            event_type: db.event_type,
        }
    }
}

/// Admin triage update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EventInquiryUpdate {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
    #[schema(value_type = Option<f64>)]
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub estimated_quote: Option<Decimal>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminInquiryQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,
    /// Only inquiries in this status
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventPackageResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PackageId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_person: Decimal,
    pub features: Vec<String>,
    pub max_guests: Option<i32>,
    pub min_guests: i32,
    pub service_hours: i32,
    pub cocktail_count: Option<i32>,
    pub includes_bartender: bool,
    pub includes_ingredients: bool,
    pub includes_equipment: bool,
    pub custom_menu_design: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventPackageDBResponse> for EventPackageResponse {
    fn from(db: EventPackageDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            price_per_person: db.price_per_person,
            features: db.features,
            max_guests: db.max_guests,
            min_guests: db.min_guests,
            service_hours: db.service_hours,
            cocktail_count: db.cocktail_count,
            includes_bartender: db.includes_bartender,
            includes_ingredients: db.includes_ingredients,
            includes_equipment: db.includes_equipment,
            custom_menu_design: db.custom_menu_design,
            is_active: db.is_active,
            is_featured: db.is_featured,
            sort_order: db.sort_order,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventTestimonialResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TestimonialId,
    pub client_name: String,
    pub client_role: Option<String>,
    pub client_company: Option<String>,
    pub content: String,
    pub rating: i32,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub is_featured: bool,
    pub is_approved: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventTestimonialDBResponse> for EventTestimonialResponse {
    fn from(db: EventTestimonialDBResponse) -> Self {
        Self {
            id: db.id,
            client_name: db.client_name,
            client_role: db.client_role,
            client_company: db.client_company,
            content: db.content,
            rating: db.rating,
            event_type: db.event_type,
            event_date: db.event_date,
            is_featured: db.is_featured,
            is_approved: db.is_approved,
            display_order: db.display_order,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

// Envelopes

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackagesResponse {
    pub packages: Vec<EventPackageResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageEnvelope {
    pub package: EventPackageResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestimonialsResponse {
    pub testimonials: Vec<EventTestimonialResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventInquiryPage {
    pub inquiries: Vec<EventInquiryResponse>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventInquiryUpdatedResponse {
    pub message: String,
    pub inquiry: EventInquiryResponse,
}
