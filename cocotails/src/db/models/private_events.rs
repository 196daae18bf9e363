//! Database models for private event inquiries, packages and testimonials.

use crate::types::{InquiryId, PackageId, TestimonialId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

pub const INQUIRY_STATUSES: &[&str] = &["pending", "contacted", "quoted", "booked", "completed", "cancelled"];
pub const PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];

#[derive(Debug, Clone, FromRow)]
pub struct EventInquiryDBResponse {
    pub id: InquiryId,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
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
    pub estimated_quote: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventInquiryCreateDBRequest {
    pub event_type: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub number_of_guests: i32,
    pub drink_categories: Vec<String>,
    pub dietary_requirements: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventInquiryUpdateDBRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
    pub estimated_quote: Option<Decimal>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventInquiryFilter {
    pub status: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventPackageDBResponse {
    pub id: PackageId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
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

#[derive(Debug, Clone, Default)]
pub struct EventPackageCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_per_person: Decimal,
    pub features: Vec<String>,
    pub max_guests: Option<i32>,
    pub min_guests: i32,
    pub service_hours: i32,
    pub cocktail_count: Option<i32>,
    pub custom_menu_design: bool,
    pub is_featured: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventTestimonialDBResponse {
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

#[derive(Debug, Clone, Default)]
pub struct EventTestimonialCreateDBRequest {
    pub client_name: String,
    pub client_role: Option<String>,
    pub client_company: Option<String>,
    pub content: String,
    pub rating: i32,
    pub event_type: Option<String>,
    pub is_featured: bool,
    pub is_approved: bool,
    pub display_order: i32,
}
