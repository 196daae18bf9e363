//! Database models for virtual classes and bookings.

use crate::types::{BookingId, ClassId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A class row plus its confirmed booking count.
#[derive(Debug, Clone, FromRow)]
pub struct VirtualClassDBResponse {
    pub id: ClassId,
    pub title: String,
    pub description: String,
    pub instructor_name: String,
    pub instructor_bio: Option<String>,
    pub instructor_image_url: Option<String>,
    pub scheduled_datetime: DateTime<Utc>,
    pub duration_minutes: i32,
    pub timezone: String,
    pub max_participants: i32,
    pub price: Decimal,
    pub currency: String,
    pub difficulty_level: String,
    pub equipment_needed: Vec<String>,
    pub tags: Vec<String>,
    pub meeting_platform: String,
    pub meeting_url: Option<String>,
    pub meeting_id: Option<String>,
    pub meeting_password: Option<String>,
    pub image_url: Option<String>,
    pub promo_video_url: Option<String>,
    pub recipe_pdf_url: Option<String>,
    pub shopping_list_url: Option<String>,
    pub preparation_notes: Option<String>,
    pub status: String,
    pub is_premium: bool,
    pub is_recorded: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_participants: i64,
}

impl VirtualClassDBResponse {
    pub fn spots_remaining(&self) -> i64 {
        (i64::from(self.max_participants) - self.current_participants).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= i64::from(self.max_participants)
    }

    /// Scheduled and not yet started.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "scheduled" && self.scheduled_datetime > now
    }
}

#[derive(Debug, Clone, Default)]
pub struct VirtualClassCreateDBRequest {
    pub title: String,
    pub description: String,
    pub instructor_name: String,
    pub instructor_bio: Option<String>,
    pub scheduled_datetime: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub price: Decimal,
    pub difficulty_level: String,
    pub equipment_needed: Vec<String>,
    pub tags: Vec<String>,
    pub meeting_url: Option<String>,
    pub meeting_id: Option<String>,
    pub meeting_password: Option<String>,
    pub preparation_notes: Option<String>,
    pub is_premium: bool,
    pub is_featured: bool,
}

/// Listing filter; only scheduled classes starting after `after` are returned.
#[derive(Debug, Clone, Default)]
pub struct VirtualClassFilter {
    pub after: DateTime<Utc>,
    pub difficulty: Option<String>,
    pub premium: Option<bool>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookingDBResponse {
    pub id: BookingId,
    pub user_id: UserId,
    pub virtual_class_id: ClassId,
    pub status: String,
    pub booking_reference: String,
    pub amount_paid: Decimal,
    pub currency: String,
    pub attended: bool,
    pub attendance_duration_minutes: Option<i32>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BookingCreateDBRequest {
    pub user_id: UserId,
    pub virtual_class_id: ClassId,
    pub booking_reference: String,
    pub amount_paid: Decimal,
    pub currency: String,
}

/// Status change for a booking; cancelling stamps `cancelled_at`.
#[derive(Debug, Clone, Default)]
pub struct BookingUpdateDBRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<UserId>,
    pub virtual_class_id: Option<ClassId>,
    pub status: Option<String>,
    /// Only bookings whose class starts after this instant
    pub upcoming_after: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}
