//! API request/response models for virtual classes and bookings.

use super::pagination::{PageParams, PaginationMeta};
use crate::db::models::classes::{BookingDBResponse, VirtualClassDBResponse};
use crate::types::{BookingId, ClassId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListClassesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,

    /// `beginner`, `intermediate` or `advanced`
    pub difficulty: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub premium: Option<bool>,
}

/// Joining information, only shown to attendees with a confirmed booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeetingDetails {
    pub meeting_platform: String,
    pub meeting_url: Option<String>,
    pub meeting_id: Option<String>,
    pub meeting_password: Option<String>,
    pub recipe_pdf_url: Option<String>,
    pub shopping_list_url: Option<String>,
    pub preparation_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VirtualClassResponse {
    #[schema(value_type = String, format = "uuid")]
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
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub difficulty_level: String,
    pub equipment_needed: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub promo_video_url: Option<String>,
    pub status: String,
    pub is_premium: bool,
    pub is_recorded: bool,
    pub is_featured: bool,
    pub current_participants: i64,
    pub spots_remaining: i64,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_details: Option<MeetingDetails>,
}

impl VirtualClassResponse {
    /// Build the public view; `include_meeting` adds joining details.
    pub fn new(db: VirtualClassDBResponse, include_meeting: bool) -> Self {
        let spots_remaining = db.spots_remaining();
        let is_full = db.is_full();
        let meeting_details = include_meeting.then(|| MeetingDetails {
            meeting_platform: db.meeting_platform.clone(),
            meeting_url: db.meeting_url.clone(),
            meeting_id: db.meeting_id.clone(),
            meeting_password: db.meeting_password.clone(),
            recipe_pdf_url: db.recipe_pdf_url.clone(),
            shopping_list_url: db.shopping_list_url.clone(),
            preparation_notes: db.preparation_notes.clone(),
        });
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            instructor_name: db.instructor_name,
            instructor_bio: db.instructor_bio,
            instructor_image_url: db.instructor_image_url,
            scheduled_datetime: db.scheduled_datetime,
            duration_minutes: db.duration_minutes,
            timezone: db.timezone,
            max_participants: db.max_participants,
            price: db.price,
            currency: db.currency,
            difficulty_level: db.difficulty_level,
            equipment_needed: db.equipment_needed,
            tags: db.tags,
            image_url: db.image_url,
            promo_video_url: db.promo_video_url,
            status: db.status,
            is_premium: db.is_premium,
            is_recorded: db.is_recorded,
            is_featured: db.is_featured,
            current_participants: db.current_participants,
            spots_remaining,
            is_full,
            created_at: db.created_at,
            meeting_details,
        }
    }
}

impl From<VirtualClassDBResponse> for VirtualClassResponse {
    fn from(db: VirtualClassDBResponse) -> Self {
        Self::new(db, false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookingId,
    pub booking_reference: String,
    pub status: String,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    pub currency: String,
    pub attended: bool,
    pub attendance_duration_minutes: Option<i32>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub virtual_class: Option<VirtualClassResponse>,
}

impl BookingResponse {
    /// Confirmed bookings see the class meeting details.
    pub fn new(db: BookingDBResponse, class: Option<VirtualClassDBResponse>) -> Self {
        let include_meeting = db.status == "confirmed";
        Self {
            id: db.id,
            booking_reference: db.booking_reference,
            status: db.status,
            amount_paid: db.amount_paid,
            currency: db.currency,
            attended: db.attended,
            attendance_duration_minutes: db.attendance_duration_minutes,
            rating: db.rating,
            feedback: db.feedback,
            cancelled_at: db.cancelled_at,
            created_at: db.created_at,
            virtual_class: class.map(|c| VirtualClassResponse::new(c, include_meeting)),
        }
    }
}

// Envelopes

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassListResponse {
    pub classes: Vec<VirtualClassResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassEnvelope {
    pub class: VirtualClassResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingChangeResponse {
    pub message: String,
    pub booking: BookingResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingResponse>,
}
