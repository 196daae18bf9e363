//! API request/response models for users and authentication.

use crate::api::models::classes::BookingResponse;
use crate::api::models::cocktails::CocktailResponse;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::{Operation, Resource, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub is_admin: bool,
}

impl CurrentUser {
    /// Fail with 403 unless the caller is an admin.
    pub fn require_admin(&self, action: Operation, resource: Resource) -> Result<(), Error> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::InsufficientPermissions { action, resource })
        }
    }
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            username: db.username.clone(),
            first_name: db.first_name.clone(),
            is_admin: db.is_admin,
        }
    }
}

// Request models

/// Fields are optional at the serde level so missing ones produce a
/// "Missing required field" message rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[schema(value_type = String, format = "uuid")]
    pub token_id: Uuid,
    pub token: String,
    pub new_password: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub health_goals: Option<Vec<String>>,
}

// Response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub dietary_preferences: Vec<String>,
    pub health_goals: Vec<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_premium: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            full_name: format!("{} {}", db.first_name, db.last_name),
            id: db.id,
            email: db.email,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            phone: db.phone,
            date_of_birth: db.date_of_birth,
            dietary_preferences: db.dietary_preferences,
            health_goals: db.health_goals,
            is_active: db.is_active,
            is_verified: db.is_verified,
            is_premium: db.is_premium,
            is_admin: db.is_admin,
            created_at: db.created_at,
            last_login: db.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoritesResponse {
    pub favorites: Vec<CocktailResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatistics {
    pub favorites_count: i64,
    pub reviews_count: i64,
    pub bookings_count: i64,
    pub active_subscriptions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub statistics: DashboardStatistics,
    /// Up to five most recently favorited cocktails
    pub recent_favorites: Vec<CocktailResponse>,
    /// Up to three confirmed bookings for classes that have not started yet
    pub upcoming_classes: Vec<BookingResponse>,
}

pub const DIETARY_PREFERENCES: [&str; 10] = [
    "Vegan",
    "Vegetarian",
    "Gluten-Free",
    "Keto",
    "Paleo",
    "Low-Carb",
    "Low-Sugar",
    "Dairy-Free",
    "Nut-Free",
    "Organic-Only",
];

pub const HEALTH_GOALS: [&str; 10] = [
    "Weight Management",
    "Energy Boost",
    "Immune Support",
    "Stress Relief",
    "Better Sleep",
    "Digestive Health",
    "Skin Health",
    "Heart Health",
    "Mental Clarity",
    "Detox",
];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreferencesResponse {
    pub dietary_preferences: Vec<String>,
    pub health_goals: Vec<String>,
}

impl Default for PreferencesResponse {
    fn default() -> Self {
        Self {
            dietary_preferences: DIETARY_PREFERENCES.iter().map(|s| s.to_string()).collect(),
            health_goals: HEALTH_GOALS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            first_name: "Ana".to_string(),
            is_admin,
        }
    }

    #[test]
    fn require_admin_rejects_regular_users() {
        let err = user(false)
            .require_admin(Operation::Moderate, Resource::Reviews)
            .unwrap_err();
        assert_eq!(err.user_message(), "Insufficient permissions to moderate reviews");
        assert!(user(true).require_admin(Operation::Moderate, Resource::Reviews).is_ok());
    }

    #[test]
    fn register_request_tolerates_missing_fields() {
        let request: RegisterRequest = serde_json::from_str(r#"{"email": "a@b.co"}"#).unwrap();
        assert_eq!(request.email.as_deref(), Some("a@b.co"));
        assert!(request.password.is_none());
        assert!(request.dietary_preferences.is_empty());
    }
}
