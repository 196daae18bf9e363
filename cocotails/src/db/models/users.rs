//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub dietary_preferences: Vec<String>,
    pub health_goals: Vec<String>,
    pub is_admin: bool,
}

/// Database request for updating a user. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub dietary_preferences: Option<Vec<String>>,
    pub health_goals: Option<Vec<String>>,
    pub password_hash: Option<String>,
    pub is_verified: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub dietary_preferences: Vec<String>,
    pub health_goals: Vec<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_premium: bool,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
