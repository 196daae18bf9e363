//! Database models for subscriptions and their deliveries.

use crate::types::{DeliveryId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionDBResponse {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_type: String,
    pub status: String,
    pub monthly_price: Decimal,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    /// `None` means unlimited
    pub monthly_ingredient_credits: Option<i32>,
    /// `None` means unlimited
    pub virtual_class_credits: Option<i32>,
    pub premium_recipes_access: bool,
    pub personal_mixologist_access: bool,
    pub ingredients_used_this_month: i32,
    pub classes_attended_this_month: i32,
    pub last_reset_date: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionCreateDBRequest {
    pub user_id: UserId,
    pub plan_type: String,
    pub monthly_price: Decimal,
    pub currency: String,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub monthly_ingredient_credits: Option<i32>,
    pub virtual_class_credits: Option<i32>,
    pub premium_recipes_access: bool,
    pub personal_mixologist_access: bool,
}

/// `None` leaves a column unchanged. Setting status to `cancelled` also
/// stamps `cancelled_at` and clears the next billing date.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdateDBRequest {
    pub status: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub user_id: Option<UserId>,
    pub status: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DeliveryDBResponse {
    pub id: DeliveryId,
    pub subscription_id: SubscriptionId,
    pub delivery_date: DateTime<Utc>,
    pub tracking_number: Option<String>,
    pub status: String,
    pub ingredients_included: Value,
    pub recipes_included: Value,
    pub total_value: Option<Decimal>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeliveryCreateDBRequest {
    pub subscription_id: SubscriptionId,
    pub delivery_date: DateTime<Utc>,
    pub ingredients_included: Value,
    pub recipes_included: Value,
    pub total_value: Option<Decimal>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}
