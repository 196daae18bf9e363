//! API request/response models for subscription plans, subscriptions and deliveries.

use crate::db::models::subscriptions::{DeliveryDBResponse, SubscriptionDBResponse};
use crate::types::{DeliveryId, SubscriptionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Basic,
    Premium,
    Elite,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Basic, PlanType::Premium, PlanType::Elite];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Basic => "basic",
            PlanType::Premium => "premium",
            PlanType::Elite => "elite",
        }
    }

    /// Catalog entry for this plan.
    pub fn plan(&self) -> Plan {
        match self {
            PlanType::Basic => Plan {
                plan_type: *self,
                name: "Wellness Explorer",
                price: Decimal::new(2999, 2),
                currency: "USD",
                monthly_ingredient_credits: Some(3),
                virtual_class_credits: Some(0),
                premium_recipes_access: false,
                personal_mixologist_access: false,
                features: &[
                    "3 premium ingredient deliveries per month",
                    "5 exclusive healthy cocktail recipes",
                    "Basic nutritional guidance",
                    "Community forum access",
                ],
            },
            PlanType::Premium => Plan {
                plan_type: *self,
                name: "Mixology Master",
                price: Decimal::new(5999, 2),
                currency: "USD",
                monthly_ingredient_credits: Some(6),
                virtual_class_credits: Some(2),
                premium_recipes_access: true,
                personal_mixologist_access: false,
                features: &[
                    "6 premium ingredient deliveries per month",
                    "Unlimited healthy cocktail recipes",
                    "2 virtual mixology classes per month",
                    "Personal nutrition consultation",
                    "Priority customer support",
                ],
            },
            PlanType::Elite => Plan {
                plan_type: *self,
                name: "Wellness Connoisseur",
                price: Decimal::new(9999, 2),
                currency: "USD",
                monthly_ingredient_credits: None,
                virtual_class_credits: None,
                premium_recipes_access: true,
                personal_mixologist_access: true,
                features: &[
                    "Unlimited premium ingredient deliveries",
                    "All premium recipes and content",
                    "Unlimited virtual mixology classes",
                    "Personal mixologist consultation",
                    "24/7 concierge support",
                    "Exclusive seasonal collections",
                ],
            },
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanType::ALL.into_iter().find(|plan| plan.as_str() == s).ok_or(())
    }
}

/// A subscription tier as offered to customers. Credits of `None` are unlimited.
#[derive(Debug, Clone)]
pub struct Plan {
    pub plan_type: PlanType,
    pub name: &'static str,
    pub price: Decimal,
    pub currency: &'static str,
    pub monthly_ingredient_credits: Option<i32>,
    pub virtual_class_credits: Option<i32>,
    pub premium_recipes_access: bool,
    pub personal_mixologist_access: bool,
    pub features: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub plan_type: PlanType,
    pub name: String,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub features: Vec<String>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            plan_type: plan.plan_type,
            name: plan.name.to_string(),
            price: plan.price,
            currency: plan.currency.to_string(),
            features: plan.features.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// `plan_type` is parsed by the handler so an unknown value gets a readable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionCreate {
    pub plan_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubscriptionId,
    pub plan_type: String,
    pub status: String,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_price: Decimal,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub monthly_ingredient_credits: Option<i32>,
    pub virtual_class_credits: Option<i32>,
    pub premium_recipes_access: bool,
    pub personal_mixologist_access: bool,
    pub ingredients_used_this_month: i32,
    pub classes_attended_this_month: i32,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Status is active and the end date, if any, is in the future
    pub is_active: bool,
    /// Whole days until the end date; absent when open-ended
    pub days_remaining: Option<i64>,
}

impl SubscriptionResponse {
    pub fn at(db: SubscriptionDBResponse, now: DateTime<Utc>) -> Self {
        let is_active = db.status == "active" && db.end_date.is_none_or(|end| end > now);
        let days_remaining = db.end_date.map(|end| (end - now).num_days().max(0));
        Self {
            id: db.id,
            plan_type: db.plan_type,
            status: db.status,
            monthly_price: db.monthly_price,
            currency: db.currency,
            start_date: db.start_date,
            end_date: db.end_date,
            next_billing_date: db.next_billing_date,
            trial_end_date: db.trial_end_date,
            monthly_ingredient_credits: db.monthly_ingredient_credits,
            virtual_class_credits: db.virtual_class_credits,
            premium_recipes_access: db.premium_recipes_access,
            personal_mixologist_access: db.personal_mixologist_access,
            ingredients_used_this_month: db.ingredients_used_this_month,
            classes_attended_this_month: db.classes_attended_this_month,
            cancelled_at: db.cancelled_at,
            created_at: db.created_at,
            is_active,
            days_remaining,
        }
    }
}

impl From<SubscriptionDBResponse> for SubscriptionResponse {
    fn from(db: SubscriptionDBResponse) -> Self {
        Self::at(db, Utc::now())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DeliveryId,
    pub delivery_date: DateTime<Utc>,
    pub tracking_number: Option<String>,
    pub status: String,
    #[schema(value_type = Object)]
    pub ingredients_included: Value,
    #[schema(value_type = Object)]
    pub recipes_included: Value,
    #[schema(value_type = Option<f64>)]
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_value: Option<Decimal>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DeliveryDBResponse> for DeliveryResponse {
    fn from(db: DeliveryDBResponse) -> Self {
        Self {
            id: db.id,
            delivery_date: db.delivery_date,
            tracking_number: db.tracking_number,
            status: db.status,
            ingredients_included: db.ingredients_included,
            recipes_included: db.recipes_included,
            total_value: db.total_value,
            carrier: db.carrier,
            estimated_delivery: db.estimated_delivery,
            actual_delivery: db.actual_delivery,
            created_at: db.created_at,
        }
    }
}

// Envelopes

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlansResponse {
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionChangeResponse {
    pub message: String,
    pub subscription: SubscriptionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveriesResponse {
    pub deliveries: Vec<DeliveryResponse>,
}
