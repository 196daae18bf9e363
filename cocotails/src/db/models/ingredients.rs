//! Database models for ingredients and their interactions.

use crate::types::IngredientId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Database response for an ingredient (one full row of `ingredients`).
#[derive(Debug, Clone, FromRow)]
pub struct IngredientDBResponse {
    pub id: IngredientId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub origin: Option<String>,
    pub calories_per_100g: Option<i32>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub vitamins: Value,
    pub minerals: Value,
    pub health_benefits: Vec<String>,
    pub antioxidant_level: Option<String>,
    pub glycemic_index: Option<i32>,
    pub flavor_profile: Vec<String>,
    pub aroma_notes: Vec<String>,
    pub color_hex: Option<String>,
    pub is_organic: bool,
    pub is_fair_trade: bool,
    pub is_local: bool,
    pub sustainability_score: Option<i32>,
    pub is_seasonal: bool,
    pub peak_season_months: Vec<i32>,
    pub preparation_methods: Vec<String>,
    pub storage_instructions: Option<String>,
    pub shelf_life_days: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_premium: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating an ingredient. Nutrition detail beyond
/// calories is optional and can be filled in later.
#[derive(Debug, Clone, Default)]
pub struct IngredientCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub origin: Option<String>,
    pub calories_per_100g: Option<i32>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub vitamins: Option<Value>,
    pub minerals: Option<Value>,
    pub health_benefits: Vec<String>,
    pub antioxidant_level: Option<String>,
    pub flavor_profile: Vec<String>,
    pub color_hex: Option<String>,
    pub is_organic: bool,
    pub is_seasonal: bool,
    pub peak_season_months: Vec<i32>,
}

/// Filter for listing active ingredients
#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    pub category: Option<String>,
    pub organic: Option<bool>,
    pub seasonal: Option<bool>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct IngredientInteractionDBResponse {
    pub id: Uuid,
    pub ingredient1_id: IngredientId,
    pub ingredient2_id: IngredientId,
    pub interaction_type: String,
    pub compatibility_score: Option<i32>,
    pub description: Option<String>,
    pub flavor_impact: Option<String>,
    pub health_impact: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngredientInteractionCreateDBRequest {
    pub ingredient1_id: IngredientId,
    pub ingredient2_id: IngredientId,
    /// One of `synergy`, `complement`, `avoid`
    pub interaction_type: String,
    pub compatibility_score: Option<i32>,
    pub description: Option<String>,
    pub flavor_impact: Option<String>,
    pub health_impact: Option<String>,
}
