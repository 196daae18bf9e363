//! Database models for cocktails, their recipes, reviews and favorites.

use crate::types::{CocktailId, IngredientId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A cocktail row together with its approved-review statistics.
#[derive(Debug, Clone, FromRow)]
pub struct CocktailDBResponse {
    pub id: CocktailId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub instructions: String,
    pub calories_per_serving: i32,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub health_benefits: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub wellness_category: Option<String>,
    pub difficulty_level: String,
    pub flavor_profile: Vec<String>,
    pub color_hex: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub is_featured: bool,
    pub is_seasonal: bool,
    pub is_premium: bool,
    pub is_active: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mean rating over approved reviews, `None` without any
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CocktailCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub instructions: String,
    pub calories_per_serving: i32,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub health_benefits: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub wellness_category: Option<String>,
    pub difficulty_level: String,
    pub flavor_profile: Vec<String>,
    pub color_hex: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub is_premium: bool,
}

/// Filter for listing active cocktails
#[derive(Debug, Clone, Default)]
pub struct CocktailFilter {
    /// Wellness category
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Every tag must be present on the cocktail
    pub dietary_tags: Vec<String>,
    pub featured: Option<bool>,
    pub premium: Option<bool>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// One recipe line: the join row between a cocktail and an ingredient.
#[derive(Debug, Clone, FromRow)]
pub struct CocktailIngredientDBResponse {
    pub id: Uuid,
    pub cocktail_id: CocktailId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    pub order_index: i32,
    pub is_garnish: bool,
    pub is_optional: bool,
}

#[derive(Debug, Clone)]
pub struct CocktailIngredientCreateDBRequest {
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    pub order_index: i32,
    pub is_garnish: bool,
    pub is_optional: bool,
}

/// A review joined with the reviewer's public name fields.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub cocktail_id: CocktailId,
    pub user_id: UserId,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub first_name: String,
}

#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub cocktail_id: CocktailId,
    pub user_id: UserId,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdateDBRequest {
    pub is_approved: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub cocktail_id: Option<CocktailId>,
    pub user_id: Option<UserId>,
    /// Restrict to approved reviews
    pub approved_only: bool,
    pub skip: i64,
    pub limit: i64,
}
