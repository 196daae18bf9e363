//! API request/response models for cocktails, reviews and favorites.

use super::ingredients::IngredientSummary;
use super::pagination::{PageParams, PaginationMeta};
use crate::db::models::cocktails::{CocktailDBResponse, CocktailIngredientDBResponse, ReviewDBResponse};
use crate::db::models::ingredients::IngredientDBResponse;
use crate::types::{CocktailId, ReviewId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Round to one decimal place, treating "no ratings" as 0.
pub fn rounded_rating(average: Option<f64>) -> f64 {
    average.map(|avg| (avg * 10.0).round() / 10.0).unwrap_or(0.0)
}

/// Query parameters for listing cocktails.
///
/// `dietary_tags` may be repeated (`?dietary_tags=vegan&dietary_tags=keto`) and
/// is read from the raw query string by the handler, so it is only documented here.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCocktailsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,

    /// Wellness category
    pub category: Option<String>,

    /// `beginner`, `intermediate` or `advanced`
    pub difficulty: Option<String>,

    /// Filled from the raw query string; every tag must be present
    #[serde(skip)]
    pub dietary_tags: Vec<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub featured: Option<bool>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub premium: Option<bool>,

    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FeaturedQuery {
    /// Number of cocktails (default 6, max 20)
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Search term (required)
    pub q: Option<String>,
    /// Maximum results (default 20, max 50)
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One line of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailIngredientResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub ingredient: Option<IngredientSummary>,
    pub quantity: f64,
    pub unit: String,
    pub preparation_note: Option<String>,
    pub order_index: i32,
    pub is_garnish: bool,
    pub is_optional: bool,
}

impl CocktailIngredientResponse {
    pub fn resolve(db: CocktailIngredientDBResponse, ingredients: &[IngredientDBResponse]) -> Self {
        Self {
            id: db.id,
            ingredient: ingredients
                .iter()
                .find(|i| i.id == db.ingredient_id)
                .map(IngredientSummary::from),
            quantity: db.quantity,
            unit: db.unit,
            preparation_note: db.preparation_note,
            order_index: db.order_index,
            is_garnish: db.is_garnish,
            is_optional: db.is_optional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailResponse {
    #[schema(value_type = String, format = "uuid")]
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
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Approved reviews only, one decimal
    pub average_rating: f64,
    pub review_count: i64,
    /// Recipe lines; only present on the detail view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<CocktailIngredientResponse>>,
}

impl From<CocktailDBResponse> for CocktailResponse {
    fn from(db: CocktailDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            instructions: db.instructions,
            calories_per_serving: db.calories_per_serving,
            servings: db.servings,
            prep_time_minutes: db.prep_time_minutes,
            health_benefits: db.health_benefits,
            dietary_tags: db.dietary_tags,
            wellness_category: db.wellness_category,
            difficulty_level: db.difficulty_level,
            flavor_profile: db.flavor_profile,
            color_hex: db.color_hex,
            image_url: db.image_url,
            video_url: db.video_url,
            is_featured: db.is_featured,
            is_seasonal: db.is_seasonal,
            is_premium: db.is_premium,
            meta_title: db.meta_title,
            meta_description: db.meta_description,
            created_at: db.created_at,
            updated_at: db.updated_at,
            average_rating: rounded_rating(db.average_rating),
            review_count: db.review_count,
            ingredients: None,
        }
    }
}

impl CocktailResponse {
    pub fn with_ingredients(mut self, ingredients: Vec<CocktailIngredientResponse>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewAuthor {
    pub username: String,
    pub first_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub cocktail_id: CocktailId,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub user: ReviewAuthor,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDBResponse> for ReviewResponse {
    fn from(db: ReviewDBResponse) -> Self {
        Self {
            id: db.id,
            cocktail_id: db.cocktail_id,
            rating: db.rating,
            title: db.title,
            comment: db.comment,
            is_approved: db.is_approved,
            user: ReviewAuthor {
                username: db.username,
                first_name: db.first_name,
            },
            created_at: db.created_at,
        }
    }
}

/// Body for submitting a review. `rating` is kept loosely typed so that a
/// missing or non-integer value yields the same message as an out-of-range one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreate {
    #[schema(value_type = Option<i64>)]
    pub rating: Option<serde_json::Value>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewApproval {
    pub is_approved: bool,
}

// Envelopes

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailListResponse {
    pub cocktails: Vec<CocktailResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailEnvelope {
    pub cocktail: CocktailResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailsResponse {
    pub cocktails: Vec<CocktailResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CocktailSearchResponse {
    pub cocktails: Vec<CocktailResponse>,
    pub query: String,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewResponse>,
    pub pagination: PaginationMeta,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreatedResponse {
    pub message: String,
    pub review: ReviewResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewEnvelope {
    pub review: ReviewResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteToggleResponse {
    pub message: String,
    pub is_favorite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_round_to_one_decimal() {
        assert_eq!(rounded_rating(None), 0.0);
        assert_eq!(rounded_rating(Some(4.0)), 4.0);
        assert_eq!(rounded_rating(Some(4.666)), 4.7);
        assert_eq!(rounded_rating(Some(3.34)), 3.3);
    }

    #[test]
    fn list_query_ignores_repeated_tags() {
        let query: ListCocktailsQuery =
            serde_urlencoded::from_str("featured=true&difficulty=beginner&dietary_tags=vegan&per_page=5").unwrap();
        assert_eq!(query.featured, Some(true));
        assert_eq!(query.difficulty.as_deref(), Some("beginner"));
        assert_eq!(query.pagination.per_page, Some(5));
        assert!(query.dietary_tags.is_empty());
    }
}
