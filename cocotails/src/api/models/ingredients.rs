//! API request/response models for ingredients.

use super::pagination::{PageParams, PaginationMeta};
use crate::db::models::ingredients::{IngredientDBResponse, IngredientInteractionDBResponse};
use crate::types::IngredientId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query parameters for listing ingredients
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListIngredientsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,

    pub category: Option<String>,

    /// Only organic (`true`) or only non-organic (`false`) ingredients
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub organic: Option<bool>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub seasonal: Option<bool>,

    /// Case-insensitive substring of the ingredient name
    pub search: Option<String>,
}

/// Ingredient as shown in listings and inside cocktail recipes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: IngredientId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub origin: Option<String>,
    pub health_benefits: Vec<String>,
    pub flavor_profile: Vec<String>,
    pub color_hex: Option<String>,
    pub is_organic: bool,
    pub is_fair_trade: bool,
    pub is_local: bool,
    pub is_seasonal: bool,
    pub image_url: Option<String>,
    pub is_premium: bool,
}

impl From<&IngredientDBResponse> for IngredientSummary {
    fn from(db: &IngredientDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name.clone(),
            slug: db.slug.clone(),
            description: db.description.clone(),
            category: db.category.clone(),
            subcategory: db.subcategory.clone(),
            origin: db.origin.clone(),
            health_benefits: db.health_benefits.clone(),
            flavor_profile: db.flavor_profile.clone(),
            color_hex: db.color_hex.clone(),
            is_organic: db.is_organic,
            is_fair_trade: db.is_fair_trade,
            is_local: db.is_local,
            is_seasonal: db.is_seasonal,
            image_url: db.image_url.clone(),
            is_premium: db.is_premium,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NutritionalSummary {
    pub calories_per_100g: Option<i32>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub antioxidant_level: Option<String>,
    pub health_benefits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientInteractionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub ingredient1: Option<IngredientSummary>,
    pub ingredient2: Option<IngredientSummary>,
    pub interaction_type: String,
    pub compatibility_score: Option<i32>,
    pub description: Option<String>,
    pub flavor_impact: Option<String>,
    pub health_impact: Option<String>,
}

impl IngredientInteractionResponse {
    /// Build from a row, resolving both sides from the given ingredients.
    pub fn resolve(db: IngredientInteractionDBResponse, ingredients: &[IngredientDBResponse]) -> Self {
        let find = |id: IngredientId| ingredients.iter().find(|i| i.id == id).map(IngredientSummary::from);
        Self {
            id: db.id,
            ingredient1: find(db.ingredient1_id),
            ingredient2: find(db.ingredient2_id),
            interaction_type: db.interaction_type,
            compatibility_score: db.compatibility_score,
            description: db.description,
            flavor_impact: db.flavor_impact,
            health_impact: db.health_impact,
        }
    }
}

/// Full ingredient view with nutrition, sourcing and interactions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub summary: IngredientSummary,
    pub calories_per_100g: Option<i32>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    #[schema(value_type = Object)]
    pub vitamins: Value,
    #[schema(value_type = Object)]
    pub minerals: Value,
    pub antioxidant_level: Option<String>,
    pub glycemic_index: Option<i32>,
    pub aroma_notes: Vec<String>,
    pub sustainability_score: Option<i32>,
    pub peak_season_months: Vec<i32>,
    pub preparation_methods: Vec<String>,
    pub storage_instructions: Option<String>,
    pub shelf_life_days: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub nutritional_summary: NutritionalSummary,
    pub interactions: Vec<IngredientInteractionResponse>,
}

impl IngredientDetail {
    pub fn new(db: IngredientDBResponse, interactions: Vec<IngredientInteractionResponse>) -> Self {
        Self {
            summary: IngredientSummary::from(&db),
            nutritional_summary: NutritionalSummary {
                calories_per_100g: db.calories_per_100g,
                protein_g: db.protein_g,
                carbs_g: db.carbs_g,
                fiber_g: db.fiber_g,
                antioxidant_level: db.antioxidant_level.clone(),
                health_benefits: db.health_benefits.clone(),
            },
            calories_per_100g: db.calories_per_100g,
            protein_g: db.protein_g,
            carbs_g: db.carbs_g,
            fiber_g: db.fiber_g,
            sugar_g: db.sugar_g,
            fat_g: db.fat_g,
            sodium_mg: db.sodium_mg,
            vitamins: db.vitamins,
            minerals: db.minerals,
            antioxidant_level: db.antioxidant_level,
            glycemic_index: db.glycemic_index,
            aroma_notes: db.aroma_notes,
            sustainability_score: db.sustainability_score,
            peak_season_months: db.peak_season_months,
            preparation_methods: db.preparation_methods,
            storage_instructions: db.storage_instructions,
            shelf_life_days: db.shelf_life_days,
            meta_title: db.meta_title,
            meta_description: db.meta_description,
            created_at: db.created_at,
            updated_at: db.updated_at,
            interactions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientListResponse {
    pub ingredients: Vec<IngredientSummary>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientEnvelope {
    pub ingredient: IngredientDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_parses_flags() {
        let query: ListIngredientsQuery = serde_urlencoded::from_str("organic=true&seasonal=false&page=2").unwrap();
        assert_eq!(query.organic, Some(true));
        assert_eq!(query.seasonal, Some(false));
        assert_eq!(query.pagination.page, Some(2));
        assert!(query.category.is_none());
    }
}
