//! Database repository for ingredients.

use crate::db::{
    errors::Result,
    models::ingredients::{
        IngredientCreateDBRequest, IngredientDBResponse, IngredientFilter, IngredientInteractionCreateDBRequest,
        IngredientInteractionDBResponse,
    },
};
use crate::types::{IngredientId, abbrev_uuid};
use serde_json::json;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub struct Ingredients<'c> {
    db: &'c mut PgConnection,
}

/// Append the filter's WHERE conditions (always active-only).
fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a IngredientFilter) {
    query.push(" WHERE is_active = TRUE");
    if let Some(category) = &filter.category {
        query.push(" AND category = ").push_bind(category);
    }
    if let Some(organic) = filter.organic {
        query.push(" AND is_organic = ").push_bind(organic);
    }
    if let Some(seasonal) = filter.seasonal {
        query.push(" AND is_seasonal = ").push_bind(seasonal);
    }
    if let Some(search) = &filter.search {
        query.push(" AND name ILIKE ").push_bind(format!("%{search}%"));
    }
}

impl<'c> Ingredients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &IngredientCreateDBRequest) -> Result<IngredientDBResponse> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>(
            r#"
            INSERT INTO ingredients (name, slug, description, category, origin, calories_per_100g, protein_g,
                                     carbs_g, fiber_g, vitamins, minerals, health_benefits, antioxidant_level,
                                     flavor_profile, color_hex, is_organic, is_seasonal, peak_season_months)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.origin)
        .bind(request.calories_per_100g)
        .bind(request.protein_g)
        .bind(request.carbs_g)
        .bind(request.fiber_g)
        .bind(request.vitamins.clone().unwrap_or_else(|| json!({})))
        .bind(request.minerals.clone().unwrap_or_else(|| json!({})))
        .bind(&request.health_benefits)
        .bind(&request.antioxidant_level)
        .bind(&request.flavor_profile)
        .bind(&request.color_hex)
        .bind(request.is_organic)
        .bind(request.is_seasonal)
        .bind(&request.peak_season_months)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ingredient)
    }

    /// Fetch an active ingredient.
    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    pub async fn get_active(&mut self, id: IngredientId) -> Result<Option<IngredientDBResponse>> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>("SELECT * FROM ingredients WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(ingredient)
    }

    /// Fetch several ingredients at once, regardless of `is_active`.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn get_many(&mut self, ids: &[IngredientId]) -> Result<Vec<IngredientDBResponse>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ingredients = sqlx::query_as::<_, IngredientDBResponse>("SELECT * FROM ingredients WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(ingredients)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &IngredientFilter) -> Result<Vec<IngredientDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM ingredients");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let ingredients = query.build_query_as::<IngredientDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(ingredients)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &IngredientFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM ingredients");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Distinct categories of active ingredients, alphabetically.
    #[instrument(skip(self), err)]
    pub async fn categories(&mut self) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM ingredients WHERE is_active = TRUE AND category <> '' ORDER BY category",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(categories)
    }

    #[instrument(skip(self, request), err)]
    pub async fn add_interaction(
        &mut self,
        request: &IngredientInteractionCreateDBRequest,
    ) -> Result<IngredientInteractionDBResponse> {
        let interaction = sqlx::query_as::<_, IngredientInteractionDBResponse>(
            r#"
            INSERT INTO ingredient_interactions (ingredient1_id, ingredient2_id, interaction_type, compatibility_score,
                                                 description, flavor_impact, health_impact)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.ingredient1_id)
        .bind(request.ingredient2_id)
        .bind(&request.interaction_type)
        .bind(request.compatibility_score)
        .bind(&request.description)
        .bind(&request.flavor_impact)
        .bind(&request.health_impact)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(interaction)
    }

    /// Interactions where the ingredient appears on either side.
    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    pub async fn interactions_for(&mut self, id: IngredientId) -> Result<Vec<IngredientInteractionDBResponse>> {
        let interactions = sqlx::query_as::<_, IngredientInteractionDBResponse>(
            r#"
            SELECT * FROM ingredient_interactions
            WHERE ingredient1_id = $1 OR ingredient2_id = $1
            ORDER BY compatibility_score DESC NULLS LAST, created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(interactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn request(name: &str, category: &str, organic: bool) -> IngredientCreateDBRequest {
        IngredientCreateDBRequest {
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            category: category.to_string(),
            is_organic: organic,
            health_benefits: vec!["Hydration".to_string()],
            ..Default::default()
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filtering_and_ordering(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Ingredients::new(&mut conn);

        repo.create(&request("Turmeric", "spice", true)).await.unwrap();
        repo.create(&request("Coconut Water", "base", true)).await.unwrap();
        repo.create(&request("Ginger", "spice", false)).await.unwrap();

        let all = IngredientFilter {
            limit: 10,
            ..Default::default()
        };
        let names: Vec<_> = repo.list(&all).await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Coconut Water", "Ginger", "Turmeric"]);

        let organic_spices = IngredientFilter {
            category: Some("spice".to_string()),
            organic: Some(true),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&organic_spices).await.unwrap(), 1);

        let search = IngredientFilter {
            search: Some("GIN".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.list(&search).await.unwrap()[0].name, "Ginger");

        assert_eq!(repo.categories().await.unwrap(), vec!["base".to_string(), "spice".to_string()]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_interactions_are_found_from_both_sides(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Ingredients::new(&mut conn);

        let turmeric = repo.create(&request("Turmeric", "spice", true)).await.unwrap();
        let pepper = repo.create(&request("Black Pepper", "spice", false)).await.unwrap();
        repo.add_interaction(&IngredientInteractionCreateDBRequest {
            ingredient1_id: turmeric.id,
            ingredient2_id: pepper.id,
            interaction_type: "synergy".to_string(),
            compatibility_score: Some(9),
            description: Some("Piperine boosts curcumin absorption".to_string()),
            flavor_impact: None,
            health_impact: None,
        })
        .await
        .unwrap();

        assert_eq!(repo.interactions_for(turmeric.id).await.unwrap().len(), 1);
        assert_eq!(repo.interactions_for(pepper.id).await.unwrap().len(), 1);
        assert_eq!(repo.get_many(&[turmeric.id, pepper.id]).await.unwrap().len(), 2);
        assert!(repo.get_active(turmeric.id).await.unwrap().is_some());
    }
}
