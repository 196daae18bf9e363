//! Database repository for cocktails, their recipe lines and user favorites.

use crate::db::{
    errors::Result,
    models::cocktails::{
        CocktailCreateDBRequest, CocktailDBResponse, CocktailFilter, CocktailIngredientCreateDBRequest,
        CocktailIngredientDBResponse,
    },
};
use crate::types::{CocktailId, UserId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// Cocktail columns plus approved-review statistics.
const SELECT_COCKTAIL: &str = r#"
SELECT c.*, stats.average_rating, stats.review_count
FROM cocktails c
LEFT JOIN LATERAL (
    SELECT AVG(r.rating)::FLOAT8 AS average_rating, COUNT(*) AS review_count
    FROM cocktail_reviews r
    WHERE r.cocktail_id = c.id AND r.is_approved
) stats ON TRUE"#;

pub struct Cocktails<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a CocktailFilter) {
    query.push(" WHERE c.is_active = TRUE");
    if let Some(category) = &filter.category {
        query.push(" AND c.wellness_category = ").push_bind(category);
    }
    if let Some(difficulty) = &filter.difficulty {
        query.push(" AND c.difficulty_level = ").push_bind(difficulty);
    }
    if !filter.dietary_tags.is_empty() {
        query.push(" AND c.dietary_tags @> ").push_bind(&filter.dietary_tags);
    }
    if let Some(featured) = filter.featured {
        query.push(" AND c.is_featured = ").push_bind(featured);
    }
    if let Some(premium) = filter.premium {
        query.push(" AND c.is_premium = ").push_bind(premium);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query
            .push(" AND (c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl<'c> Cocktails<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &CocktailCreateDBRequest) -> Result<CocktailDBResponse> {
        let id = sqlx::query_scalar::<_, CocktailId>(
            r#"
            INSERT INTO cocktails (name, slug, description, instructions, calories_per_serving, servings,
                                   prep_time_minutes, health_benefits, dietary_tags, wellness_category,
                                   difficulty_level, flavor_profile, color_hex, image_url, is_featured, is_premium)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.instructions)
        .bind(request.calories_per_serving)
        .bind(request.servings)
        .bind(request.prep_time_minutes)
        .bind(&request.health_benefits)
        .bind(&request.dietary_tags)
        .bind(&request.wellness_category)
        .bind(&request.difficulty_level)
        .bind(&request.flavor_profile)
        .bind(&request.color_hex)
        .bind(&request.image_url)
        .bind(request.is_featured)
        .bind(request.is_premium)
        .fetch_one(&mut *self.db)
        .await?;

        let cocktail = sqlx::query_as::<_, CocktailDBResponse>(&format!("{SELECT_COCKTAIL} WHERE c.id = $1"))
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(cocktail)
    }

    /// Fetch a cocktail that is visible in the catalog.
    #[instrument(skip(self), fields(cocktail_id = %abbrev_uuid(&id)), err)]
    pub async fn get_active(&mut self, id: CocktailId) -> Result<Option<CocktailDBResponse>> {
        let cocktail = sqlx::query_as::<_, CocktailDBResponse>(&format!(
            "{SELECT_COCKTAIL} WHERE c.id = $1 AND c.is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(cocktail)
    }

    /// Featured first, then newest.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &CocktailFilter) -> Result<Vec<CocktailDBResponse>> {
        let mut query = QueryBuilder::new(SELECT_COCKTAIL);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY c.is_featured DESC, c.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let cocktails = query.build_query_as::<CocktailDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(cocktails)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CocktailFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM cocktails c");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn featured(&mut self, limit: i64) -> Result<Vec<CocktailDBResponse>> {
        let cocktails = sqlx::query_as::<_, CocktailDBResponse>(&format!(
            "{SELECT_COCKTAIL} WHERE c.is_active = TRUE AND c.is_featured = TRUE ORDER BY c.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(cocktails)
    }

    /// Distinct wellness categories of active cocktails.
    #[instrument(skip(self), err)]
    pub async fn categories(&mut self) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT wellness_category FROM cocktails
            WHERE is_active = TRUE AND wellness_category IS NOT NULL AND wellness_category <> ''
            ORDER BY wellness_category
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(categories)
    }

    /// Match the term against name, description, or any health benefit.
    #[instrument(skip(self), err)]
    pub async fn search(&mut self, term: &str, limit: i64) -> Result<Vec<CocktailDBResponse>> {
        let cocktails = sqlx::query_as::<_, CocktailDBResponse>(&format!(
            r#"{SELECT_COCKTAIL}
            WHERE c.is_active = TRUE
              AND (c.name ILIKE $1
                   OR c.description ILIKE $1
                   OR EXISTS (SELECT 1 FROM unnest(c.health_benefits) AS benefit WHERE benefit ILIKE $1))
            ORDER BY c.is_featured DESC, c.name ASC
            LIMIT $2"#
        ))
        .bind(format!("%{term}%"))
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(cocktails)
    }

    #[instrument(skip(self, request), fields(cocktail_id = %abbrev_uuid(&cocktail_id)), err)]
    pub async fn add_ingredient(
        &mut self,
        cocktail_id: CocktailId,
        request: &CocktailIngredientCreateDBRequest,
    ) -> Result<CocktailIngredientDBResponse> {
        let line = sqlx::query_as::<_, CocktailIngredientDBResponse>(
            r#"
            INSERT INTO cocktail_ingredients (cocktail_id, ingredient_id, quantity, unit, preparation_note,
                                              order_index, is_garnish, is_optional)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(cocktail_id)
        .bind(request.ingredient_id)
        .bind(request.quantity)
        .bind(&request.unit)
        .bind(&request.preparation_note)
        .bind(request.order_index)
        .bind(request.is_garnish)
        .bind(request.is_optional)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(line)
    }

    /// Recipe lines in recipe order.
    #[instrument(skip(self), fields(cocktail_id = %abbrev_uuid(&cocktail_id)), err)]
    pub async fn ingredients_for(&mut self, cocktail_id: CocktailId) -> Result<Vec<CocktailIngredientDBResponse>> {
        let lines = sqlx::query_as::<_, CocktailIngredientDBResponse>(
            "SELECT * FROM cocktail_ingredients WHERE cocktail_id = $1 ORDER BY order_index ASC, id ASC",
        )
        .bind(cocktail_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(lines)
    }

    /// Flip favorite membership; returns whether the cocktail is now a favorite.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), cocktail_id = %abbrev_uuid(&cocktail_id)), err)]
    pub async fn toggle_favorite(&mut self, user_id: UserId, cocktail_id: CocktailId) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM user_favorite_cocktails WHERE user_id = $1 AND cocktail_id = $2")
            .bind(user_id)
            .bind(cocktail_id)
            .execute(&mut *self.db)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO user_favorite_cocktails (user_id, cocktail_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(cocktail_id)
            .execute(&mut *self.db)
            .await?;
        Ok(true)
    }

    #[instrument(skip(self), err)]
    pub async fn is_favorite(&mut self, user_id: UserId, cocktail_id: CocktailId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_favorite_cocktails WHERE user_id = $1 AND cocktail_id = $2)",
        )
        .bind(user_id)
        .bind(cocktail_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(exists)
    }

    /// A user's active favorites, most recently added first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn favorites_of(&mut self, user_id: UserId, limit: Option<i64>) -> Result<Vec<CocktailDBResponse>> {
        let cocktails = sqlx::query_as::<_, CocktailDBResponse>(&format!(
            r#"{SELECT_COCKTAIL}
            JOIN user_favorite_cocktails f ON f.cocktail_id = c.id
            WHERE f.user_id = $1 AND c.is_active = TRUE
            ORDER BY f.created_at DESC
            LIMIT $2"#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(cocktails)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_favorites(&mut self, user_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM user_favorite_cocktails f
            JOIN cocktails c ON c.id = f.cocktail_id
            WHERE f.user_id = $1 AND c.is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_cocktail, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_ordering(pool: PgPool) {
        let plain = create_test_cocktail(&pool, "Green Goddess", false).await;
        let featured = create_test_cocktail(&pool, "Golden Elixir", true).await;

        sqlx::query("UPDATE cocktails SET dietary_tags = ARRAY['vegan', 'keto'] WHERE id = $1")
            .bind(plain.id)
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Cocktails::new(&mut conn);

        let all = CocktailFilter {
            limit: 10,
            ..Default::default()
        };
        let listed = repo.list(&all).await.unwrap();
        assert_eq!(listed[0].id, featured.id, "featured cocktails come first");
        assert_eq!(repo.count(&all).await.unwrap(), 2);

        let tagged = CocktailFilter {
            dietary_tags: vec!["vegan".to_string(), "keto".to_string()],
            limit: 10,
            ..Default::default()
        };
        let listed = repo.list(&tagged).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, plain.id);

        let partly_tagged = CocktailFilter {
            dietary_tags: vec!["vegan".to_string(), "paleo".to_string()],
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&partly_tagged).await.unwrap(), 0);

        let search = CocktailFilter {
            search: Some("golden".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.list(&search).await.unwrap()[0].id, featured.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_cocktails_are_hidden(pool: PgPool) {
        let cocktail = create_test_cocktail(&pool, "Retired Spritz", false).await;
        sqlx::query("UPDATE cocktails SET is_active = FALSE WHERE id = $1")
            .bind(cocktail.id)
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Cocktails::new(&mut conn);
        assert!(repo.get_active(cocktail.id).await.unwrap().is_none());
        assert!(repo.search("Retired", 20).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_matches_health_benefits(pool: PgPool) {
        create_test_cocktail(&pool, "Green Goddess", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Cocktails::new(&mut conn);
        let found = repo.search("immune", 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].review_count, 0);
        assert!(found[0].average_rating.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_toggle_favorite_alternates(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let cocktail = create_test_cocktail(&pool, "Green Goddess", false).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Cocktails::new(&mut conn);

        assert!(repo.toggle_favorite(user.id, cocktail.id).await.unwrap());
        assert!(repo.is_favorite(user.id, cocktail.id).await.unwrap());
        assert_eq!(repo.count_favorites(user.id).await.unwrap(), 1);
        assert_eq!(repo.favorites_of(user.id, None).await.unwrap().len(), 1);

        assert!(!repo.toggle_favorite(user.id, cocktail.id).await.unwrap());
        assert!(!repo.is_favorite(user.id, cocktail.id).await.unwrap());

        assert!(repo.toggle_favorite(user.id, cocktail.id).await.unwrap());
    }
}
