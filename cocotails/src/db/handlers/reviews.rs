//! Database repository for cocktail reviews.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::cocktails::{ReviewCreateDBRequest, ReviewDBResponse, ReviewFilter, ReviewUpdateDBRequest},
};
use crate::types::{CocktailId, ReviewId, UserId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

const SELECT_REVIEW: &str = r#"
SELECT r.*, u.username, u.first_name
FROM cocktail_reviews r
JOIN users u ON u.id = r.user_id"#;

pub struct Reviews<'c> {
    db: &'c mut PgConnection,
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    query.push(" WHERE 1=1");
    if let Some(cocktail_id) = filter.cocktail_id {
        query.push(" AND r.cocktail_id = ").push_bind(cocktail_id);
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND r.user_id = ").push_bind(user_id);
    }
    if filter.approved_only {
        query.push(" AND r.is_approved = TRUE");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Reviews<'c> {
    type CreateRequest = ReviewCreateDBRequest;
    type UpdateRequest = ReviewUpdateDBRequest;
    type Response = ReviewDBResponse;
    type Id = ReviewId;
    type Filter = ReviewFilter;

    /// Fails with a unique violation on `cocktail_reviews_user_cocktail_key`
    /// when the user has already reviewed the cocktail.
    #[instrument(skip(self, request), fields(cocktail_id = %abbrev_uuid(&request.cocktail_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = sqlx::query_scalar::<_, ReviewId>(
            r#"
            INSERT INTO cocktail_reviews (cocktail_id, user_id, rating, title, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(request.cocktail_id)
        .bind(request.user_id)
        .bind(request.rating)
        .bind(&request.title)
        .bind(&request.comment)
        .fetch_one(&mut *self.db)
        .await?;

        let review = sqlx::query_as::<_, ReviewDBResponse>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(review)
    }

    #[instrument(skip(self), fields(review_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(review)
    }

    /// Newest first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_REVIEW);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY r.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let reviews = query.build_query_as::<ReviewDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(reviews)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM cocktail_reviews r");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(review_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query("UPDATE cocktail_reviews SET is_approved = COALESCE($2, is_approved), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(request.is_approved)
            .execute(&mut *self.db)
            .await?;

        let review = sqlx::query_as::<_, ReviewDBResponse>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(review)
    }
}

impl<'c> Reviews<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists_for(&mut self, user_id: UserId, cocktail_id: CocktailId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM cocktail_reviews WHERE user_id = $1 AND cocktail_id = $2)",
        )
        .bind(user_id)
        .bind(cocktail_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(exists)
    }

    /// Mean rating of approved reviews, `None` when there are none.
    #[instrument(skip(self), fields(cocktail_id = %abbrev_uuid(&cocktail_id)), err)]
    pub async fn average_rating(&mut self, cocktail_id: CocktailId) -> Result<Option<f64>> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(rating)::FLOAT8 FROM cocktail_reviews WHERE cocktail_id = $1 AND is_approved = TRUE",
        )
        .bind(cocktail_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(average)
    }
}
