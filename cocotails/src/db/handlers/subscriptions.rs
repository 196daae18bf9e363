//! Database repository for subscriptions and their deliveries.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::subscriptions::{
        DeliveryCreateDBRequest, DeliveryDBResponse, SubscriptionCreateDBRequest, SubscriptionDBResponse,
        SubscriptionFilter, SubscriptionUpdateDBRequest,
    },
};
use crate::types::{SubscriptionId, UserId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a SubscriptionFilter) {
    query.push(" WHERE 1=1");
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Subscriptions<'c> {
    type CreateRequest = SubscriptionCreateDBRequest;
    type UpdateRequest = SubscriptionUpdateDBRequest;
    type Response = SubscriptionDBResponse;
    type Id = SubscriptionId;
    type Filter = SubscriptionFilter;

    /// Fails with a unique violation on `subscriptions_one_active_per_user`
    /// when the user already has an active subscription.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), plan = %request.plan_type), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            INSERT INTO subscriptions (user_id, plan_type, monthly_price, currency, next_billing_date,
                                       monthly_ingredient_credits, virtual_class_credits,
                                       premium_recipes_access, personal_mixologist_access)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.plan_type)
        .bind(request.monthly_price)
        .bind(&request.currency)
        .bind(request.next_billing_date)
        .bind(request.monthly_ingredient_credits)
        .bind(request.virtual_class_credits)
        .bind(request.premium_recipes_access)
        .bind(request.personal_mixologist_access)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscription)
    }

    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(subscription)
    }

    /// Newest first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM subscriptions");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let subscriptions = query
            .build_query_as::<SubscriptionDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(subscriptions)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM subscriptions");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(subscription_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            UPDATE subscriptions SET
                status = COALESCE($2, status),
                end_date = COALESCE($3, end_date),
                next_billing_date = CASE WHEN $2 = 'cancelled' THEN NULL ELSE COALESCE($4, next_billing_date) END,
                cancelled_at = CASE WHEN $2 = 'cancelled' THEN NOW() ELSE cancelled_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.status)
        .bind(request.end_date)
        .bind(request.next_billing_date)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(subscription)
    }
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Mark the user's `active` subscriptions whose end date has passed as `expired`.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn expire_lapsed(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = NOW()
            WHERE user_id = $1 AND status = 'active' AND end_date IS NOT NULL AND end_date <= NOW()
            "#,
        )
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }

    /// The user's current subscription: status active and not past its end date.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn active_for_user(&mut self, user_id: UserId) -> Result<Option<SubscriptionDBResponse>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            SELECT * FROM subscriptions
            WHERE user_id = $1 AND status = 'active' AND (end_date IS NULL OR end_date > NOW())
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(subscription)
    }

    #[instrument(skip(self, request), fields(subscription_id = %abbrev_uuid(&request.subscription_id)), err)]
    pub async fn add_delivery(&mut self, request: &DeliveryCreateDBRequest) -> Result<DeliveryDBResponse> {
        let delivery = sqlx::query_as::<_, DeliveryDBResponse>(
            r#"
            INSERT INTO subscription_deliveries (subscription_id, delivery_date, ingredients_included, recipes_included,
                                                 total_value, carrier, tracking_number, estimated_delivery)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.subscription_id)
        .bind(request.delivery_date)
        .bind(&request.ingredients_included)
        .bind(&request.recipes_included)
        .bind(request.total_value)
        .bind(&request.carrier)
        .bind(&request.tracking_number)
        .bind(request.estimated_delivery)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(delivery)
    }

    /// Most recent delivery first.
    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&subscription_id)), err)]
    pub async fn deliveries_for(&mut self, subscription_id: SubscriptionId) -> Result<Vec<DeliveryDBResponse>> {
        let deliveries = sqlx::query_as::<_, DeliveryDBResponse>(
            "SELECT * FROM subscription_deliveries WHERE subscription_id = $1 ORDER BY delivery_date DESC",
        )
        .bind(subscription_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    fn basic(user_id: UserId) -> SubscriptionCreateDBRequest {
        SubscriptionCreateDBRequest {
            user_id,
            plan_type: "basic".to_string(),
            monthly_price: Decimal::new(2999, 2),
            currency: "USD".to_string(),
            next_billing_date: Some(Utc::now() + Duration::days(30)),
            monthly_ingredient_credits: Some(3),
            virtual_class_credits: Some(0),
            premium_recipes_access: false,
            personal_mixologist_access: false,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_only_one_active_subscription(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Subscriptions::new(&mut conn);

        let first = repo.create(&basic(user.id)).await.unwrap();
        assert_eq!(first.status, "active");
        assert_eq!(first.monthly_price, Decimal::new(2999, 2));

        let err = repo.create(&basic(user.id)).await.unwrap_err();
        assert!(err.is_unique_violation_of("subscriptions_one_active_per_user"));

        let cancelled = repo
            .update(
                first.id,
                &SubscriptionUpdateDBRequest {
                    status: Some("cancelled".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cancelled.cancelled_at.is_some());
        assert!(cancelled.next_billing_date.is_none());
        assert!(repo.active_for_user(user.id).await.unwrap().is_none());

        repo.create(&basic(user.id)).await.unwrap();
        let filter = SubscriptionFilter {
            user_id: Some(user.id),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lapsed_subscription_expires(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Subscriptions::new(&mut conn);

        let subscription = repo.create(&basic(user.id)).await.unwrap();
        repo.update(
            subscription.id,
            &SubscriptionUpdateDBRequest {
                end_date: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(repo.active_for_user(user.id).await.unwrap().is_none());
        assert_eq!(repo.expire_lapsed(user.id).await.unwrap(), 1);
        let expired = repo.get_by_id(subscription.id).await.unwrap().unwrap();
        assert_eq!(expired.status, "expired");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deliveries_newest_first(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Subscriptions::new(&mut conn);

        let subscription = repo.create(&basic(user.id)).await.unwrap();
        for days_ago in [20, 5] {
            repo.add_delivery(&DeliveryCreateDBRequest {
                subscription_id: subscription.id,
                delivery_date: Utc::now() - Duration::days(days_ago),
                ingredients_included: json!([{"name": "Turmeric", "quantity": "50g"}]),
                recipes_included: json!([]),
                total_value: Some(Decimal::new(4500, 2)),
                carrier: Some("Colissimo".to_string()),
                tracking_number: None,
                estimated_delivery: None,
            })
            .await
            .unwrap();
        }

        let deliveries = repo.deliveries_for(subscription.id).await.unwrap();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries[0].delivery_date > deliveries[1].delivery_date);
        assert_eq!(deliveries[0].status, "pending");
    }
}
