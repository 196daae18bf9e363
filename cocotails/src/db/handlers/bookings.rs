//! Database repository for class bookings.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::classes::{BookingCreateDBRequest, BookingDBResponse, BookingFilter, BookingUpdateDBRequest},
};
use crate::types::{BookingId, ClassId, UserId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub struct Bookings<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a BookingFilter) {
    query.push(" WHERE 1=1");
    if let Some(user_id) = filter.user_id {
        query.push(" AND b.user_id = ").push_bind(user_id);
    }
    if let Some(class_id) = filter.virtual_class_id {
        query.push(" AND b.virtual_class_id = ").push_bind(class_id);
    }
    if let Some(status) = &filter.status {
        query.push(" AND b.status = ").push_bind(status);
    }
    if let Some(after) = filter.upcoming_after {
        query
            .push(" AND EXISTS (SELECT 1 FROM virtual_classes vc WHERE vc.id = b.virtual_class_id AND vc.scheduled_datetime > ")
            .push_bind(after)
            .push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Bookings<'c> {
    type CreateRequest = BookingCreateDBRequest;
    type UpdateRequest = BookingUpdateDBRequest;
    type Response = BookingDBResponse;
    type Id = BookingId;
    type Filter = BookingFilter;

    /// Inserts a confirmed booking. Fails with a unique violation on
    /// `class_bookings_user_class_key` or `class_bookings_reference_key`.
    #[instrument(skip(self, request), fields(class_id = %abbrev_uuid(&request.virtual_class_id), reference = %request.booking_reference), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let booking = sqlx::query_as::<_, BookingDBResponse>(
            r#"
            INSERT INTO class_bookings (user_id, virtual_class_id, status, booking_reference, amount_paid, currency)
            VALUES ($1, $2, 'confirmed', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.virtual_class_id)
        .bind(&request.booking_reference)
        .bind(request.amount_paid)
        .bind(&request.currency)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(booking)
    }

    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let booking = sqlx::query_as::<_, BookingDBResponse>("SELECT * FROM class_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(booking)
    }

    /// Upcoming filters order by class start; otherwise newest booking first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT b.* FROM class_bookings b");
        push_filter(&mut query, filter);
        if filter.upcoming_after.is_some() {
            query.push(
                " ORDER BY (SELECT vc.scheduled_datetime FROM virtual_classes vc WHERE vc.id = b.virtual_class_id) ASC",
            );
        } else {
            query.push(" ORDER BY b.created_at DESC");
        }
        query
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let bookings = query.build_query_as::<BookingDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(bookings)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM class_bookings b");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(booking_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let booking = sqlx::query_as::<_, BookingDBResponse>(
            r#"
            UPDATE class_bookings SET
                status = COALESCE($2, status),
                cancelled_at = CASE WHEN $2 = 'cancelled' THEN NOW() ELSE cancelled_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.status)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(booking)
    }
}

impl<'c> Bookings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether the user holds any booking row for the class, whatever its status.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn exists_for(&mut self, user_id: UserId, class_id: ClassId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM class_bookings WHERE user_id = $1 AND virtual_class_id = $2)",
        )
        .bind(user_id)
        .bind(class_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(exists)
    }

    /// The user's confirmed booking for the class, if any.
    #[instrument(skip(self), err)]
    pub async fn confirmed_for(&mut self, user_id: UserId, class_id: ClassId) -> Result<Option<BookingDBResponse>> {
        let booking = sqlx::query_as::<_, BookingDBResponse>(
            "SELECT * FROM class_bookings WHERE user_id = $1 AND virtual_class_id = $2 AND status = 'confirmed'",
        )
        .bind(user_id)
        .bind(class_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(booking)
    }

    #[instrument(skip(self), err)]
    pub async fn reference_in_use(&mut self, reference: &str) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM class_bookings WHERE booking_reference = $1)")
                .bind(reference)
                .fetch_one(&mut *self.db)
                .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_class, create_test_user};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn booking(user_id: UserId, class_id: ClassId, reference: &str) -> BookingCreateDBRequest {
        BookingCreateDBRequest {
            user_id,
            virtual_class_id: class_id,
            booking_reference: reference.to_string(),
            amount_paid: Decimal::new(2500, 2),
            currency: "USD".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_one_booking_per_user_per_class(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let class = create_test_class(&pool, Utc::now() + Duration::days(3), 5).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);

        let created = repo.create(&booking(user.id, class.id, "ABCD1234")).await.unwrap();
        assert_eq!(created.status, "confirmed");
        assert!(repo.exists_for(user.id, class.id).await.unwrap());
        assert!(repo.reference_in_use("ABCD1234").await.unwrap());
        assert!(!repo.reference_in_use("ZZZZ9999").await.unwrap());

        let err = repo.create(&booking(user.id, class.id, "WXYZ5678")).await.unwrap_err();
        assert!(err.is_unique_violation_of("class_bookings_user_class_key"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_references_are_unique(pool: PgPool) {
        let first = create_test_user(&pool, false).await;
        let second = create_test_user(&pool, false).await;
        let class = create_test_class(&pool, Utc::now() + Duration::days(3), 5).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);

        repo.create(&booking(first.id, class.id, "SAME0001")).await.unwrap();
        let err = repo.create(&booking(second.id, class.id, "SAME0001")).await.unwrap_err();
        assert!(err.is_unique_violation_of("class_bookings_reference_key"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_frees_confirmed_count(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let class = create_test_class(&pool, Utc::now() + Duration::days(3), 5).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);

        let created = repo.create(&booking(user.id, class.id, "CANC0001")).await.unwrap();
        let confirmed = BookingFilter {
            virtual_class_id: Some(class.id),
            status: Some("confirmed".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(repo.count(&confirmed).await.unwrap(), 1);

        let cancelled = repo
            .update(
                created.id,
                &BookingUpdateDBRequest {
                    status: Some("cancelled".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(repo.count(&confirmed).await.unwrap(), 0);
        assert!(repo.confirmed_for(user.id, class.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upcoming_filter_orders_by_class_start(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let later = create_test_class(&pool, Utc::now() + Duration::days(10), 5).await;
        let sooner = create_test_class(&pool, Utc::now() + Duration::days(2), 5).await;
        let past = create_test_class(&pool, Utc::now() - Duration::days(2), 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Bookings::new(&mut conn);
        for (class, reference) in [(&later, "LATE0001"), (&sooner, "SOON0001"), (&past, "PAST0001")] {
            repo.create(&booking(user.id, class.id, reference)).await.unwrap();
        }

        let upcoming = repo
            .list(&BookingFilter {
                user_id: Some(user.id),
                status: Some("confirmed".to_string()),
                upcoming_after: Some(Utc::now()),
                limit: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        let classes: Vec<_> = upcoming.iter().map(|b| b.virtual_class_id).collect();
        assert_eq!(classes, vec![sooner.id, later.id]);
    }
}
