//! Database repository for virtual classes.

use crate::db::{
    errors::Result,
    models::classes::{VirtualClassCreateDBRequest, VirtualClassDBResponse, VirtualClassFilter},
};
use crate::types::{ClassId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// Class columns plus the number of confirmed bookings.
pub(crate) const SELECT_CLASS: &str = r#"
SELECT vc.*, seats.current_participants
FROM virtual_classes vc
LEFT JOIN LATERAL (
    SELECT COUNT(*) AS current_participants
    FROM class_bookings b
    WHERE b.virtual_class_id = vc.id AND b.status = 'confirmed'
) seats ON TRUE"#;

pub struct VirtualClasses<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a VirtualClassFilter) {
    query
        .push(" WHERE vc.status = 'scheduled' AND vc.scheduled_datetime > ")
        .push_bind(filter.after);
    if let Some(difficulty) = &filter.difficulty {
        query.push(" AND vc.difficulty_level = ").push_bind(difficulty);
    }
    if let Some(premium) = filter.premium {
        query.push(" AND vc.is_premium = ").push_bind(premium);
    }
}

impl<'c> VirtualClasses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    pub async fn create(&mut self, request: &VirtualClassCreateDBRequest) -> Result<VirtualClassDBResponse> {
        let id = sqlx::query_scalar::<_, ClassId>(
            r#"
            INSERT INTO virtual_classes (title, description, instructor_name, instructor_bio, scheduled_datetime,
                                         duration_minutes, max_participants, price, difficulty_level,
                                         equipment_needed, tags, meeting_url, meeting_id, meeting_password,
                                         preparation_notes, is_premium, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.instructor_name)
        .bind(&request.instructor_bio)
        .bind(request.scheduled_datetime)
        .bind(request.duration_minutes)
        .bind(request.max_participants)
        .bind(request.price)
        .bind(&request.difficulty_level)
        .bind(&request.equipment_needed)
        .bind(&request.tags)
        .bind(&request.meeting_url)
        .bind(&request.meeting_id)
        .bind(&request.meeting_password)
        .bind(&request.preparation_notes)
        .bind(request.is_premium)
        .bind(request.is_featured)
        .fetch_one(&mut *self.db)
        .await?;

        let class = sqlx::query_as::<_, VirtualClassDBResponse>(&format!("{SELECT_CLASS} WHERE vc.id = $1"))
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(class)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ClassId) -> Result<Option<VirtualClassDBResponse>> {
        let class = sqlx::query_as::<_, VirtualClassDBResponse>(&format!("{SELECT_CLASS} WHERE vc.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(class)
    }

    /// Take a row lock on the class for the rest of the transaction, then read it
    /// with its seat count. Concurrent bookings of the same class queue here.
    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_booking(&mut self, id: ClassId) -> Result<Option<VirtualClassDBResponse>> {
        let locked = sqlx::query_scalar::<_, ClassId>("SELECT id FROM virtual_classes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Soonest first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &VirtualClassFilter) -> Result<Vec<VirtualClassDBResponse>> {
        let mut query = QueryBuilder::new(SELECT_CLASS);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY vc.scheduled_datetime ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let classes = query
            .build_query_as::<VirtualClassDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(classes)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &VirtualClassFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM virtual_classes vc");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn count_all(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM virtual_classes")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_class;
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_only_future_scheduled(pool: PgPool) {
        let upcoming = create_test_class(&pool, Utc::now() + Duration::days(7), 10).await;
        let later = create_test_class(&pool, Utc::now() + Duration::days(14), 10).await;
        create_test_class(&pool, Utc::now() - Duration::days(1), 10).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = VirtualClasses::new(&mut conn);

        let filter = VirtualClassFilter {
            after: Utc::now(),
            limit: 10,
            ..Default::default()
        };
        let classes = repo.list(&filter).await.unwrap();
        let ids: Vec<_> = classes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![upcoming.id, later.id]);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(repo.count_all().await.unwrap(), 3);

        let premium_only = VirtualClassFilter {
            premium: Some(true),
            ..filter
        };
        assert!(repo.list(&premium_only).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lock_for_booking(pool: PgPool) {
        let class = create_test_class(&pool, Utc::now() + Duration::days(7), 2).await;
        let mut tx = pool.begin().await.unwrap();
        let mut repo = VirtualClasses::new(&mut tx);

        let locked = repo.lock_for_booking(class.id).await.unwrap().unwrap();
        assert_eq!(locked.current_participants, 0);
        assert_eq!(locked.spots_remaining(), 2);
        assert!(!locked.is_full());
        assert!(locked.is_open_at(Utc::now()));

        assert!(repo.lock_for_booking(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }
}
