//! Database repositories for locations and contact inquiries.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::locations::{
        ContactInquiryCreateDBRequest, ContactInquiryDBResponse, ContactInquiryFilter, ContactInquiryUpdateDBRequest,
        LocationCreateDBRequest, LocationDBResponse,
    },
};
use crate::types::{ContactInquiryId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub struct Locations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Locations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fails with a unique violation on `locations_slug_key` for a taken slug.
    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &LocationCreateDBRequest) -> Result<LocationDBResponse> {
        let location = sqlx::query_as::<_, LocationDBResponse>(
            r#"
            INSERT INTO locations (name, slug, description, street_address, city, postal_code, country, latitude,
                                   longitude, phone, email, website, business_hours, social_media, parking_info,
                                   public_transport_info, driving_directions, is_active, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.street_address)
        .bind(&request.city)
        .bind(&request.postal_code)
        .bind(&request.country)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.website)
        .bind(&request.business_hours)
        .bind(&request.social_media)
        .bind(&request.parking_info)
        .bind(&request.public_transport_info)
        .bind(&request.driving_directions)
        .bind(request.is_active)
        .bind(request.is_primary)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(location)
    }

    /// The primary active location, falling back to the oldest active one.
    #[instrument(skip(self), err)]
    pub async fn primary(&mut self) -> Result<Option<LocationDBResponse>> {
        let location = sqlx::query_as::<_, LocationDBResponse>(
            "SELECT * FROM locations WHERE is_active = TRUE ORDER BY is_primary DESC, created_at ASC LIMIT 1",
        )
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(location)
    }

    #[instrument(skip(self), err)]
    pub async fn active(&mut self) -> Result<Vec<LocationDBResponse>> {
        let locations = sqlx::query_as::<_, LocationDBResponse>(
            "SELECT * FROM locations WHERE is_active = TRUE ORDER BY is_primary DESC, name ASC",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(locations)
    }

    #[instrument(skip(self), err)]
    pub async fn by_slug(&mut self, slug: &str) -> Result<Option<LocationDBResponse>> {
        let location =
            sqlx::query_as::<_, LocationDBResponse>("SELECT * FROM locations WHERE slug = $1 AND is_active = TRUE")
                .bind(slug)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(location)
    }

    #[instrument(skip(self), err)]
    pub async fn slug_exists(&mut self, slug: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM locations WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }
}

pub struct ContactInquiries<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a ContactInquiryFilter) {
    query.push(" WHERE 1=1");
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(inquiry_type) = &filter.inquiry_type {
        query.push(" AND inquiry_type = ").push_bind(inquiry_type);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ContactInquiries<'c> {
    type CreateRequest = ContactInquiryCreateDBRequest;
    type UpdateRequest = ContactInquiryUpdateDBRequest;
    type Response = ContactInquiryDBResponse;
    type Id = ContactInquiryId;
    type Filter = ContactInquiryFilter;

    #[instrument(skip(self, request), fields(inquiry_type = %request.inquiry_type), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let inquiry = sqlx::query_as::<_, ContactInquiryDBResponse>(
            r#"
            INSERT INTO contact_inquiries (name, email, phone, subject, message, inquiry_type, location_id,
                                           user_agent, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(&request.inquiry_type)
        .bind(request.location_id)
        .bind(&request.user_agent)
        .bind(&request.ip_address)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(inquiry)
    }

    #[instrument(skip(self), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let inquiry = sqlx::query_as::<_, ContactInquiryDBResponse>("SELECT * FROM contact_inquiries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(inquiry)
    }

    /// Newest first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM contact_inquiries");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let inquiries = query
            .build_query_as::<ContactInquiryDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(inquiries)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM contact_inquiries");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let inquiry = sqlx::query_as::<_, ContactInquiryDBResponse>(
            r#"
            UPDATE contact_inquiries SET
                status = COALESCE($2, status),
                admin_response = COALESCE($3, admin_response),
                responded_at = CASE WHEN $3 IS NOT NULL THEN NOW() ELSE responded_at END,
                responded_by = CASE WHEN $3 IS NOT NULL THEN $4 ELSE responded_by END,
                priority = COALESCE($5, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.status)
        .bind(&request.admin_response)
        .bind(&request.responded_by)
        .bind(&request.priority)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(inquiry)
    }
}

impl<'c> ContactInquiries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
