//! Database repositories for private event inquiries and the event showcase
//! (packages and testimonials).

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::private_events::{
        EventInquiryCreateDBRequest, EventInquiryDBResponse, EventInquiryFilter, EventInquiryUpdateDBRequest,
        EventPackageCreateDBRequest, EventPackageDBResponse, EventTestimonialCreateDBRequest,
        EventTestimonialDBResponse,
    },
};
use crate::types::{InquiryId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub struct EventInquiries<'c> {
    db: &'c mut PgConnection,
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a EventInquiryFilter) {
    query.push(" WHERE 1=1");
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for EventInquiries<'c> {
    type CreateRequest = EventInquiryCreateDBRequest;
    type UpdateRequest = EventInquiryUpdateDBRequest;
    type Response = EventInquiryDBResponse;
    type Id = InquiryId;
    type Filter = EventInquiryFilter;

    #[instrument(skip(self, request), fields(event_type = %request.event_type, guests = request.number_of_guests), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let inquiry = sqlx::query_as::<_, EventInquiryDBResponse>(
            r#"
            INSERT INTO private_event_inquiries (event_type, event_date, event_time, number_of_guests,
                                                 drink_categories, dietary_requirements, contact_name,
                                                 contact_email, contact_phone, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&request.event_type)
        .bind(request.event_date)
        .bind(request.event_time)
        .bind(request.number_of_guests)
        .bind(&request.drink_categories)
        .bind(&request.dietary_requirements)
        .bind(&request.contact_name)
        .bind(&request.contact_email)
        .bind(&request.contact_phone)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(inquiry)
    }

    #[instrument(skip(self), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let inquiry =
            sqlx::query_as::<_, EventInquiryDBResponse>("SELECT * FROM private_event_inquiries WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(inquiry)
    }

    /// Newest first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM private_event_inquiries");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let inquiries = query
            .build_query_as::<EventInquiryDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(inquiries)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM private_event_inquiries");
        push_filter(&mut query, filter);
        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let inquiry = sqlx::query_as::<_, EventInquiryDBResponse>(
            r#"
            UPDATE private_event_inquiries SET
                status = COALESCE($2, status),
                admin_notes = COALESCE($3, admin_notes),
                estimated_quote = COALESCE($4, estimated_quote),
                priority = COALESCE($5, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.status)
        .bind(&request.admin_notes)
        .bind(request.estimated_quote)
        .bind(&request.priority)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(inquiry)
    }
}

impl<'c> EventInquiries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

/// Read side of the event showcase, plus inserts for seeding.
pub struct EventShowcase<'c> {
    db: &'c mut PgConnection,
}

impl<'c> EventShowcase<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create_package(&mut self, request: &EventPackageCreateDBRequest) -> Result<EventPackageDBResponse> {
        let package = sqlx::query_as::<_, EventPackageDBResponse>(
            r#"
            INSERT INTO event_packages (name, slug, description, price_per_person, features, max_guests, min_guests,
                                        service_hours, cocktail_count, custom_menu_design, is_featured, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(request.price_per_person)
        .bind(&request.features)
        .bind(request.max_guests)
        .bind(request.min_guests)
        .bind(request.service_hours)
        .bind(request.cocktail_count)
        .bind(request.custom_menu_design)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(package)
    }

    /// Active packages by `sort_order`.
    #[instrument(skip(self), err)]
    pub async fn active_packages(&mut self) -> Result<Vec<EventPackageDBResponse>> {
        let packages = sqlx::query_as::<_, EventPackageDBResponse>(
            "SELECT * FROM event_packages WHERE is_active = TRUE ORDER BY sort_order ASC, name ASC",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(packages)
    }

    #[instrument(skip(self), err)]
    pub async fn package_by_slug(&mut self, slug: &str) -> Result<Option<EventPackageDBResponse>> {
        let package = sqlx::query_as::<_, EventPackageDBResponse>(
            "SELECT * FROM event_packages WHERE slug = $1 AND is_active = TRUE",
        )
        .bind(slug)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(package)
    }

    #[instrument(skip(self, request), fields(client = %request.client_name), err)]
    pub async fn create_testimonial(
        &mut self,
        request: &EventTestimonialCreateDBRequest,
    ) -> Result<EventTestimonialDBResponse> {
        let testimonial = sqlx::query_as::<_, EventTestimonialDBResponse>(
            r#"
            INSERT INTO event_testimonials (client_name, client_role, client_company, content, rating, event_type,
                                            is_featured, is_approved, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&request.client_name)
        .bind(&request.client_role)
        .bind(&request.client_company)
        .bind(&request.content)
        .bind(request.rating)
        .bind(&request.event_type)
        .bind(request.is_featured)
        .bind(request.is_approved)
        .bind(request.display_order)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(testimonial)
    }

    /// Approved testimonials by display order, newest first within a slot.
    #[instrument(skip(self), err)]
    pub async fn approved_testimonials(&mut self, featured_only: bool) -> Result<Vec<EventTestimonialDBResponse>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM event_testimonials WHERE is_approved = TRUE");
        if featured_only {
            query.push(" AND is_featured = TRUE");
        }
        query.push(" ORDER BY display_order ASC, created_at DESC");

        let testimonials = query
            .build_query_as::<EventTestimonialDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(testimonials)
    }

    #[instrument(skip(self), err)]
    pub async fn count_packages(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM event_packages")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}
