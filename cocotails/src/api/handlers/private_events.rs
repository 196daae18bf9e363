use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime, Utc};

use crate::{
    AppState,
    api::models::{
        private_events::{
            AdminInquiryQuery, EventInquiryCreate, EventInquiryPage, EventInquiryResponse, EventInquiryUpdate,
            EventInquiryUpdatedResponse, EventPackageResponse, EventTestimonialResponse, InquiryStatusResponse,
            InquirySubmittedResponse, PackageEnvelope, PackagesResponse, TestimonialsResponse,
        },
        users::CurrentUser,
    },
    db::{
        handlers::{EventInquiries, EventShowcase, Repository},
        models::private_events::{
            EventInquiryCreateDBRequest, EventInquiryFilter, EventInquiryUpdateDBRequest, INQUIRY_STATUSES, PRIORITIES,
        },
    },
    errors::Error,
    notifications::{self, Notification},
    types::{InquiryId, Operation, Resource},
    validation::{
        require_fields, sanitize_optional, sanitize_string, validate_date, validate_email, validate_phone,
        validate_positive_integer, validate_time,
    },
};

/// Validate the public inquiry form into an insertable row.
fn inquiry_from_form(form: &EventInquiryCreate, now: chrono::NaiveDateTime) -> Result<EventInquiryCreateDBRequest, Error> {
    let guests = form.guests_text();
    require_fields(&[
        ("eventType", form.event_type.as_deref()),
        ("date", form.date.as_deref()),
        ("time", form.time.as_deref()),
        ("guests", guests.as_deref()),
        ("name", form.name.as_deref()),
        ("email", form.email.as_deref()),
        ("phone", form.phone.as_deref()),
    ])?;

    // require_fields guarantees presence from here on
    let email = form.email.as_deref().unwrap_or_default().trim();
    if !validate_email(email) {
        return Err(Error::bad_request("Invalid email format"));
    }
    let phone = form.phone.as_deref().unwrap_or_default().trim();
    if !validate_phone(phone) {
        return Err(Error::bad_request("Invalid phone format"));
    }

    let date = form.date.as_deref().unwrap_or_default().trim();
    let time = form.time.as_deref().unwrap_or_default().trim();
    let parsed = (validate_date(date) && validate_time(time))
        .then(|| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .zip(NaiveTime::parse_from_str(time, "%H:%M").ok())
        })
        .flatten();
    let (event_date, event_time) = parsed.ok_or_else(|| Error::bad_request("Invalid date or time format"))?;
    if event_date.and_time(event_time) <= now {
        return Err(Error::bad_request("Event date must be in the future"));
    }

    let number_of_guests = form
        .guest_count()
        .filter(|&g| validate_positive_integer(g))
        .and_then(|g| i32::try_from(g).ok())
        .ok_or_else(|| Error::bad_request("Number of guests must be a positive integer"))?;

    Ok(EventInquiryCreateDBRequest {
        event_type: sanitize_string(form.event_type.as_deref().unwrap_or_default(), 100),
        event_date,
        event_time,
        number_of_guests,
        drink_categories: form
            .drink_categories
            .iter()
            .map(|c| sanitize_string(c, 50))
            .filter(|c| !c.is_empty())
            .collect(),
        dietary_requirements: sanitize_optional(form.dietary_requirements.as_deref(), 500),
        contact_name: sanitize_string(form.name.as_deref().unwrap_or_default(), 100),
        contact_email: email.to_lowercase(),
        contact_phone: phone.to_string(),
        message: sanitize_optional(form.message.as_deref(), 2000),
    })
}

/// Submit a private event inquiry
#[utoipa::path(
    post,
    path = "/private-events/inquiry",
    tag = "private-events",
    request_body = EventInquiryCreate,
    responses(
        (status = 201, description = "Inquiry recorded", body = InquirySubmittedResponse),
        (status = 400, description = "Missing or invalid field"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_inquiry(
    State(state): State<AppState>,
    Json(form): Json<EventInquiryCreate>,
) -> Result<(StatusCode, Json<InquirySubmittedResponse>), Error> {
    let request = inquiry_from_form(&form, Utc::now().naive_utc())?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let inquiry = EventInquiries::new(&mut tx).create(&request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(inquiry_id = %inquiry.id, event_type = %inquiry.event_type, "Event inquiry received");

    let response = InquirySubmittedResponse {
        message: "Event inquiry submitted successfully".to_string(),
        inquiry_id: inquiry.id,
        status: inquiry.status.clone(),
    };
    notifications::dispatch(&state.config, Notification::EventInquiry(inquiry));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Active event packages
#[utoipa::path(
    get,
    path = "/private-events/packages",
    tag = "private-events",
    responses(
        (status = 200, description = "Packages by sort order", body = PackagesResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_packages(State(state): State<AppState>) -> Result<Json<PackagesResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let packages = EventShowcase::new(&mut conn).active_packages().await?;
    Ok(Json(PackagesResponse {
        packages: packages.into_iter().map(EventPackageResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/private-events/packages/{slug}",
    tag = "private-events",
    params(("slug" = String, Path, description = "Package slug")),
    responses(
        (status = 200, description = "Package", body = PackageEnvelope),
        (status = 404, description = "Package not found"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_package(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<PackageEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let package = EventShowcase::new(&mut conn)
        .package_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::not_found("Package", &slug))?;
    Ok(Json(PackageEnvelope {
        package: EventPackageResponse::from(package),
    }))
}

/// Approved testimonials
#[utoipa::path(
    get,
    path = "/private-events/testimonials",
    tag = "private-events",
    responses(
        (status = 200, description = "Testimonials", body = TestimonialsResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_testimonials(State(state): State<AppState>) -> Result<Json<TestimonialsResponse>, Error> {
    testimonials(&state, false).await
}

/// Approved testimonials marked as featured
#[utoipa::path(
    get,
    path = "/private-events/featured-testimonials",
    tag = "private-events",
    responses(
        (status = 200, description = "Featured testimonials", body = TestimonialsResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn featured_testimonials(State(state): State<AppState>) -> Result<Json<TestimonialsResponse>, Error> {
    testimonials(&state, true).await
}

async fn testimonials(state: &AppState, featured_only: bool) -> Result<Json<TestimonialsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let testimonials = EventShowcase::new(&mut conn).approved_testimonials(featured_only).await?;
    Ok(Json(TestimonialsResponse {
        testimonials: testimonials.into_iter().map(EventTestimonialResponse::from).collect(),
    }))
}

/// Where an inquiry stands, for the client who submitted it
#[utoipa::path(
    get,
    path = "/private-events/inquiry/{id}/status",
    tag = "private-events",
    params(("id" = String, Path, description = "Inquiry ID")),
    responses(
        (status = 200, description = "Inquiry status", body = InquiryStatusResponse),
        (status = 404, description = "Inquiry not found"),
    )
)]
#[tracing::instrument(skip_all, fields(inquiry_id = %id))]
pub async fn inquiry_status(
    State(state): State<AppState>,
    Path(id): Path<InquiryId>,
) -> Result<Json<InquiryStatusResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let inquiry = EventInquiries::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Inquiry", id))?;
    Ok(Json(InquiryStatusResponse::from(inquiry)))
}

/// All inquiries, newest first (admin only)
#[utoipa::path(
    get,
    path = "/private-events/admin/inquiries",
    tag = "private-events",
    params(AdminInquiryQuery),
    responses(
        (status = 200, description = "Page of inquiries", body = EventInquiryPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_inquiries(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AdminInquiryQuery>,
) -> Result<Json<EventInquiryPage>, Error> {
    current_user.require_admin(Operation::Read, Resource::EventInquiries)?;

    let window = query.pagination.window(20, 100);
    let filter = EventInquiryFilter {
        status: query.status.filter(|s| !s.is_empty()),
        skip: window.skip(),
        limit: window.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EventInquiries::new(&mut conn);
    let inquiries = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(EventInquiryPage {
        inquiries: inquiries.into_iter().map(EventInquiryResponse::from).collect(),
        total,
        pages: window.pages(total),
        current_page: window.page,
        per_page: window.per_page,
    }))
}

/// Triage an inquiry (admin only)
#[utoipa::path(
    put,
    path = "/private-events/admin/inquiries/{id}",
    tag = "private-events",
    request_body = EventInquiryUpdate,
    params(("id" = String, Path, description = "Inquiry ID")),
    responses(
        (status = 200, description = "Inquiry updated", body = EventInquiryUpdatedResponse),
        (status = 400, description = "Invalid status or priority"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Inquiry not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(inquiry_id = %id))]
pub async fn admin_update_inquiry(
    State(state): State<AppState>,
    Path(id): Path<InquiryId>,
    current_user: CurrentUser,
    Json(request): Json<EventInquiryUpdate>,
) -> Result<Json<EventInquiryUpdatedResponse>, Error> {
    current_user.require_admin(Operation::Update, Resource::EventInquiries)?;

    if request.status.as_deref().is_some_and(|s| !INQUIRY_STATUSES.contains(&s)) {
        return Err(Error::bad_request("Invalid status"));
    }
    if request.priority.as_deref().is_some_and(|p| !PRIORITIES.contains(&p)) {
        return Err(Error::bad_request("Invalid priority"));
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let inquiry = {
        let mut repo = EventInquiries::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::not_found("Inquiry", id))?;
        repo.update(
            id,
            &EventInquiryUpdateDBRequest {
                status: request.status,
                admin_notes: request.admin_notes,
                estimated_quote: request.estimated_quote,
                priority: request.priority,
            },
        )
        .await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(status = %inquiry.status, "Event inquiry updated");

    Ok(Json(EventInquiryUpdatedResponse {
        message: "Inquiry updated successfully".to_string(),
        inquiry: EventInquiryResponse::from(inquiry),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::private_events::{EventPackageCreateDBRequest, EventTestimonialCreateDBRequest};
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_user};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn future_date() -> String {
        (Utc::now() + Duration::days(60)).format("%Y-%m-%d").to_string()
    }

    fn valid_form() -> Value {
        json!({
            "eventType": "birthday",
            "date": future_date(),
            "time": "19:30",
            "guests": "25",
            "name": "  Camille Martin ",
            "email": "Camille@Example.com",
            "phone": "+33 6 12 34 56 78",
            "drinkCategories": ["mocktails"],
            "message": "Garden party"
        })
    }

    fn form(overrides: Value) -> EventInquiryCreate {
        let mut base = valid_form();
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in overrides {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn form_validation_messages() {
        let now = Utc::now().naive_utc();
        let cases = [
            (json!({"eventType": ""}), "Missing required field: eventType"),
            (json!({"guests": null}), "Missing required field: guests"),
            (json!({"email": "not-an-email"}), "Invalid email format"),
            (json!({"phone": "call me"}), "Invalid phone format"),
            (json!({"date": "01/06/2030"}), "Invalid date or time format"),
            (json!({"time": "7pm"}), "Invalid date or time format"),
            (json!({"date": "2001-01-01"}), "Event date must be in the future"),
            (json!({"guests": "-4"}), "Number of guests must be a positive integer"),
            (json!({"guests": 0}), "Number of guests must be a positive integer"),
        ];
        for (overrides, expected) in cases {
            let err = inquiry_from_form(&form(overrides.clone()), now).unwrap_err();
            assert_eq!(err.user_message(), expected, "for {overrides}");
        }
    }

    #[test]
    fn form_is_normalized() {
        let request = inquiry_from_form(&form(json!({})), Utc::now().naive_utc()).unwrap();
        assert_eq!(request.contact_name, "Camille Martin");
        assert_eq!(request.contact_email, "camille@example.com");
        assert_eq!(request.number_of_guests, 25);
        assert_eq!(request.event_time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert!(request.dietary_requirements.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_submit_and_track_inquiry(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/private-events/inquiry").json(&valid_form()).await;
        response.assert_status(StatusCode::CREATED);
        let submitted: InquirySubmittedResponse = response.json();
        assert_eq!(submitted.message, "Event inquiry submitted successfully");
        assert_eq!(submitted.status, "pending");

        let status: InquiryStatusResponse = server
            .get(&format!("/api/private-events/inquiry/{}/status", submitted.inquiry_id))
            .await
            .json();
        assert_eq!(status.status, "pending");
        assert_eq!(status.event_type, "birthday");

        let response = server
            .post("/api/private-events/inquiry")
            .json(&json!({"eventType": "wedding"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Missing required field: date");

        server
            .get(&format!("/api/private-events/inquiry/{}/status", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_triage(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let admin = create_test_user(&pool, true).await;
        let server = create_test_app(pool).await;
        let user_auth = add_auth_headers(&user);
        let admin_auth = add_auth_headers(&admin);

        let submitted: InquirySubmittedResponse = server
            .post("/api/private-events/inquiry")
            .json(&valid_form())
            .await
            .json();

        server
            .get("/api/private-events/admin/inquiries")
            .add_header(&user_auth[0].0, &user_auth[0].1)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let page: EventInquiryPage = server
            .get("/api/private-events/admin/inquiries?status=pending")
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .await
            .json();
        assert_eq!(page.total, 1);
        assert_eq!(page.pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 20);

        let path = format!("/api/private-events/admin/inquiries/{}", submitted.inquiry_id);
        let response = server
            .put(&path)
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .json(&json!({"status": "archived"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid status");

        let updated: EventInquiryUpdatedResponse = server
            .put(&path)
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .json(&json!({"status": "quoted", "estimated_quote": 1250.0, "admin_notes": "Sent menu", "priority": "high"}))
            .await
            .json();
        assert_eq!(updated.message, "Inquiry updated successfully");
        assert_eq!(updated.inquiry.status, "quoted");
        assert_eq!(updated.inquiry.priority, "high");
        assert_eq!(updated.inquiry.estimated_quote, Some(Decimal::new(1250, 0)));

        let page: EventInquiryPage = server
            .get("/api/private-events/admin/inquiries?status=pending")
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .await
            .json();
        assert_eq!(page.total, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_packages_and_testimonials(pool: PgPool) {
        {
            let mut conn = pool.acquire().await.unwrap();
            let mut showcase = EventShowcase::new(&mut conn);
            showcase
                .create_package(&EventPackageCreateDBRequest {
                    name: "Signature Soirée".to_string(),
                    slug: "signature-soiree".to_string(),
                    price_per_person: Decimal::new(45, 0),
                    min_guests: 10,
                    service_hours: 4,
                    sort_order: 2,
                    ..Default::default()
                })
                .await
                .unwrap();
            showcase
                .create_package(&EventPackageCreateDBRequest {
                    name: "Essentials".to_string(),
                    slug: "essentials".to_string(),
                    price_per_person: Decimal::new(30, 0),
                    min_guests: 10,
                    service_hours: 3,
                    sort_order: 1,
                    ..Default::default()
                })
                .await
                .unwrap();
            for (name, featured, approved) in [("Lea", true, true), ("Hugo", false, true), ("Noor", true, false)] {
                showcase
                    .create_testimonial(&EventTestimonialCreateDBRequest {
                        client_name: name.to_string(),
                        content: "Wonderful evening".to_string(),
                        rating: 5,
                        is_featured: featured,
                        is_approved: approved,
                        ..Default::default()
                    })
                    .await
                    .unwrap();
            }
        }
        let server = create_test_app(pool).await;

        let packages: PackagesResponse = server.get("/api/private-events/packages").await.json();
        let slugs: Vec<_> = packages.packages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["essentials", "signature-soiree"]);

        let package: PackageEnvelope = server.get("/api/private-events/packages/signature-soiree").await.json();
        assert_eq!(package.package.service_hours, 4);

        let response = server.get("/api/private-events/packages/nope").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["error"], "Package not found");

        let all: TestimonialsResponse = server.get("/api/private-events/testimonials").await.json();
        assert_eq!(all.testimonials.len(), 2);

        let featured: TestimonialsResponse = server.get("/api/private-events/featured-testimonials").await.json();
        assert_eq!(featured.testimonials.len(), 1);
        assert_eq!(featured.testimonials[0].client_name, "Lea");
    }
}
