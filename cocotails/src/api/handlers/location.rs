use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{Extensions, HeaderMap, StatusCode, header},
};

use crate::{
    AppState,
    api::models::{
        locations::{
            AdminContactQuery, BusinessHoursResponse, ContactInquiryCreate, ContactInquiryPage, ContactInquiryResponse,
            ContactInquiryUpdate, ContactInquiryUpdatedResponse, ContactSubmittedResponse, Directions,
            DirectionsResponse, LocationCreate, LocationCreatedResponse, LocationEnvelope, LocationResponse,
            LocationsResponse, default_business_hours,
        },
        users::CurrentUser,
    },
    db::{
        handlers::{ContactInquiries, Locations, Repository},
        models::locations::{
            CONTACT_STATUSES, ContactInquiryCreateDBRequest, ContactInquiryFilter, ContactInquiryUpdateDBRequest,
            LocationCreateDBRequest,
        },
        models::private_events::PRIORITIES,
    },
    errors::Error,
    notifications::{self, Notification},
    types::{ContactInquiryId, Operation, Resource},
    validation::{
        require_fields, sanitize_optional, sanitize_string, validate_coordinates, validate_email, validate_phone,
        validate_slug,
    },
};

pub const INQUIRY_TYPES: &[&str] = &["general", "booking", "event", "partnership", "feedback"];

/// Best-effort client address: proxy headers first, then the socket peer.
fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded.or(real_ip).map(str::to_string).or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn contact_from_form(form: &ContactInquiryCreate) -> Result<ContactInquiryCreateDBRequest, Error> {
    require_fields(&[
        ("name", form.name.as_deref()),
        ("email", form.email.as_deref()),
        ("subject", form.subject.as_deref()),
        ("message", form.message.as_deref()),
    ])?;

    let email = form.email.as_deref().unwrap_or_default().trim();
    if !validate_email(email) {
        return Err(Error::bad_request("Invalid email format"));
    }
    let phone = sanitize_optional(form.phone.as_deref(), 20);
    if phone.as_deref().is_some_and(|p| !validate_phone(p)) {
        return Err(Error::bad_request("Invalid phone format"));
    }
    let inquiry_type = form
        .inquiry_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("general")
        .to_lowercase();
    if !INQUIRY_TYPES.contains(&inquiry_type.as_str()) {
        return Err(Error::bad_request("Invalid inquiry type"));
    }

    Ok(ContactInquiryCreateDBRequest {
        name: sanitize_string(form.name.as_deref().unwrap_or_default(), 100),
        email: email.to_lowercase(),
        phone,
        subject: sanitize_string(form.subject.as_deref().unwrap_or_default(), 200),
        message: sanitize_string(form.message.as_deref().unwrap_or_default(), 5000),
        inquiry_type,
        location_id: form.location_id,
        user_agent: None,
        ip_address: None,
    })
}

fn location_from_form(form: LocationCreate) -> Result<LocationCreateDBRequest, Error> {
    require_fields(&[
        ("name", form.name.as_deref()),
        ("slug", form.slug.as_deref()),
        ("street_address", form.street_address.as_deref()),
        ("city", form.city.as_deref()),
        ("postal_code", form.postal_code.as_deref()),
        ("country", form.country.as_deref()),
    ])?;
    let latitude = form
        .latitude
        .ok_or_else(|| Error::bad_request("Missing required field: latitude"))?;
    let longitude = form
        .longitude
        .ok_or_else(|| Error::bad_request("Missing required field: longitude"))?;

    let slug = form.slug.as_deref().unwrap_or_default().trim().to_string();
    if !validate_slug(&slug) {
        return Err(Error::bad_request("Invalid slug format"));
    }
    if !validate_coordinates(latitude, longitude) {
        return Err(Error::bad_request("Invalid coordinates"));
    }
    let email = sanitize_optional(form.email.as_deref(), 120);
    if email.as_deref().is_some_and(|e| !validate_email(e)) {
        return Err(Error::bad_request("Invalid email format"));
    }
    let phone = sanitize_optional(form.phone.as_deref(), 20);
    if phone.as_deref().is_some_and(|p| !validate_phone(p)) {
        return Err(Error::bad_request("Invalid phone format"));
    }

    Ok(LocationCreateDBRequest {
        name: sanitize_string(form.name.as_deref().unwrap_or_default(), 100),
        slug,
        description: sanitize_optional(form.description.as_deref(), 2000),
        street_address: sanitize_string(form.street_address.as_deref().unwrap_or_default(), 200),
        city: sanitize_string(form.city.as_deref().unwrap_or_default(), 100),
        postal_code: sanitize_string(form.postal_code.as_deref().unwrap_or_default(), 20),
        country: sanitize_string(form.country.as_deref().unwrap_or_default(), 100),
        latitude,
        longitude,
        phone,
        email,
        website: sanitize_optional(form.website.as_deref(), 200),
        business_hours: form.business_hours,
        social_media: form.social_media,
        parking_info: sanitize_optional(form.parking_info.as_deref(), 1000),
        public_transport_info: sanitize_optional(form.public_transport_info.as_deref(), 1000),
        driving_directions: sanitize_optional(form.driving_directions.as_deref(), 1000),
        is_active: form.is_active.unwrap_or(true),
        is_primary: form.is_primary.unwrap_or(false),
    })
}

/// The primary location, falling back to any active one
#[utoipa::path(
    get,
    path = "/location/info",
    tag = "location",
    responses(
        (status = 200, description = "Location", body = LocationEnvelope),
        (status = 404, description = "No active location"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn location_info(State(state): State<AppState>) -> Result<Json<LocationEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn)
        .primary()
        .await?
        .ok_or_else(|| Error::not_found("Location", "primary"))?;
    Ok(Json(LocationEnvelope {
        location: LocationResponse::from(location),
    }))
}

#[utoipa::path(
    get,
    path = "/location/all",
    tag = "location",
    responses(
        (status = 200, description = "Active locations, primary first", body = LocationsResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn all_locations(State(state): State<AppState>) -> Result<Json<LocationsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let locations = Locations::new(&mut conn).active().await?;
    Ok(Json(LocationsResponse {
        locations: locations.into_iter().map(LocationResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/location/{slug}",
    tag = "location",
    params(("slug" = String, Path, description = "Location slug")),
    responses(
        (status = 200, description = "Location", body = LocationEnvelope),
        (status = 404, description = "Location not found"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn location_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LocationEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn)
        .by_slug(&slug)
        .await?
        .ok_or_else(|| Error::not_found("Location", &slug))?;
    Ok(Json(LocationEnvelope {
        location: LocationResponse::from(location),
    }))
}

/// Submit the contact form
#[utoipa::path(
    post,
    path = "/location/contact",
    tag = "location",
    request_body = ContactInquiryCreate,
    responses(
        (status = 201, description = "Inquiry received", body = ContactSubmittedResponse),
        (status = 400, description = "Missing or invalid field"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    Json(form): Json<ContactInquiryCreate>,
) -> Result<(StatusCode, Json<ContactSubmittedResponse>), Error> {
    let request = ContactInquiryCreateDBRequest {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.chars().take(500).collect()),
        ip_address: client_ip(&headers, &extensions),
        ..contact_from_form(&form)?
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let inquiry = ContactInquiries::new(&mut tx).create(&request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(inquiry_id = %inquiry.id, inquiry_type = %inquiry.inquiry_type, "Contact inquiry received");

    let response = ContactSubmittedResponse {
        message: "Contact inquiry submitted successfully".to_string(),
        inquiry_id: inquiry.id,
        status: "received".to_string(),
    };
    notifications::dispatch(&state.config, Notification::ContactInquiry(inquiry));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Opening hours of the primary location, or the house defaults
#[utoipa::path(
    get,
    path = "/location/business-hours",
    tag = "location",
    responses(
        (status = 200, description = "Opening hours by day", body = BusinessHoursResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn business_hours(State(state): State<AppState>) -> Result<Json<BusinessHoursResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let hours = Locations::new(&mut conn)
        .primary()
        .await?
        .and_then(|location| location.business_hours)
        .filter(|hours| hours.as_object().is_some_and(|days| !days.is_empty()))
        .unwrap_or_else(default_business_hours);
    Ok(Json(BusinessHoursResponse { business_hours: hours }))
}

/// How to get to the primary location
#[utoipa::path(
    get,
    path = "/location/directions",
    tag = "location",
    responses(
        (status = 200, description = "Directions", body = DirectionsResponse),
        (status = 404, description = "No active location"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn directions(State(state): State<AppState>) -> Result<Json<DirectionsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let location = Locations::new(&mut conn)
        .primary()
        .await?
        .ok_or_else(|| Error::not_found("Location", "primary"))?;
    Ok(Json(DirectionsResponse {
        directions: Directions::from(location),
    }))
}

/// Contact inquiries, newest first (admin only)
#[utoipa::path(
    get,
    path = "/location/admin/inquiries",
    tag = "location",
    params(AdminContactQuery),
    responses(
        (status = 200, description = "Page of inquiries", body = ContactInquiryPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_contacts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AdminContactQuery>,
) -> Result<Json<ContactInquiryPage>, Error> {
    current_user.require_admin(Operation::Read, Resource::ContactInquiries)?;

    let window = query.pagination.window(20, 100);
    let filter = ContactInquiryFilter {
        status: query.status.filter(|s| !s.is_empty()),
        inquiry_type: query.inquiry_type.filter(|t| !t.is_empty()),
        skip: window.skip(),
        limit: window.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ContactInquiries::new(&mut conn);
    let inquiries = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(ContactInquiryPage {
        inquiries: inquiries.into_iter().map(ContactInquiryResponse::from).collect(),
        total,
        pages: window.pages(total),
        current_page: window.page,
        per_page: window.per_page,
    }))
}

/// Respond to or re-file a contact inquiry (admin only)
#[utoipa::path(
    put,
    path = "/location/admin/inquiries/{id}",
    tag = "location",
    request_body = ContactInquiryUpdate,
    params(("id" = String, Path, description = "Contact inquiry ID")),
    responses(
        (status = 200, description = "Inquiry updated", body = ContactInquiryUpdatedResponse),
        (status = 400, description = "Invalid status or priority"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Inquiry not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(inquiry_id = %id))]
pub async fn admin_update_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactInquiryId>,
    current_user: CurrentUser,
    Json(request): Json<ContactInquiryUpdate>,
) -> Result<Json<ContactInquiryUpdatedResponse>, Error> {
    current_user.require_admin(Operation::Update, Resource::ContactInquiries)?;

    if request.status.as_deref().is_some_and(|s| !CONTACT_STATUSES.contains(&s)) {
        return Err(Error::bad_request("Invalid status"));
    }
    if request.priority.as_deref().is_some_and(|p| !PRIORITIES.contains(&p)) {
        return Err(Error::bad_request("Invalid priority"));
    }
    let admin_response = sanitize_optional(request.admin_response.as_deref(), 5000);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let inquiry = {
        let mut repo = ContactInquiries::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::not_found("Inquiry", id))?;
        repo.update(
            id,
            &ContactInquiryUpdateDBRequest {
                status: request.status,
                responded_by: admin_response.as_ref().map(|_| current_user.first_name.clone()),
                admin_response,
                priority: request.priority,
            },
        )
        .await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ContactInquiryUpdatedResponse {
        message: "Contact inquiry updated successfully".to_string(),
        inquiry: ContactInquiryResponse::from(inquiry),
    }))
}

/// Add a location (admin only)
#[utoipa::path(
    post,
    path = "/location/admin/locations",
    tag = "location",
    request_body = LocationCreate,
    responses(
        (status = 201, description = "Location created", body = LocationCreatedResponse),
        (status = 400, description = "Missing or invalid field, or slug taken"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_create_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(form): Json<LocationCreate>,
) -> Result<(StatusCode, Json<LocationCreatedResponse>), Error> {
    current_user.require_admin(Operation::Create, Resource::Locations)?;
    let request = location_from_form(form)?;
    let slug_taken = || Error::bad_request("Location slug already exists");

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let location = {
        let mut repo = Locations::new(&mut tx);
        if repo.slug_exists(&request.slug).await? {
            return Err(slug_taken());
        }
        repo.create(&request).await.map_err(|e| {
            if e.is_unique_violation_of("locations_slug_key") {
                slug_taken()
            } else {
                Error::Database(e)
            }
        })?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(slug = %location.slug, "Location created");

    Ok((
        StatusCode::CREATED,
        Json(LocationCreatedResponse {
            message: "Location created successfully".to_string(),
            location: LocationResponse::from(location),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_location, create_test_user};
    use axum::http::HeaderValue;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[test]
    fn client_ip_prefers_proxy_headers() {
        let mut headers = HeaderMap::new();
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 4242))));
        assert_eq!(client_ip(&headers, &extensions).as_deref(), Some("10.0.0.7"));

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers, &extensions).as_deref(), Some("198.51.100.4"));

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&headers, &extensions).as_deref(), Some("203.0.113.9"));

        assert!(client_ip(&HeaderMap::new(), &Extensions::new()).is_none());
    }

    #[test]
    fn contact_form_validation() {
        let form = |value: Value| -> ContactInquiryCreate { serde_json::from_value(value).unwrap() };
        let base = json!({"name": "Sam", "email": "sam@example.com", "subject": "Hi", "message": "Hello"});

        let request = contact_from_form(&form(base.clone())).unwrap();
        assert_eq!(request.inquiry_type, "general");
        assert!(request.phone.is_none());

        let mut missing = base.clone();
        missing["subject"] = json!("  ");
        assert_eq!(
            contact_from_form(&form(missing)).unwrap_err().user_message(),
            "Missing required field: subject"
        );

        let mut bad_phone = base.clone();
        bad_phone["phone"] = json!("phone me");
        assert_eq!(
            contact_from_form(&form(bad_phone)).unwrap_err().user_message(),
            "Invalid phone format"
        );

        let mut bad_type = base;
        bad_type["inquiryType"] = json!("complaint");
        assert_eq!(
            contact_from_form(&form(bad_type)).unwrap_err().user_message(),
            "Invalid inquiry type"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_location_lookups(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let response = server.get("/api/location/info").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["error"], "Location not found");

        // Defaults apply without any location
        let hours: BusinessHoursResponse = server.get("/api/location/business-hours").await.json();
        assert_eq!(hours.business_hours["sunday"]["open"], "12:00");

        create_test_location(&pool, "bordeaux", false).await;
        create_test_location(&pool, "arcachon", true).await;

        let info: LocationEnvelope = server.get("/api/location/info").await.json();
        assert_eq!(info.location.slug, "arcachon");

        let all: LocationsResponse = server.get("/api/location/all").await.json();
        assert_eq!(all.locations.len(), 2);
        assert!(all.locations[0].is_primary);

        let by_slug: LocationEnvelope = server.get("/api/location/bordeaux").await.json();
        assert_eq!(by_slug.location.city, "Arcachon");
        server.get("/api/location/nowhere").await.assert_status_not_found();

        let directions: DirectionsResponse = server.get("/api/location/directions").await.json();
        assert_eq!(directions.directions.address.postal_code, "33120");
        assert_eq!(directions.directions.coordinates.latitude, 44.6586);
        assert_eq!(
            directions.directions.parking_info.as_deref(),
            Some("Free parking behind the building")
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_contact_submission_and_admin_response(pool: PgPool) {
        let admin = create_test_user(&pool, true).await;
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;
        let admin_auth = add_auth_headers(&admin);
        let user_auth = add_auth_headers(&user);

        let response = server
            .post("/api/location/contact")
            .add_header("user-agent", "integration-test/1.0")
            .add_header("x-forwarded-for", "203.0.113.9")
            .json(&json!({
                "name": "Sam",
                "email": "Sam@Example.com",
                "subject": "Catering",
                "message": "Do you cater weddings?",
                "inquiryType": "event"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let submitted: ContactSubmittedResponse = response.json();
        assert_eq!(submitted.status, "received");
        assert_eq!(submitted.message, "Contact inquiry submitted successfully");

        server
            .get("/api/location/admin/inquiries")
            .add_header(&user_auth[0].0, &user_auth[0].1)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let page: ContactInquiryPage = server
            .get("/api/location/admin/inquiries?type=event&status=new")
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .await
            .json();
        assert_eq!(page.total, 1);
        assert_eq!(page.inquiries[0].email, "sam@example.com");

        let path = format!("/api/location/admin/inquiries/{}", submitted.inquiry_id);
        server
            .put(&path)
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .json(&json!({"status": "done"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let updated: ContactInquiryUpdatedResponse = server
            .put(&path)
            .add_header(&admin_auth[0].0, &admin_auth[0].1)
            .json(&json!({"status": "responded", "admin_response": "Yes, we do!"}))
            .await
            .json();
        assert_eq!(updated.inquiry.status, "responded");
        assert_eq!(updated.inquiry.responded_by.as_deref(), Some("Test"));
        assert!(updated.inquiry.responded_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_creates_location(pool: PgPool) {
        let admin = create_test_user(&pool, true).await;
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&admin);
        let body = json!({
            "name": "SOBRE Bordeaux",
            "slug": "bordeaux",
            "street_address": "12 Quai des Chartrons",
            "city": "Bordeaux",
            "postal_code": "33000",
            "country": "France",
            "latitude": 44.8530,
            "longitude": -0.5690
        });

        let response = server
            .post("/api/location/admin/locations")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: LocationCreatedResponse = response.json();
        assert_eq!(created.location.slug, "bordeaux");
        assert!(created.location.is_active);
        assert!(!created.location.is_primary);

        let response = server
            .post("/api/location/admin/locations")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&body)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Location slug already exists");

        let mut bad = body.clone();
        bad["slug"] = json!("Not A Slug");
        let response = server
            .post("/api/location/admin/locations")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&bad)
            .await;
        assert_eq!(response.json::<Value>()["error"], "Invalid slug format");

        let mut bad = body;
        bad["slug"] = json!("nowhere");
        bad["latitude"] = json!(123.0);
        let response = server
            .post("/api/location/admin/locations")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&bad)
            .await;
        assert_eq!(response.json::<Value>()["error"], "Invalid coordinates");
    }
}
