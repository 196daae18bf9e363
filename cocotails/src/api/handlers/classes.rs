use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        classes::{
            BookingChangeResponse, BookingResponse, BookingsResponse, ClassEnvelope, ClassListResponse,
            ListClassesQuery, VirtualClassResponse,
        },
        pagination::PaginationMeta,
        users::CurrentUser,
    },
    auth::utils::generate_booking_reference,
    db::{
        handlers::{Bookings, Repository, VirtualClasses},
        models::classes::{BookingCreateDBRequest, BookingFilter, BookingUpdateDBRequest, VirtualClassFilter},
    },
    errors::Error,
    types::{BookingId, ClassId},
};

/// Upcoming scheduled classes
#[utoipa::path(
    get,
    path = "/classes",
    tag = "classes",
    params(ListClassesQuery),
    responses(
        (status = 200, description = "Page of classes ordered by start time", body = ClassListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ListClassesQuery>,
) -> Result<Json<ClassListResponse>, Error> {
    let window = query.pagination.window(10, 50);
    let filter = VirtualClassFilter {
        after: Utc::now(),
        difficulty: query.difficulty.filter(|d| !d.is_empty()),
        premium: query.premium,
        skip: window.skip(),
        limit: window.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = VirtualClasses::new(&mut conn);
    let classes = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(ClassListResponse {
        classes: classes.into_iter().map(VirtualClassResponse::from).collect(),
        pagination: PaginationMeta::new(window, total),
    }))
}

/// A single class. Meeting details are included for callers holding a confirmed booking.
#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "classes",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = ClassEnvelope),
        (status = 404, description = "Class not found"),
    )
)]
#[tracing::instrument(skip_all, fields(class_id = %id))]
pub async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
    current_user: Option<CurrentUser>,
) -> Result<Json<ClassEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let class = VirtualClasses::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Class", id))?;

    let include_meeting = match &current_user {
        Some(user) => Bookings::new(&mut conn).confirmed_for(user.id, id).await?.is_some(),
        None => false,
    };

    Ok(Json(ClassEnvelope {
        class: VirtualClassResponse::new(class, include_meeting),
    }))
}

/// Book a seat in a class.
///
/// The class row is locked for the duration of the transaction so that
/// concurrent bookings for the same class are serialized and the capacity
/// check cannot be raced.
#[utoipa::path(
    post,
    path = "/classes/{id}/book",
    tag = "classes",
    params(("id" = String, Path, description = "Class ID")),
    responses(
        (status = 201, description = "Class booked", body = BookingChangeResponse),
        (status = 400, description = "Class closed, full, or already booked"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Class not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(class_id = %id))]
pub async fn book_class(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
    current_user: CurrentUser,
) -> Result<(StatusCode, Json<BookingChangeResponse>), Error> {
    let already_booked = || Error::bad_request("You have already booked this class");

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let class = VirtualClasses::new(&mut tx)
        .lock_for_booking(id)
        .await?
        .ok_or_else(|| Error::not_found("Class", id))?;
    if !class.is_open_at(Utc::now()) {
        return Err(Error::bad_request("Class is not open for booking"));
    }

    let booking = {
        let mut repo = Bookings::new(&mut tx);
        if repo.exists_for(current_user.id, id).await? {
            return Err(already_booked());
        }
        if class.is_full() {
            return Err(Error::bad_request("Class is fully booked"));
        }

        let mut reference = generate_booking_reference();
        while repo.reference_in_use(&reference).await? {
            reference = generate_booking_reference();
        }

        repo.create(&BookingCreateDBRequest {
            user_id: current_user.id,
            virtual_class_id: id,
            booking_reference: reference,
            amount_paid: class.price,
            currency: class.currency.clone(),
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_of("class_bookings_user_class_key") {
                already_booked()
            } else {
                Error::Database(e)
            }
        })?
    };

    // Re-read so the participant count includes this booking
    let class = VirtualClasses::new(&mut tx).get_by_id(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(booking_reference = %booking.booking_reference, "Class booked");

    Ok((
        StatusCode::CREATED,
        Json(BookingChangeResponse {
            message: "Class booked successfully".to_string(),
            booking: BookingResponse::new(booking, class),
        }),
    ))
}

/// The caller's bookings, newest first
#[utoipa::path(
    get,
    path = "/classes/my-bookings",
    tag = "classes",
    responses(
        (status = 200, description = "Bookings", body = BookingsResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn my_bookings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<BookingsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let bookings = Bookings::new(&mut conn)
        .list(&BookingFilter {
            user_id: Some(current_user.id),
            limit: i64::MAX,
            ..Default::default()
        })
        .await?;

    let mut responses = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let class = VirtualClasses::new(&mut conn).get_by_id(booking.virtual_class_id).await?;
        responses.push(BookingResponse::new(booking, class));
    }

    Ok(Json(BookingsResponse { bookings: responses }))
}

/// Cancel one of the caller's confirmed bookings, freeing the seat
#[utoipa::path(
    post,
    path = "/classes/bookings/{id}/cancel",
    tag = "classes",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingChangeResponse),
        (status = 400, description = "Booking is not confirmed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(booking_id = %id))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    current_user: CurrentUser,
) -> Result<Json<BookingChangeResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let booking = {
        let mut repo = Bookings::new(&mut tx);
        let booking = repo
            .get_by_id(id)
            .await?
            .filter(|b| b.user_id == current_user.id)
            .ok_or_else(|| Error::not_found("Booking", id))?;
        if booking.status != "confirmed" {
            return Err(Error::bad_request("Only confirmed bookings can be cancelled"));
        }
        repo.update(
            id,
            &BookingUpdateDBRequest {
                status: Some("cancelled".to_string()),
            },
        )
        .await?
    };
    let class = VirtualClasses::new(&mut tx).get_by_id(booking.virtual_class_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(BookingChangeResponse {
        message: "Booking cancelled successfully".to_string(),
        booking: BookingResponse::new(booking, class),
    }))
}
