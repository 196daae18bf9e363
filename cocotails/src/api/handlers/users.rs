use axum::{Json, extract::State};
use chrono::{NaiveDate, Utc};

use crate::{
    AppState,
    api::models::{
        classes::BookingResponse,
        cocktails::CocktailResponse,
        users::{
            CurrentUser, DashboardResponse, DashboardStatistics, FavoritesResponse, PreferencesResponse, ProfileUpdate,
            ProfileUpdateResponse, UserEnvelope, UserResponse,
        },
    },
    db::{
        handlers::{Bookings, Cocktails, Repository, Reviews, Subscriptions, Users, VirtualClasses},
        models::{
            classes::BookingFilter, cocktails::ReviewFilter, subscriptions::SubscriptionFilter, users::UserUpdateDBRequest,
        },
    },
    errors::Error,
    validation::{sanitize_string, validate_date, validate_phone},
};

/// Turn a partial profile update into the columns to write.
fn profile_changes(update: ProfileUpdate) -> Result<UserUpdateDBRequest, Error> {
    let name = |value: Option<String>, field: &str| -> Result<Option<String>, Error> {
        match value.map(|v| sanitize_string(&v, 50)) {
            Some(v) if v.is_empty() => Err(Error::bad_request(format!("{field} cannot be empty"))),
            other => Ok(other),
        }
    };

    let phone = match update.phone.map(|p| p.trim().to_string()) {
        Some(phone) if !phone.is_empty() && (phone.chars().count() > 20 || !validate_phone(&phone)) => {
            return Err(Error::bad_request("Invalid phone format"));
        }
        other => other,
    };

    let date_of_birth = match update.date_of_birth.as_deref().map(str::trim) {
        Some(date) if !validate_date(date) => return Err(Error::bad_request("Invalid date format")),
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        None => None,
    };

    Ok(UserUpdateDBRequest {
        first_name: name(update.first_name, "First name")?,
        last_name: name(update.last_name, "Last name")?,
        phone,
        date_of_birth,
        dietary_preferences: update.dietary_preferences,
        health_goals: update.health_goals,
        ..Default::default()
    })
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    responses(
        (status = 200, description = "Profile", body = UserEnvelope),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", current_user.id))?;

    Ok(Json(UserEnvelope {
        user: UserResponse::from(user),
    }))
}

/// Update the caller's profile. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/users/profile",
    request_body = ProfileUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdateResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileUpdateResponse>, Error> {
    let changes = profile_changes(update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).update(current_user.id, &changes).await?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

/// List the caller's favorite cocktails
#[utoipa::path(
    get,
    path = "/users/favorites",
    tag = "users",
    responses(
        (status = 200, description = "Favorite cocktails", body = FavoritesResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_favorites(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<FavoritesResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let favorites: Vec<CocktailResponse> = Cocktails::new(&mut conn)
        .favorites_of(current_user.id, None)
        .await?
        .into_iter()
        .map(CocktailResponse::from)
        .collect();

    Ok(Json(FavoritesResponse {
        total: favorites.len(),
        favorites,
    }))
}

/// Summary of the caller's activity
#[utoipa::path(
    get,
    path = "/users/dashboard",
    tag = "users",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<DashboardResponse>, Error> {
    let user_id = current_user.id;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let (favorites_count, recent_favorites) = {
        let mut cocktails = Cocktails::new(&mut conn);
        (cocktails.count_favorites(user_id).await?, cocktails.favorites_of(user_id, Some(5)).await?)
    };

    let reviews_count = Reviews::new(&mut conn)
        .count(&ReviewFilter {
            user_id: Some(user_id),
            ..Default::default()
        })
        .await?;

    let active_subscriptions = {
        let mut subscriptions = Subscriptions::new(&mut conn);
        subscriptions.expire_lapsed(user_id).await?;
        subscriptions
            .count(&SubscriptionFilter {
                user_id: Some(user_id),
                status: Some("active".to_string()),
                ..Default::default()
            })
            .await?
    };

    let (bookings_count, upcoming) = {
        let mut bookings = Bookings::new(&mut conn);
        let count = bookings
            .count(&BookingFilter {
                user_id: Some(user_id),
                ..Default::default()
            })
            .await?;
        let upcoming = bookings
            .list(&BookingFilter {
                user_id: Some(user_id),
                status: Some("confirmed".to_string()),
                upcoming_after: Some(Utc::now()),
                limit: 3,
                ..Default::default()
            })
            .await?;
        (count, upcoming)
    };

    let mut upcoming_classes = Vec::with_capacity(upcoming.len());
    for booking in upcoming {
        let class = VirtualClasses::new(&mut conn).get_by_id(booking.virtual_class_id).await?;
        upcoming_classes.push(BookingResponse::new(booking, class));
    }

    Ok(Json(DashboardResponse {
        user: UserResponse::from(user),
        statistics: DashboardStatistics {
            favorites_count,
            reviews_count,
            bookings_count,
            active_subscriptions,
        },
        recent_favorites: recent_favorites.into_iter().map(CocktailResponse::from).collect(),
        upcoming_classes,
    }))
}

/// Options offered for dietary preferences and health goals
#[utoipa::path(
    get,
    path = "/users/preferences",
    tag = "users",
    responses(
        (status = 200, description = "Preference options", body = PreferencesResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_preferences(_current_user: CurrentUser) -> Json<PreferencesResponse> {
    Json(PreferencesResponse::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::classes::BookingCreateDBRequest;
    use crate::db::models::subscriptions::{SubscriptionCreateDBRequest, SubscriptionUpdateDBRequest};
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_class, create_test_cocktail, create_test_user};
    use axum::http::StatusCode;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[test]
    fn profile_changes_validate_input() {
        let err = profile_changes(ProfileUpdate {
            phone: Some("not a phone".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.user_message(), "Invalid phone format");

        let err = profile_changes(ProfileUpdate {
            date_of_birth: Some("1990-02-30".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.user_message(), "Invalid date format");

        let err = profile_changes(ProfileUpdate {
            first_name: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.user_message(), "First name cannot be empty");

        let changes = profile_changes(ProfileUpdate {
            last_name: Some("  Silva ".to_string()),
            date_of_birth: Some("1990-02-14".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.last_name.as_deref(), Some("Silva"));
        assert_eq!(changes.date_of_birth, NaiveDate::from_ymd_opt(1990, 2, 14));
        assert!(changes.first_name.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_profile_round_trip(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        let response = server.get("/api/users/profile").add_header(&auth[0].0, &auth[0].1).await;
        response.assert_status_ok();
        assert_eq!(response.json::<UserEnvelope>().user.username, user.username);

        let response = server
            .put("/api/users/profile")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"first_name": "Joana", "health_goals": ["Better Sleep"], "phone": "+33 5 56 83 01 69"}))
            .await;
        response.assert_status_ok();
        let body: ProfileUpdateResponse = response.json();
        assert_eq!(body.message, "Profile updated successfully");
        assert_eq!(body.user.first_name, "Joana");
        assert_eq!(body.user.last_name, "User");
        assert_eq!(body.user.health_goals, vec!["Better Sleep"]);

        let response = server
            .put("/api/users/profile")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"date_of_birth": "14/02/1990"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_requires_authentication(pool: PgPool) {
        let server = create_test_app(pool).await;
        for path in ["/api/users/profile", "/api/users/favorites", "/api/users/dashboard", "/api/users/preferences"] {
            server.get(path).await.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_favorites_and_dashboard(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let cocktail = create_test_cocktail(&pool, "Ginger Glow", false).await;
        let class = create_test_class(&pool, Utc::now() + Duration::days(3), 10).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            Cocktails::new(&mut conn).toggle_favorite(user.id, cocktail.id).await.unwrap();
            Bookings::new(&mut conn)
                .create(&BookingCreateDBRequest {
                    user_id: user.id,
                    virtual_class_id: class.id,
                    booking_reference: "ABCD1234".to_string(),
                    amount_paid: Decimal::new(2500, 2),
                    currency: "USD".to_string(),
                })
                .await
                .unwrap();
        }
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        let response = server.get("/api/users/favorites").add_header(&auth[0].0, &auth[0].1).await;
        response.assert_status_ok();
        let favorites: FavoritesResponse = response.json();
        assert_eq!(favorites.total, 1);
        assert_eq!(favorites.favorites[0].id, cocktail.id);

        let response = server.get("/api/users/dashboard").add_header(&auth[0].0, &auth[0].1).await;
        response.assert_status_ok();
        let dashboard: DashboardResponse = response.json();
        assert_eq!(
            dashboard.statistics,
            DashboardStatistics {
                favorites_count: 1,
                reviews_count: 0,
                bookings_count: 1,
                active_subscriptions: 0,
            }
        );
        assert_eq!(dashboard.recent_favorites.len(), 1);
        assert_eq!(dashboard.upcoming_classes.len(), 1);
        let upcoming = dashboard.upcoming_classes[0].virtual_class.as_ref().unwrap();
        assert_eq!(upcoming.id, class.id);
        assert!(upcoming.meeting_details.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dashboard_ignores_lapsed_subscriptions(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            let mut repo = Subscriptions::new(&mut conn);
            let subscription = repo
                .create(&SubscriptionCreateDBRequest {
                    user_id: user.id,
                    plan_type: "basic".to_string(),
                    monthly_price: Decimal::new(2999, 2),
                    currency: "USD".to_string(),
                    next_billing_date: None,
                    monthly_ingredient_credits: Some(2),
                    virtual_class_credits: Some(0),
                    premium_recipes_access: false,
                    personal_mixologist_access: false,
                })
                .await
                .unwrap();
            repo.update(
                subscription.id,
                &SubscriptionUpdateDBRequest {
                    end_date: Some(Utc::now() - Duration::days(3)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        let dashboard: DashboardResponse = server
            .get("/api/users/dashboard")
            .add_header(&auth[0].0, &auth[0].1)
            .await
            .json();
        assert_eq!(dashboard.statistics.active_subscriptions, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_preferences(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        let response = server.get("/api/users/preferences").add_header(&auth[0].0, &auth[0].1).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["dietary_preferences"].as_array().unwrap().len(), 10);
        assert!(body["health_goals"].as_array().unwrap().contains(&json!("Detox")));
    }
}
