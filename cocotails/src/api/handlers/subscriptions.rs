use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    api::models::{
        subscriptions::{
            DeliveriesResponse, DeliveryResponse, PlanResponse, PlanType, PlansResponse, SubscriptionChangeResponse,
            SubscriptionCreate, SubscriptionResponse, SubscriptionsResponse,
        },
        users::CurrentUser,
    },
    db::{
        handlers::{Repository, Subscriptions},
        models::subscriptions::{SubscriptionCreateDBRequest, SubscriptionFilter, SubscriptionUpdateDBRequest},
    },
    errors::Error,
    types::SubscriptionId,
};

const BILLING_PERIOD_DAYS: i64 = 30;

fn parse_plan_type(plan_type: Option<&str>) -> Result<PlanType, Error> {
    let plan_type = plan_type
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::bad_request("Missing required field: plan_type"))?;
    plan_type
        .to_lowercase()
        .parse()
        .map_err(|_| Error::bad_request("Invalid plan type"))
}

/// List the caller's subscriptions, newest first
#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscriptions", body = SubscriptionsResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<SubscriptionsResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let subscriptions = {
        let mut repo = Subscriptions::new(&mut tx);
        repo.expire_lapsed(current_user.id).await?;
        repo.list(&SubscriptionFilter {
            user_id: Some(current_user.id),
            limit: i64::MAX,
            ..Default::default()
        })
        .await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let now = Utc::now();
    Ok(Json(SubscriptionsResponse {
        subscriptions: subscriptions
            .into_iter()
            .map(|s| SubscriptionResponse::at(s, now))
            .collect(),
    }))
}

/// The plan catalog
#[utoipa::path(
    get,
    path = "/subscriptions/plans",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Available plans", body = PlansResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: PlanType::ALL.iter().map(|p| PlanResponse::from(p.plan())).collect(),
    })
}

/// Subscribe to a plan. A user holds at most one active subscription.
#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscriptions",
    request_body = SubscriptionCreate,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionChangeResponse),
        (status = 400, description = "Unknown plan or already subscribed"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_subscription(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<SubscriptionCreate>,
) -> Result<(StatusCode, Json<SubscriptionChangeResponse>), Error> {
    let plan = parse_plan_type(request.plan_type.as_deref())?.plan();
    let already_subscribed = || Error::bad_request("You already have an active subscription");

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let subscription = {
        let mut repo = Subscriptions::new(&mut tx);
        repo.expire_lapsed(current_user.id).await?;
        if repo.active_for_user(current_user.id).await?.is_some() {
            return Err(already_subscribed());
        }

        repo.create(&SubscriptionCreateDBRequest {
            user_id: current_user.id,
            plan_type: plan.plan_type.to_string(),
            monthly_price: plan.price,
            currency: plan.currency.to_string(),
            next_billing_date: Some(Utc::now() + Duration::days(BILLING_PERIOD_DAYS)),
            monthly_ingredient_credits: plan.monthly_ingredient_credits,
            virtual_class_credits: plan.virtual_class_credits,
            premium_recipes_access: plan.premium_recipes_access,
            personal_mixologist_access: plan.personal_mixologist_access,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_of("subscriptions_one_active_per_user") {
                already_subscribed()
            } else {
                Error::Database(e)
            }
        })?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(plan = %plan.plan_type, "Subscription created");

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionChangeResponse {
            message: "Subscription created successfully".to_string(),
            subscription: SubscriptionResponse::from(subscription),
        }),
    ))
}

/// Cancel one of the caller's subscriptions
#[utoipa::path(
    post,
    path = "/subscriptions/{id}/cancel",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription cancelled", body = SubscriptionChangeResponse),
        (status = 400, description = "Subscription is not active"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Subscription not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(subscription_id = %id))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(id): Path<SubscriptionId>,
    current_user: CurrentUser,
) -> Result<Json<SubscriptionChangeResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let subscription = {
        let mut repo = Subscriptions::new(&mut tx);
        repo.expire_lapsed(current_user.id).await?;
        let existing = repo
            .get_by_id(id)
            .await?
            .filter(|s| s.user_id == current_user.id)
            .ok_or_else(|| Error::not_found("Subscription", id))?;
        if existing.status != "active" {
            return Err(Error::bad_request("Subscription is not active"));
        }

        repo.update(
            id,
            &SubscriptionUpdateDBRequest {
                status: Some("cancelled".to_string()),
                ..Default::default()
            },
        )
        .await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(SubscriptionChangeResponse {
        message: "Subscription cancelled successfully".to_string(),
        subscription: SubscriptionResponse::from(subscription),
    }))
}

/// Deliveries of one of the caller's subscriptions
#[utoipa::path(
    get,
    path = "/subscriptions/{id}/deliveries",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Deliveries, most recent first", body = DeliveriesResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Subscription not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(subscription_id = %id))]
pub async fn list_deliveries(
    State(state): State<AppState>,
    Path(id): Path<SubscriptionId>,
    current_user: CurrentUser,
) -> Result<Json<DeliveriesResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Subscriptions::new(&mut conn);

    repo.get_by_id(id)
        .await?
        .filter(|s| s.user_id == current_user.id)
        .ok_or_else(|| Error::not_found("Subscription", id))?;
    let deliveries = repo.deliveries_for(id).await?;

    Ok(Json(DeliveriesResponse {
        deliveries: deliveries.into_iter().map(DeliveryResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::subscriptions::DeliveryCreateDBRequest;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_user};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[test]
    fn plan_type_parsing() {
        assert_eq!(parse_plan_type(Some(" Premium ")).unwrap(), PlanType::Premium);
        assert_eq!(
            parse_plan_type(None).unwrap_err().user_message(),
            "Missing required field: plan_type"
        );
        assert_eq!(parse_plan_type(Some("gold")).unwrap_err().user_message(), "Invalid plan type");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_plans_are_public(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/api/subscriptions/plans").await;
        response.assert_status_ok();
        let body: PlansResponse = response.json();
        let names: Vec<_> = body.plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Wellness Explorer", "Mixology Master", "Wellness Connoisseur"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_subscribe_once_then_cancel(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool).await;
        let auth = add_auth_headers(&user);

        server
            .post("/api/subscriptions")
            .json(&json!({"plan_type": "basic"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"plan_type": "premium"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["subscription"]["monthly_price"], json!(59.99));
        let created: SubscriptionChangeResponse = response.json();
        assert_eq!(created.subscription.plan_type, "premium");
        assert_eq!(created.subscription.virtual_class_credits, Some(2));
        assert!(created.subscription.is_active);
        let next_billing = created.subscription.next_billing_date.unwrap();
        assert_eq!((next_billing - Utc::now()).num_days(), BILLING_PERIOD_DAYS - 1);

        let response = server
            .post("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"plan_type": "elite"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "You already have an active subscription");

        let cancelled: SubscriptionChangeResponse = server
            .post(&format!("/api/subscriptions/{}/cancel", created.subscription.id))
            .add_header(&auth[0].0, &auth[0].1)
            .await
            .json();
        assert_eq!(cancelled.subscription.status, "cancelled");
        assert!(cancelled.subscription.cancelled_at.is_some());
        assert!(cancelled.subscription.next_billing_date.is_none());

        // A new plan is allowed once the old one is cancelled
        server
            .post("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"plan_type": "elite"}))
            .await
            .assert_status(StatusCode::CREATED);

        let listed: SubscriptionsResponse = server
            .get("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .await
            .json();
        assert_eq!(listed.subscriptions.len(), 2);
        assert_eq!(listed.subscriptions[0].plan_type, "elite");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lapsed_subscription_cannot_be_cancelled(pool: PgPool) {
        let user = create_test_user(&pool, false).await;
        let server = create_test_app(pool.clone()).await;
        let auth = add_auth_headers(&user);

        let created: SubscriptionChangeResponse = server
            .post("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .json(&json!({"plan_type": "basic"}))
            .await
            .json();
        let id = created.subscription.id;
        {
            let mut conn = pool.acquire().await.unwrap();
            Subscriptions::new(&mut conn)
                .update(
                    id,
                    &SubscriptionUpdateDBRequest {
                        end_date: Some(Utc::now() - Duration::days(3)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let response = server
            .post(&format!("/api/subscriptions/{id}/cancel"))
            .add_header(&auth[0].0, &auth[0].1)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Subscription is not active");

        let listed: SubscriptionsResponse = server
            .get("/api/subscriptions")
            .add_header(&auth[0].0, &auth[0].1)
            .await
            .json();
        assert_eq!(listed.subscriptions[0].status, "expired");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_other_users_subscriptions_are_hidden(pool: PgPool) {
        let owner = create_test_user(&pool, false).await;
        let stranger = create_test_user(&pool, false).await;
        let server = create_test_app(pool.clone()).await;
        let owner_auth = add_auth_headers(&owner);
        let stranger_auth = add_auth_headers(&stranger);

        let created: SubscriptionChangeResponse = server
            .post("/api/subscriptions")
            .add_header(&owner_auth[0].0, &owner_auth[0].1)
            .json(&json!({"plan_type": "basic"}))
            .await
            .json();
        let id = created.subscription.id;
        {
            let mut conn = pool.acquire().await.unwrap();
            Subscriptions::new(&mut conn)
                .add_delivery(&DeliveryCreateDBRequest {
                    subscription_id: id,
                    delivery_date: Utc::now(),
                    ingredients_included: json!(["Lime", "Mint"]),
                    recipes_included: json!([]),
                    total_value: None,
                    carrier: Some("Colissimo".to_string()),
                    tracking_number: Some("TRK123".to_string()),
                    estimated_delivery: None,
                })
                .await
                .unwrap();
        }

        server
            .get(&format!("/api/subscriptions/{id}/deliveries"))
            .add_header(&stranger_auth[0].0, &stranger_auth[0].1)
            .await
            .assert_status_not_found();
        server
            .post(&format!("/api/subscriptions/{id}/cancel"))
            .add_header(&stranger_auth[0].0, &stranger_auth[0].1)
            .await
            .assert_status_not_found();

        let deliveries: DeliveriesResponse = server
            .get(&format!("/api/subscriptions/{id}/deliveries"))
            .add_header(&owner_auth[0].0, &owner_auth[0].1)
            .await
            .json();
        assert_eq!(deliveries.deliveries.len(), 1);
        assert_eq!(deliveries.deliveries[0].tracking_number.as_deref(), Some("TRK123"));
        assert_eq!(deliveries.deliveries[0].status, "pending");
    }
}
