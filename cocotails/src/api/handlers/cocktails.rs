use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        cocktails::{
            CategoriesResponse, CocktailEnvelope, CocktailIngredientResponse, CocktailListResponse, CocktailResponse,
            CocktailSearchResponse, CocktailsResponse, FavoriteToggleResponse, FeaturedQuery, ListCocktailsQuery,
            ReviewApproval, ReviewCreate, ReviewCreatedResponse, ReviewEnvelope, ReviewListResponse, ReviewResponse,
            SearchQuery, rounded_rating,
        },
        pagination::{PageParams, PaginationMeta},
        users::CurrentUser,
    },
    db::{
        handlers::{Cocktails, Ingredients, Repository, Reviews},
        models::cocktails::{CocktailFilter, ReviewCreateDBRequest, ReviewFilter, ReviewUpdateDBRequest},
    },
    errors::Error,
    types::{CocktailId, Operation, Resource, ReviewId},
    validation::{sanitize_optional, validate_rating},
};

/// Collect every `dietary_tags` value; the typed query only keeps one.
fn dietary_tags(pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .filter(|(key, value)| key == "dietary_tags" && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
        .collect()
}

/// A rating must be a JSON integer from 1 to 5.
fn parse_rating(value: Option<&serde_json::Value>) -> Result<i32, Error> {
    let rating = value.and_then(serde_json::Value::as_i64);
    match rating {
        Some(r) if validate_rating(r) => Ok(r as i32),
        _ => Err(Error::bad_request("Rating must be between 1 and 5")),
    }
}

/// List active cocktails
#[utoipa::path(
    get,
    path = "/cocktails",
    tag = "cocktails",
    params(ListCocktailsQuery),
    responses(
        (status = 200, description = "Page of cocktails", body = CocktailListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_cocktails(
    State(state): State<AppState>,
    Query(mut query): Query<ListCocktailsQuery>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CocktailListResponse>, Error> {
    query.dietary_tags = dietary_tags(&pairs);
    let window = query.pagination.window(12, 50);

    let filter = CocktailFilter {
        category: query.category.filter(|c| !c.is_empty()),
        difficulty: query.difficulty.filter(|d| !d.is_empty()),
        dietary_tags: query.dietary_tags,
        featured: query.featured,
        premium: query.premium,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        skip: window.skip(),
        limit: window.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cocktails::new(&mut conn);
    let cocktails = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(CocktailListResponse {
        cocktails: cocktails.into_iter().map(CocktailResponse::from).collect(),
        pagination: PaginationMeta::new(window, total),
    }))
}

/// Get a cocktail with its recipe
#[utoipa::path(
    get,
    path = "/cocktails/{id}",
    tag = "cocktails",
    params(("id" = String, Path, description = "Cocktail ID")),
    responses(
        (status = 200, description = "Cocktail", body = CocktailEnvelope),
        (status = 404, description = "Cocktail not found"),
    )
)]
#[tracing::instrument(skip_all, fields(cocktail_id = %id))]
pub async fn get_cocktail(State(state): State<AppState>, Path(id): Path<CocktailId>) -> Result<Json<CocktailEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (cocktail, lines) = {
        let mut repo = Cocktails::new(&mut conn);
        let cocktail = repo.get_active(id).await?.ok_or_else(|| Error::not_found("Cocktail", id))?;
        (cocktail, repo.ingredients_for(id).await?)
    };

    let ingredient_ids: Vec<_> = lines.iter().map(|line| line.ingredient_id).collect();
    let ingredients = Ingredients::new(&mut conn).get_many(&ingredient_ids).await?;
    let lines = lines
        .into_iter()
        .map(|line| CocktailIngredientResponse::resolve(line, &ingredients))
        .collect();

    Ok(Json(CocktailEnvelope {
        cocktail: CocktailResponse::from(cocktail).with_ingredients(lines),
    }))
}

/// List approved reviews of a cocktail
#[utoipa::path(
    get,
    path = "/cocktails/{id}/reviews",
    tag = "cocktails",
    params(("id" = String, Path, description = "Cocktail ID"), PageParams),
    responses(
        (status = 200, description = "Page of reviews", body = ReviewListResponse),
        (status = 404, description = "Cocktail not found"),
    )
)]
#[tracing::instrument(skip_all, fields(cocktail_id = %id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<CocktailId>,
    Query(pagination): Query<PageParams>,
) -> Result<Json<ReviewListResponse>, Error> {
    let window = pagination.window(10, 50);
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Cocktails::new(&mut conn)
        .get_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Cocktail", id))?;

    let filter = ReviewFilter {
        cocktail_id: Some(id),
        approved_only: true,
        skip: window.skip(),
        limit: window.limit(),
        ..Default::default()
    };
    let mut repo = Reviews::new(&mut conn);
    let reviews = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;
    let average = repo.average_rating(id).await?;

    Ok(Json(ReviewListResponse {
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
        pagination: PaginationMeta::new(window, total),
        average_rating: rounded_rating(average),
    }))
}

/// Review a cocktail. Each user may review a cocktail once.
#[utoipa::path(
    post,
    path = "/cocktails/{id}/reviews",
    tag = "cocktails",
    request_body = ReviewCreate,
    params(("id" = String, Path, description = "Cocktail ID")),
    responses(
        (status = 201, description = "Review created", body = ReviewCreatedResponse),
        (status = 400, description = "Invalid rating or already reviewed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Cocktail not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(cocktail_id = %id))]
pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<CocktailId>,
    current_user: CurrentUser,
    Json(request): Json<ReviewCreate>,
) -> Result<(StatusCode, Json<ReviewCreatedResponse>), Error> {
    let rating = parse_rating(request.rating.as_ref())?;
    let already_reviewed = || Error::bad_request("You have already reviewed this cocktail");

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    Cocktails::new(&mut tx)
        .get_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Cocktail", id))?;

    let review = {
        let mut repo = Reviews::new(&mut tx);
        if repo.exists_for(current_user.id, id).await? {
            return Err(already_reviewed());
        }
        repo.create(&ReviewCreateDBRequest {
            cocktail_id: id,
            user_id: current_user.id,
            rating,
            title: sanitize_optional(request.title.as_deref(), 200),
            comment: sanitize_optional(request.comment.as_deref(), 2000),
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_of("cocktail_reviews_user_cocktail_key") {
                already_reviewed()
            } else {
                Error::Database(e)
            }
        })?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            message: "Review submitted successfully".to_string(),
            review: ReviewResponse::from(review),
        }),
    ))
}

/// Add the cocktail to the caller's favorites, or remove it if already there
#[utoipa::path(
    post,
    path = "/cocktails/{id}/favorite",
    tag = "cocktails",
    params(("id" = String, Path, description = "Cocktail ID")),
    responses(
        (status = 200, description = "Favorite toggled", body = FavoriteToggleResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Cocktail not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(cocktail_id = %id))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<CocktailId>,
    current_user: CurrentUser,
) -> Result<Json<FavoriteToggleResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let is_favorite = {
        let mut repo = Cocktails::new(&mut tx);
        repo.get_active(id).await?.ok_or_else(|| Error::not_found("Cocktail", id))?;
        repo.toggle_favorite(current_user.id, id).await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let message = if is_favorite { "Added to favorites" } else { "Removed from favorites" };
    Ok(Json(FavoriteToggleResponse {
        message: message.to_string(),
        is_favorite,
    }))
}

/// Featured cocktails
#[utoipa::path(
    get,
    path = "/cocktails/featured",
    tag = "cocktails",
    params(FeaturedQuery),
    responses(
        (status = 200, description = "Featured cocktails", body = CocktailsResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn featured_cocktails(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<CocktailsResponse>, Error> {
    let limit = query.limit.unwrap_or(6).clamp(1, 20);
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let cocktails = Cocktails::new(&mut conn).featured(limit).await?;

    Ok(Json(CocktailsResponse {
        cocktails: cocktails.into_iter().map(CocktailResponse::from).collect(),
    }))
}

/// Wellness categories in use
#[utoipa::path(
    get,
    path = "/cocktails/categories",
    tag = "cocktails",
    responses(
        (status = 200, description = "Categories", body = CategoriesResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn cocktail_categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = Cocktails::new(&mut conn).categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Search by name, description or health benefit
#[utoipa::path(
    get,
    path = "/cocktails/search",
    tag = "cocktails",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching cocktails", body = CocktailSearchResponse),
        (status = 400, description = "Missing search query"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_cocktails(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CocktailSearchResponse>, Error> {
    let term = query
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::bad_request("Search query is required"))?;
    let limit = query.limit.unwrap_or(20).clamp(1, 50);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let cocktails: Vec<CocktailResponse> = Cocktails::new(&mut conn)
        .search(&term, limit)
        .await?
        .into_iter()
        .map(CocktailResponse::from)
        .collect();

    Ok(Json(CocktailSearchResponse {
        total: cocktails.len(),
        cocktails,
        query: term,
    }))
}

/// Approve or hide a review (admin only)
#[utoipa::path(
    put,
    path = "/cocktails/reviews/{id}/approval",
    tag = "cocktails",
    request_body = ReviewApproval,
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review updated", body = ReviewEnvelope),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Review not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(review_id = %id))]
pub async fn moderate_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
    current_user: CurrentUser,
    Json(request): Json<ReviewApproval>,
) -> Result<Json<ReviewEnvelope>, Error> {
    current_user.require_admin(Operation::Moderate, Resource::Reviews)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Reviews::new(&mut conn);
    repo.get_by_id(id).await?.ok_or_else(|| Error::not_found("Review", id))?;
    let review = repo
        .update(
            id,
            &ReviewUpdateDBRequest {
                is_approved: Some(request.is_approved),
            },
        )
        .await?;

    Ok(Json(ReviewEnvelope {
        review: ReviewResponse::from(review),
    }))
}
