use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::{
        cocktails::CategoriesResponse,
        ingredients::{
            IngredientDetail, IngredientEnvelope, IngredientInteractionResponse, IngredientListResponse,
            IngredientSummary, ListIngredientsQuery,
        },
        pagination::PaginationMeta,
    },
    db::{handlers::Ingredients, models::ingredients::IngredientFilter},
    errors::Error,
    types::IngredientId,
};

/// List active ingredients
#[utoipa::path(
    get,
    path = "/ingredients",
    tag = "ingredients",
    params(ListIngredientsQuery),
    responses(
        (status = 200, description = "Page of ingredients", body = IngredientListResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<ListIngredientsQuery>,
) -> Result<Json<IngredientListResponse>, Error> {
    let window = query.pagination.window(20, 50);
    let filter = IngredientFilter {
        category: query.category.filter(|c| !c.is_empty()),
        organic: query.organic,
        seasonal: query.seasonal,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        skip: window.skip(),
        limit: window.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ingredients::new(&mut conn);
    let ingredients = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(IngredientListResponse {
        ingredients: ingredients.iter().map(IngredientSummary::from).collect(),
        pagination: PaginationMeta::new(window, total),
    }))
}

/// Get an ingredient with nutrition facts and known interactions
#[utoipa::path(
    get,
    path = "/ingredients/{id}",
    tag = "ingredients",
    params(("id" = String, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientEnvelope),
        (status = 404, description = "Ingredient not found"),
    )
)]
#[tracing::instrument(skip_all, fields(ingredient_id = %id))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
) -> Result<Json<IngredientEnvelope>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ingredients::new(&mut conn);

    let ingredient = repo.get_active(id).await?.ok_or_else(|| Error::not_found("Ingredient", id))?;
    let interactions = repo.interactions_for(id).await?;

    // Both sides of every interaction, so each can be rendered by name
    let mut ids: Vec<IngredientId> = interactions
        .iter()
        .flat_map(|i| [i.ingredient1_id, i.ingredient2_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let related = repo.get_many(&ids).await?;

    let interactions = interactions
        .into_iter()
        .map(|i| IngredientInteractionResponse::resolve(i, &related))
        .collect();

    Ok(Json(IngredientEnvelope {
        ingredient: IngredientDetail::new(ingredient, interactions),
    }))
}

/// Ingredient categories in use
#[utoipa::path(
    get,
    path = "/ingredients/categories",
    tag = "ingredients",
    responses(
        (status = 200, description = "Categories", body = CategoriesResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn ingredient_categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = Ingredients::new(&mut conn).categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}
