//! Operations that combine a gateway call with a local state change.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::error::GatewayError;
use crate::favorites::Favorites;
use crate::gateway::{GatewayResult, RecipeGateway};
use crate::models::{MealPlan, MealSlot, NewReview, PlannedMeal, Recipe, Review};
use crate::planner::MealPlanner;

/// Toggle a favorite knowing only its id. Removing needs no network call;
/// adding fetches the full recipe so the stored snapshot is complete.
pub async fn toggle_favorite_by_id(
    gateway: &dyn RecipeGateway,
    favorites: &mut Favorites<'_>,
    id: i64,
) -> Result<bool> {
    if favorites.contains(id) {
        favorites.remove(id)?;
        return Ok(false);
    }
    let recipe = gateway
        .recipe_detail(id)
        .await
        .with_context(|| format!("Failed to fetch recipe {id}"))?;
    favorites.toggle(&recipe)?;
    Ok(true)
}

/// Look up a recipe to plan. Favorites are used as a local cache first.
pub async fn resolve_recipe(
    gateway: &dyn RecipeGateway,
    favorites: &Favorites<'_>,
    id: i64,
) -> GatewayResult<Recipe> {
    if let Some(r) = favorites.list().iter().find(|r| r.id == id) {
        return Ok(r.clone());
    }
    gateway.recipe_detail(id).await
}

pub async fn plan_recipe<'p>(
    gateway: &dyn RecipeGateway,
    favorites: &Favorites<'_>,
    planner: &'p mut MealPlanner<'_>,
    date: NaiveDate,
    slot: MealSlot,
    id: i64,
) -> Result<&'p MealPlan> {
    let recipe = resolve_recipe(gateway, favorites, id)
        .await
        .with_context(|| format!("Failed to fetch recipe {id}"))?;
    planner.add_meal(date, slot, &PlannedMeal::from_recipe(&recipe, slot))
}

/// Generate a week from `start` and adopt it, remembering `start` as the planner's week.
pub async fn generate_week<'p>(
    gateway: &dyn RecipeGateway,
    planner: &'p mut MealPlanner<'_>,
    start: NaiveDate,
) -> Result<&'p MealPlan> {
    let generated = gateway
        .generate_meal_plan(start)
        .await
        .context("Failed to generate meal plan")?;
    tracing::debug!(%start, days = generated.len(), "generated meal plan");
    planner.set_start_date(start)?;
    planner.replace_with_generated(generated)
}

/// Validate locally, then submit. Invalid reviews never reach the network.
pub async fn submit_review(
    gateway: &dyn RecipeGateway,
    recipe_id: i64,
    review: &NewReview,
) -> GatewayResult<Review> {
    review
        .validate()
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
    gateway.submit_review(recipe_id, review).await
}
