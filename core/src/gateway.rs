use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::GatewayError;
use crate::models::{
    AutocompleteSuggestion, DayPlan, NewReview, Recipe, Review, SearchFilters, SearchPage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Connection settings for the remote recipe API, built once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Remote recipe API.
///
/// The CLI implements this with reqwest; tests implement it with canned data.
/// Implementations do not retry. Retry policy belongs to callers.
#[async_trait]
pub trait RecipeGateway: Send + Sync {
    async fn search_recipes(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        filters: &SearchFilters,
    ) -> GatewayResult<SearchPage>;

    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>>;

    async fn random_recipes(&self, count: usize) -> GatewayResult<Vec<Recipe>>;

    async fn recipe_detail(&self, id: i64) -> GatewayResult<Recipe>;

    async fn generate_meal_plan(
        &self,
        start_date: NaiveDate,
    ) -> GatewayResult<BTreeMap<NaiveDate, DayPlan>>;

    async fn reviews(&self, recipe_id: i64) -> GatewayResult<Vec<Review>>;

    async fn submit_review(&self, recipe_id: i64, review: &NewReview) -> GatewayResult<Review>;

    async fn similar_recipes(
        &self,
        recipe_id: i64,
        limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>>;

    async fn recipes_by_ingredients(
        &self,
        ingredients: &[String],
        limit: usize,
    ) -> GatewayResult<Vec<Recipe>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_url_joins_cleanly() {
        let cfg = GatewayConfig::new("https://api.example.com/", "k");
        assert_eq!(cfg.base_url, "https://api.example.com");
        assert_eq!(
            cfg.url("/recipes/random"),
            "https://api.example.com/recipes/random"
        );
        assert_eq!(
            cfg.url("recipes/42/information"),
            "https://api.example.com/recipes/42/information"
        );
    }
}
