use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use ladle_core::error::GatewayError;
use ladle_core::gateway::{GatewayConfig, GatewayResult, RecipeGateway};
use ladle_core::models::{
    AutocompleteSuggestion, DayPlan, NewReview, Recipe, Review, SearchFilters, SearchPage,
};
use ladle_core::spoonacular::{
    ApiErrorBody, ComplexSearchResponse, MealPlanMeal, MealPlanWeekResponse, RandomResponse,
    RecipeInfo, info_to_recipe, meal_to_suggestion, search_to_page, week_to_plan,
};

type Params = Vec<(&'static str, String)>;

pub struct SpoonacularClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl SpoonacularClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "ladle/{} (recipe discovery)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.query(&[("apiKey", self.config.api_key.as_str())])
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &Params) -> GatewayResult<T> {
        let url = self.config.url(path);
        tracing::debug!(%url, "GET");
        let resp = self
            .authed(self.client.get(&url))
            .query(params)
            .send()
            .await
            .map_err(network_error)?;
        decode_response(resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .authed(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        decode_response(resp).await
    }
}

fn network_error(e: reqwest::Error) -> GatewayError {
    let detail = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "could not connect to the recipe API".to_string()
    } else {
        e.to_string()
    };
    GatewayError::Network(detail)
}

async fn decode_response<T: DeserializeOwned>(resp: Response) -> GatewayResult<T> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(network_error)?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

pub(crate) fn search_params(
    query: &str,
    offset: usize,
    limit: usize,
    filters: &SearchFilters,
) -> Params {
    let mut params = vec![
        ("query", query.trim().to_string()),
        ("offset", offset.to_string()),
        ("number", limit.to_string()),
        ("addRecipeInformation", "true".to_string()),
    ];
    if let Some(diet) = &filters.diet {
        params.push(("diet", diet.clone()));
    }
    if let Some(cuisine) = &filters.cuisine {
        params.push(("cuisine", cuisine.clone()));
    }
    params
}

pub(crate) fn ingredients_param(ingredients: &[String]) -> String {
    ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn require_recipe(info: RecipeInfo) -> GatewayResult<Recipe> {
    let id = info.id;
    info_to_recipe(info).ok_or_else(|| GatewayError::Decode(format!("recipe {id} has no title")))
}

#[async_trait]
impl RecipeGateway for SpoonacularClient {
    async fn search_recipes(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        filters: &SearchFilters,
    ) -> GatewayResult<SearchPage> {
        let data: ComplexSearchResponse = self
            .get_json(
                "/recipes/complexSearch",
                &search_params(query, offset, limit, filters),
            )
            .await?;
        Ok(search_to_page(data))
    }

    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>> {
        self.get_json(
            "/recipes/autocomplete",
            &vec![("query", query.to_string()), ("number", limit.to_string())],
        )
        .await
    }

    async fn random_recipes(&self, count: usize) -> GatewayResult<Vec<Recipe>> {
        let data: RandomResponse = self
            .get_json("/recipes/random", &vec![("number", count.to_string())])
            .await?;
        Ok(data.recipes.into_iter().filter_map(info_to_recipe).collect())
    }

    async fn recipe_detail(&self, id: i64) -> GatewayResult<Recipe> {
        let info: RecipeInfo = self
            .get_json(
                &format!("/recipes/{id}/information"),
                &vec![("includeNutrition", "true".to_string())],
            )
            .await?;
        require_recipe(info)
    }

    async fn generate_meal_plan(
        &self,
        start_date: NaiveDate,
    ) -> GatewayResult<BTreeMap<NaiveDate, DayPlan>> {
        let data: MealPlanWeekResponse = self
            .get_json(
                "/mealplanner/generate",
                &vec![
                    ("timeFrame", "week".to_string()),
                    ("startDate", start_date.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        Ok(week_to_plan(start_date, data))
    }

    async fn reviews(&self, recipe_id: i64) -> GatewayResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .get_json(&format!("/recipes/{recipe_id}/reviews"), &Vec::new())
            .await?;
        for r in &mut reviews {
            r.recipe_id = recipe_id;
        }
        Ok(reviews)
    }

    async fn submit_review(&self, recipe_id: i64, review: &NewReview) -> GatewayResult<Review> {
        let mut created: Review = self
            .post_json(&format!("/recipes/{recipe_id}/reviews"), review)
            .await?;
        created.recipe_id = recipe_id;
        Ok(created)
    }

    async fn similar_recipes(
        &self,
        recipe_id: i64,
        limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>> {
        let similar: Vec<MealPlanMeal> = self
            .get_json(
                &format!("/recipes/{recipe_id}/similar"),
                &vec![("number", limit.to_string())],
            )
            .await?;
        Ok(similar.into_iter().map(meal_to_suggestion).collect())
    }

    async fn recipes_by_ingredients(
        &self,
        ingredients: &[String],
        limit: usize,
    ) -> GatewayResult<Vec<Recipe>> {
        let found: Vec<RecipeInfo> = self
            .get_json(
                "/recipes/findByIngredients",
                &vec![
                    ("ingredients", ingredients_param(ingredients)),
                    ("number", limit.to_string()),
                ],
            )
            .await?;
        Ok(found.into_iter().filter_map(info_to_recipe).collect())
    }
}
