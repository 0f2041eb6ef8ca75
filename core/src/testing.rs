use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::error::GatewayError;
use crate::gateway::{GatewayResult, RecipeGateway};
use crate::models::{
    AutocompleteSuggestion, DayPlan, MealSlot, NewReview, PlannedMeal, Recipe, Review,
    SearchFilters, SearchPage,
};

/// Canned gateway: every query matches `total` recipes titled "<query> #<n>".
pub(crate) struct MockGateway {
    total: usize,
    delay: Duration,
    repeat_ids: bool,
    untitled: usize,
    fail_next: AtomicBool,
    search_offsets: Mutex<Vec<usize>>,
    autocomplete_calls: AtomicUsize,
}

impl MockGateway {
    pub(crate) fn with_total(total: usize) -> Self {
        Self {
            total,
            delay: Duration::ZERO,
            repeat_ids: false,
            untitled: 0,
            fail_next: AtomicBool::new(false),
            search_offsets: Mutex::new(Vec::new()),
            autocomplete_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every page reuses ids 1..=limit.
    pub(crate) fn repeating_ids(mut self) -> Self {
        self.repeat_ids = true;
        self
    }

    /// The first `count` hits of every page have no title and never convert.
    pub(crate) fn with_untitled(mut self, count: usize) -> Self {
        self.untitled = count;
        self
    }

    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_offsets.lock().unwrap().len()
    }

    pub(crate) fn search_offsets(&self) -> Vec<usize> {
        self.search_offsets.lock().unwrap().clone()
    }

    pub(crate) fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

pub(crate) fn recipe(id: i64, title: &str) -> Recipe {
    Recipe {
        id,
        title: title.to_string(),
        image: None,
        ready_in_minutes: 30,
        servings: 2,
        diets: Vec::new(),
        cuisines: Vec::new(),
        summary: String::new(),
        extended_ingredients: Vec::new(),
        analyzed_instruction_steps: Vec::new(),
        nutrients: Vec::new(),
    }
}

fn unsupported<T>() -> GatewayResult<T> {
    Err(GatewayError::InvalidRequest(
        "not supported by mock".to_string(),
    ))
}

#[async_trait]
impl RecipeGateway for MockGateway {
    async fn search_recipes(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        _filters: &SearchFilters,
    ) -> GatewayResult<SearchPage> {
        self.search_offsets.lock().unwrap().push(offset);
        self.pause().await;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        let end = (offset + limit).min(self.total);
        let fetched = end.saturating_sub(offset);
        let results = (offset..end)
            .enumerate()
            .skip(self.untitled)
            .map(|(i, n)| {
                let id = if self.repeat_ids { i + 1 } else { n + 1 };
                recipe(id as i64, &format!("{query} #{n}"))
            })
            .collect::<Vec<_>>();
        Ok(SearchPage {
            fetched,
            number: fetched,
            results,
            offset,
            total_results: self.total,
        })
    }

    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok((0..limit.min(self.total))
            .map(|i| AutocompleteSuggestion {
                id: i as i64 + 1,
                title: format!("{query} option {i}"),
                image_type: None,
            })
            .collect())
    }

    async fn random_recipes(&self, count: usize) -> GatewayResult<Vec<Recipe>> {
        Ok((0..count).map(|i| recipe(i as i64 + 1, "random")).collect())
    }

    async fn recipe_detail(&self, id: i64) -> GatewayResult<Recipe> {
        if id as usize > self.total {
            return Err(GatewayError::Api {
                status: 404,
                message: "not found".to_string(),
            });
        }
        Ok(recipe(id, &format!("recipe {id}")))
    }

    /// Breakfast on `start_date` and an empty day after it.
    async fn generate_meal_plan(
        &self,
        start_date: NaiveDate,
    ) -> GatewayResult<BTreeMap<NaiveDate, DayPlan>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        let meal = PlannedMeal {
            recipe_id: 101,
            title: "Generated oats".to_string(),
            image_type: Some("jpg".to_string()),
            slot: MealSlot::Breakfast,
        };
        let mut week = BTreeMap::new();
        week.insert(start_date, DayPlan { meals: vec![meal] });
        if let Some(next) = start_date.checked_add_days(Days::new(1)) {
            week.insert(next, DayPlan::default());
        }
        Ok(week)
    }

    async fn reviews(&self, _recipe_id: i64) -> GatewayResult<Vec<Review>> {
        unsupported()
    }

    async fn submit_review(&self, _recipe_id: i64, _review: &NewReview) -> GatewayResult<Review> {
        unsupported()
    }

    async fn similar_recipes(
        &self,
        _recipe_id: i64,
        _limit: usize,
    ) -> GatewayResult<Vec<AutocompleteSuggestion>> {
        unsupported()
    }

    async fn recipes_by_ingredients(
        &self,
        _ingredients: &[String],
        _limit: usize,
    ) -> GatewayResult<Vec<Recipe>> {
        unsupported()
    }
}
