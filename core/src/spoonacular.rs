use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Deserialize;

use crate::models::{
    AutocompleteSuggestion, DayPlan, Ingredient, InstructionStep, MealSlot, Nutrient, PlannedMeal,
    Recipe, SearchPage,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexSearchResponse {
    #[serde(default)]
    pub results: Vec<RecipeInfo>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub number: usize,
    #[serde(default)]
    pub total_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct RandomResponse {
    #[serde(default)]
    pub recipes: Vec<RecipeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInfo {
    pub id: i64,
    pub title: Option<String>,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub diets: Option<Vec<String>>,
    pub cuisines: Option<Vec<String>>,
    pub summary: Option<String>,
    pub extended_ingredients: Option<Vec<IngredientData>>,
    pub analyzed_instructions: Option<Vec<InstructionData>>,
    pub nutrition: Option<NutritionData>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientData {
    pub id: Option<i64>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstructionData {
    #[serde(default)]
    pub steps: Vec<StepData>,
}

#[derive(Debug, Deserialize)]
pub struct StepData {
    pub number: u32,
    pub step: String,
}

#[derive(Debug, Deserialize)]
pub struct NutritionData {
    #[serde(default)]
    pub nutrients: Vec<NutrientData>,
}

#[derive(Debug, Deserialize)]
pub struct NutrientData {
    pub name: String,
    pub amount: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MealPlanWeekResponse {
    pub week: HashMap<String, MealPlanDay>,
}

#[derive(Debug, Deserialize)]
pub struct MealPlanDay {
    #[serde(default)]
    pub meals: Vec<MealPlanMeal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanMeal {
    pub id: i64,
    pub title: String,
    pub image_type: Option<String>,
}

/// Body of a non-2xx response. Spoonacular sends `{"status": "failure", "code": 402, "message": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

/// Convert a wire recipe into the domain model. Returns `None` for entries
/// without a usable title.
#[must_use]
pub fn info_to_recipe(info: RecipeInfo) -> Option<Recipe> {
    let title = info.title.filter(|t| !t.trim().is_empty())?;

    let extended_ingredients = info
        .extended_ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| {
            Some(Ingredient {
                id: i.id.unwrap_or_default(),
                amount: i.amount.unwrap_or_default(),
                unit: i.unit.unwrap_or_default(),
                name: i.name.filter(|n| !n.is_empty())?,
            })
        })
        .collect();

    // Recipes may split instructions into several titled sections; keep them in order.
    let analyzed_instruction_steps = info
        .analyzed_instructions
        .unwrap_or_default()
        .into_iter()
        .flat_map(|section| section.steps)
        .map(|s| InstructionStep {
            number: s.number,
            step: s.step,
        })
        .collect();

    let nutrients = info
        .nutrition
        .map(|n| n.nutrients)
        .unwrap_or_default()
        .into_iter()
        .map(|n| Nutrient {
            name: n.name,
            amount: n.amount,
            unit: n.unit.unwrap_or_default(),
        })
        .collect();

    Some(Recipe {
        id: info.id,
        title,
        image: info.image.filter(|i| !i.is_empty()),
        ready_in_minutes: info.ready_in_minutes.unwrap_or_default(),
        servings: info.servings.unwrap_or_default(),
        diets: info.diets.unwrap_or_default(),
        cuisines: info.cuisines.unwrap_or_default(),
        summary: info.summary.unwrap_or_default(),
        extended_ingredients,
        analyzed_instruction_steps,
        nutrients,
    })
}

#[must_use]
pub fn search_to_page(resp: ComplexSearchResponse) -> SearchPage {
    SearchPage {
        fetched: resp.results.len(),
        results: resp.results.into_iter().filter_map(info_to_recipe).collect(),
        offset: resp.offset,
        number: resp.number,
        total_results: resp.total_results,
    }
}

#[must_use]
pub fn meal_to_suggestion(meal: MealPlanMeal) -> AutocompleteSuggestion {
    AutocompleteSuggestion {
        id: meal.id,
        title: meal.title,
        image_type: meal.image_type,
    }
}

/// Place a generated week onto calendar dates starting at `start`.
///
/// Day keys are weekday names. Each lands on the date in `[start, start + 7)`
/// with that weekday. Meals take breakfast, lunch, dinner slots by position;
/// unknown day names and meals past the third are dropped.
#[must_use]
pub fn week_to_plan(start: NaiveDate, resp: MealPlanWeekResponse) -> BTreeMap<NaiveDate, DayPlan> {
    let mut plan = BTreeMap::new();
    for (day_name, day) in resp.week {
        let Ok(weekday) = day_name.parse::<Weekday>() else {
            tracing::debug!(day = %day_name, "skipping unknown weekday in generated plan");
            continue;
        };
        let Some(date) = date_in_week(start, weekday) else {
            continue;
        };
        let meals = day
            .meals
            .into_iter()
            .zip(MealSlot::ALL)
            .map(|(m, slot)| PlannedMeal {
                recipe_id: m.id,
                title: m.title,
                image_type: m.image_type,
                slot,
            })
            .collect();
        plan.insert(date, DayPlan { meals });
    }
    plan
}

fn date_in_week(start: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - start.weekday().num_days_from_monday()) % 7;
    start.checked_add_days(Days::new(u64::from(ahead)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_info() -> RecipeInfo {
        serde_json::from_str(
            r#"{
                "id": 716429,
                "title": "Pasta with Garlic, Scallions, Cauliflower & Breadcrumbs",
                "image": "https://img.spoonacular.com/recipes/716429-556x370.jpg",
                "readyInMinutes": 45,
                "servings": 2,
                "diets": ["dairy free"],
                "cuisines": ["Italian"],
                "summary": "You can never have too many <b>main course</b> recipes.",
                "extendedIngredients": [
                    {"id": 1001, "amount": 1.0, "unit": "tbsp", "name": "butter"},
                    {"id": 2, "amount": 2.0, "unit": "", "name": ""}
                ],
                "analyzedInstructions": [
                    {"name": "", "steps": [{"number": 1, "step": "Boil water."}]},
                    {"name": "Sauce", "steps": [{"number": 1, "step": "Melt butter."}]}
                ],
                "nutrition": {"nutrients": [{"name": "Calories", "amount": 584.46, "unit": "kcal"}]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_info_to_recipe_complete() {
        let r = info_to_recipe(full_info()).unwrap();
        assert_eq!(r.id, 716_429);
        assert_eq!(r.ready_in_minutes, 45);
        assert_eq!(r.servings, 2);
        assert_eq!(r.diets, vec!["dairy free"]);
        assert_eq!(r.cuisines, vec!["Italian"]);
        // Nameless ingredient is dropped
        assert_eq!(r.extended_ingredients.len(), 1);
        assert_eq!(r.extended_ingredients[0].name, "butter");
        assert_eq!(r.analyzed_instruction_steps.len(), 2);
        assert_eq!(r.analyzed_instruction_steps[1].step, "Melt butter.");
        assert_eq!(r.nutrients[0].unit, "kcal");
    }

    #[test]
    fn test_info_to_recipe_missing_title() {
        let mut info = full_info();
        info.title = None;
        assert!(info_to_recipe(info).is_none());

        let mut blank = full_info();
        blank.title = Some("   ".to_string());
        assert!(info_to_recipe(blank).is_none());
    }

    #[test]
    fn test_info_to_recipe_minimal_search_hit() {
        let info: RecipeInfo = serde_json::from_str(
            r#"{"id": 1, "title": "Toast", "image": "https://x/1.jpg", "imageType": "jpg"}"#,
        )
        .unwrap();
        let r = info_to_recipe(info).unwrap();
        assert_eq!(r.title, "Toast");
        assert!(r.extended_ingredients.is_empty());
        assert!(r.nutrients.is_empty());
        assert_eq!(r.servings, 0);
    }

    #[test]
    fn test_search_to_page() {
        let resp: ComplexSearchResponse = serde_json::from_str(
            r#"{"results": [{"id": 1, "title": "A"}, {"id": 2}], "offset": 10, "number": 10, "totalResults": 14}"#,
        )
        .unwrap();
        let page = search_to_page(resp);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.fetched, 2);
        assert_eq!(page.offset, 10);
        assert_eq!(page.total_results, 14);
    }

    #[test]
    fn test_week_to_plan_places_days_from_start() {
        let resp: MealPlanWeekResponse = serde_json::from_str(
            r#"{"week": {
                "monday": {"meals": [
                    {"id": 1, "title": "Oats", "imageType": "jpg"},
                    {"id": 2, "title": "Salad", "imageType": "png"},
                    {"id": 3, "title": "Curry", "imageType": "jpg"},
                    {"id": 4, "title": "Extra", "imageType": "jpg"}
                ]},
                "wednesday": {"meals": [{"id": 5, "title": "Soup", "imageType": "jpg"}]},
                "someday": {"meals": []}
            }}"#,
        )
        .unwrap();
        // 2024-01-03 is a Wednesday
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let plan = week_to_plan(start, resp);

        assert_eq!(plan.len(), 2);
        let wed = &plan[&start];
        assert_eq!(wed.meals[0].title, "Soup");
        assert_eq!(wed.meals[0].slot, MealSlot::Breakfast);

        let mon = &plan[&NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()];
        assert_eq!(mon.meals.len(), 3);
        assert_eq!(mon.meals[1].slot, MealSlot::Lunch);
        assert_eq!(mon.meals[2].recipe_id, 3);
    }

    #[test]
    fn test_date_in_week_wraps() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(); // Wednesday
        assert_eq!(date_in_week(start, Weekday::Wed), Some(start));
        assert_eq!(
            date_in_week(start, Weekday::Tue),
            NaiveDate::from_ymd_opt(2024, 1, 9)
        );
    }
}
