use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ready_in_minutes: u32,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub diets: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub extended_ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub analyzed_instruction_steps: Vec<InstructionStep>,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
}

impl Recipe {
    /// Summary with HTML tags stripped, for plain-text display.
    #[must_use]
    pub fn plain_summary(&self) -> String {
        let mut out = String::with_capacity(self.summary.len());
        let mut in_tag = false;
        for c in self.summary.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[must_use]
    pub fn nutrient(&self, name: &str) -> Option<&Nutrient> {
        self.nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub number: u32,
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteSuggestion {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

/// Optional narrowing applied to a search. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl SearchFilters {
    #[must_use]
    pub fn new(diet: Option<String>, cuisine: Option<String>) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            diet: clean(diet),
            cuisine: clean(cuisine),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diet.is_none() && self.cuisine.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub results: Vec<Recipe>,
    /// Items upstream returned, including any dropped while converting.
    pub fetched: usize,
    pub offset: usize,
    pub number: usize,
    pub total_results: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_meal_slot(s)
    }
}

pub fn validate_meal_slot(slot: &str) -> Result<MealSlot> {
    match slot.trim().to_lowercase().as_str() {
        "breakfast" => Ok(MealSlot::Breakfast),
        "lunch" => Ok(MealSlot::Lunch),
        "dinner" => Ok(MealSlot::Dinner),
        _ => bail!(
            "Invalid meal slot '{slot}'. Must be one of: {}",
            MealSlot::ALL.map(MealSlot::as_str).join(", ")
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMeal {
    pub recipe_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    pub slot: MealSlot,
}

impl PlannedMeal {
    #[must_use]
    pub fn from_recipe(recipe: &Recipe, slot: MealSlot) -> Self {
        let image_type = recipe
            .image
            .as_deref()
            .and_then(|url| url.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .filter(|ext| !ext.contains('/'));
        Self {
            recipe_id: recipe.id,
            title: recipe.title.clone(),
            image_type,
            slot,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub meals: Vec<PlannedMeal>,
}

impl DayPlan {
    pub fn in_slot(&self, slot: MealSlot) -> impl Iterator<Item = &PlannedMeal> {
        self.meals.iter().filter(move |m| m.slot == slot)
    }
}

/// Weekly plan keyed by calendar date. Serialized with ISO `YYYY-MM-DD` keys.
pub type MealPlan = BTreeMap<NaiveDate, DayPlan>;

pub type UserPreferences = serde_json::Map<String, serde_json::Value>;

pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub recipe_id: i64,
    pub name: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Review name must not be empty");
        }
        if self.comment.trim().is_empty() {
            bail!("Review comment must not be empty");
        }
        if self.rating > MAX_RATING {
            bail!(
                "Rating must be between 0 and {MAX_RATING} (got {})",
                self.rating
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: 7,
            title: "Pasta Primavera".to_string(),
            image: Some("https://img.spoonacular.com/recipes/7-312x231.jpg".to_string()),
            ready_in_minutes: 25,
            servings: 4,
            diets: vec!["vegetarian".to_string()],
            cuisines: vec!["Italian".to_string()],
            summary: "A <b>bright</b> spring pasta.".to_string(),
            extended_ingredients: vec![Ingredient {
                id: 20420,
                amount: 200.0,
                unit: "g".to_string(),
                name: "pasta".to_string(),
            }],
            analyzed_instruction_steps: vec![InstructionStep {
                number: 1,
                step: "Boil the pasta.".to_string(),
            }],
            nutrients: vec![Nutrient {
                name: "Calories".to_string(),
                amount: 420.0,
                unit: "kcal".to_string(),
            }],
        }
    }

    #[test]
    fn test_plain_summary_strips_tags() {
        assert_eq!(sample_recipe().plain_summary(), "A bright spring pasta.");
    }

    #[test]
    fn test_nutrient_lookup_is_case_insensitive() {
        let r = sample_recipe();
        assert_eq!(r.nutrient("calories").map(|n| n.amount), Some(420.0));
        assert!(r.nutrient("protein").is_none());
    }

    #[test]
    fn test_recipe_serializes_camel_case() {
        let value = serde_json::to_value(sample_recipe()).unwrap();
        assert_eq!(value["readyInMinutes"], 25);
        assert!(value["extendedIngredients"].is_array());
        assert!(value["analyzedInstructionSteps"].is_array());
    }

    #[test]
    fn test_recipe_deserializes_with_missing_fields() {
        let r: Recipe = serde_json::from_str(r#"{"id": 3, "title": "Toast"}"#).unwrap();
        assert_eq!(r.id, 3);
        assert!(r.image.is_none());
        assert!(r.diets.is_empty());
        assert_eq!(r.ready_in_minutes, 0);
    }

    #[test]
    fn test_validate_meal_slot() {
        assert_eq!(validate_meal_slot("Lunch").unwrap(), MealSlot::Lunch);
        assert_eq!(" dinner ".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
        assert!(validate_meal_slot("snack").is_err());
    }

    #[test]
    fn test_search_filters_drop_blank_values() {
        let f = SearchFilters::new(Some("  ".to_string()), Some(" thai ".to_string()));
        assert!(f.diet.is_none());
        assert_eq!(f.cuisine.as_deref(), Some("thai"));
        assert!(SearchFilters::new(None, None).is_empty());
    }

    #[test]
    fn test_planned_meal_from_recipe() {
        let meal = PlannedMeal::from_recipe(&sample_recipe(), MealSlot::Lunch);
        assert_eq!(meal.recipe_id, 7);
        assert_eq!(meal.title, "Pasta Primavera");
        assert_eq!(meal.image_type.as_deref(), Some("jpg"));
        assert_eq!(meal.slot, MealSlot::Lunch);
    }

    #[test]
    fn test_meal_plan_serializes_iso_date_keys() {
        let mut plan = MealPlan::new();
        plan.insert(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            DayPlan {
                meals: vec![PlannedMeal::from_recipe(&sample_recipe(), MealSlot::Dinner)],
            },
        );
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["2024-01-01"]["meals"][0]["recipeId"], 7);
        assert_eq!(value["2024-01-01"]["meals"][0]["slot"], "dinner");
    }

    #[test]
    fn test_new_review_validation() {
        let ok = NewReview {
            name: "Jane".to_string(),
            rating: 5,
            comment: "Love it".to_string(),
        };
        assert!(ok.validate().is_ok());

        let mut blank_name = ok.clone();
        blank_name.name = "  ".to_string();
        assert!(blank_name.validate().is_err());

        let mut too_high = ok.clone();
        too_high.rating = 6;
        assert!(too_high.validate().is_err());

        let mut no_comment = ok;
        no_comment.comment = String::new();
        assert!(no_comment.validate().is_err());
    }
}
