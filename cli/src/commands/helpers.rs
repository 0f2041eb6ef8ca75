use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use ladle_core::error::GatewayError;
use ladle_core::models::{AutocompleteSuggestion, DayPlan, MealSlot, Recipe, Review, SearchFilters};
use ladle_core::prefs;
use ladle_core::store::Store;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Flags win; otherwise fall back to the `diet`/`cuisine` preferences.
pub(crate) fn resolve_filters(
    store: &Store,
    diet: Option<String>,
    cuisine: Option<String>,
) -> Result<SearchFilters> {
    let defaults = prefs::default_filters(store)?;
    let flags = SearchFilters::new(diet, cuisine);
    Ok(SearchFilters {
        diet: flags.diet.or(defaults.diet),
        cuisine: flags.cuisine.or(defaults.cuisine),
    })
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing item and exit with status 2.
pub(crate) fn not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

/// Turn a gateway failure into a CLI error. 404s exit 2 like other lookups.
pub(crate) fn gateway_error(e: GatewayError, json: bool) -> anyhow::Error {
    if e.is_not_found() {
        not_found(&e.user_message(), json);
    }
    let message = e.user_message();
    anyhow::Error::new(e).context(message)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Rows are numbered from `first_index`, so later pages keep counting.
pub(crate) fn print_recipe_table(recipes: &[Recipe], first_index: usize) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Min")]
        minutes: String,
        #[tabled(rename = "Serves")]
        servings: String,
        #[tabled(rename = "Diets")]
        diets: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: first_index + i,
            id: r.id,
            title: truncate(&r.title, 45),
            minutes: if r.ready_in_minutes == 0 {
                "-".into()
            } else {
                r.ready_in_minutes.to_string()
            },
            servings: if r.servings == 0 {
                "-".into()
            } else {
                r.servings.to_string()
            },
            diets: truncate(&r.diets.join(", "), 30),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_suggestion_table(suggestions: &[AutocompleteSuggestion]) {
    #[derive(Tabled)]
    struct SuggestionRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
    }

    let rows: Vec<SuggestionRow> = suggestions
        .iter()
        .map(|s| SuggestionRow {
            id: s.id,
            title: truncate(&s.title, 60),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_recipe_detail(recipe: &Recipe, favorite: bool) {
    let star = if favorite { " ★" } else { "" };
    println!("{} (id: {}){star}", recipe.title, recipe.id);
    if recipe.ready_in_minutes > 0 || recipe.servings > 0 {
        println!(
            "Ready in {} min, serves {}",
            recipe.ready_in_minutes, recipe.servings
        );
    }
    if !recipe.diets.is_empty() {
        println!("Diets: {}", recipe.diets.join(", "));
    }
    if !recipe.cuisines.is_empty() {
        println!("Cuisines: {}", recipe.cuisines.join(", "));
    }
    let summary = recipe.plain_summary();
    if !summary.is_empty() {
        println!("\n{}", summary.trim());
    }

    if !recipe.extended_ingredients.is_empty() {
        #[derive(Tabled)]
        struct IngredientRow {
            #[tabled(rename = "Amount")]
            amount: String,
            #[tabled(rename = "Ingredient")]
            name: String,
        }
        let rows: Vec<IngredientRow> = recipe
            .extended_ingredients
            .iter()
            .map(|i| IngredientRow {
                amount: format!("{} {}", format_amount(i.amount), i.unit)
                    .trim()
                    .to_string(),
                name: i.name.clone(),
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()))
            .to_string();
        println!("\nIngredients:\n{table}");
    }

    if !recipe.analyzed_instruction_steps.is_empty() {
        println!("\nSteps:");
        for step in &recipe.analyzed_instruction_steps {
            println!("  {}. {}", step.number, step.step);
        }
    }

    let headline: Vec<String> = ["Calories", "Protein", "Carbohydrates", "Fat"]
        .iter()
        .filter_map(|name| recipe.nutrient(name))
        .map(|n| format!("{} {}{}", n.name, format_amount(n.amount), n.unit))
        .collect();
    if !headline.is_empty() {
        println!("\nPer serving: {}", headline.join(" | "));
    }
}

fn format_amount(v: f64) -> String {
    if (v - v.round()).abs() < 0.01 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

pub(crate) fn print_week(week: &[(NaiveDate, DayPlan)]) {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Breakfast")]
        breakfast: String,
        #[tabled(rename = "Lunch")]
        lunch: String,
        #[tabled(rename = "Dinner")]
        dinner: String,
    }

    let cell = |day: &DayPlan, slot: MealSlot| {
        day.in_slot(slot)
            .map(|m| format!("{} ({})", truncate(&m.title, 28), m.recipe_id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let rows: Vec<DayRow> = week
        .iter()
        .map(|(date, day)| DayRow {
            date: date.format("%a %Y-%m-%d").to_string(),
            breakfast: cell(day, MealSlot::Breakfast),
            lunch: cell(day, MealSlot::Lunch),
            dinner: cell(day, MealSlot::Dinner),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_review_table(reviews: &[Review]) {
    #[derive(Tabled)]
    struct ReviewRow {
        #[tabled(rename = "Rating")]
        rating: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Comment")]
        comment: String,
    }

    let rows: Vec<ReviewRow> = reviews
        .iter()
        .map(|r| ReviewRow {
            rating: format!("{}/{}", r.rating, ladle_core::models::MAX_RATING),
            name: truncate(&r.name, 20),
            comment: truncate(&r.comment, 60),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle_core::prefs::update_preferences;

    #[test]
    fn test_parse_date() {
        let d = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_date_relative() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("not-a-date".to_string())).is_err());
        assert!(parse_date(Some("2024-13-01".to_string())).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long recipe title", 10), "a very ...");
        assert_eq!(truncate("crème brûlée tart", 8), "crème...");
    }

    #[test]
    fn test_json_error_escapes() {
        assert_eq!(json_error("bad \"id\""), r#"{"error":"bad \"id\""}"#);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(1.333_333), "1.33");
    }

    #[test]
    fn test_resolve_filters_prefers_flags() {
        let store = Store::open_in_memory().unwrap();
        let patch = serde_json::json!({"diet": "vegan", "cuisine": "thai"});
        update_preferences(&store, patch.as_object().cloned().unwrap()).unwrap();

        let filters = resolve_filters(&store, Some("keto".to_string()), None).unwrap();
        assert_eq!(filters.diet.as_deref(), Some("keto"));
        assert_eq!(filters.cuisine.as_deref(), Some("thai"));

        let blank = resolve_filters(&store, Some("  ".to_string()), None).unwrap();
        assert_eq!(blank.diet.as_deref(), Some("vegan"));
    }
}
