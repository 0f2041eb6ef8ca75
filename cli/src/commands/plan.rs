use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use ladle_core::favorites::Favorites;
use ladle_core::gateway::RecipeGateway;
use ladle_core::models::{DayPlan, validate_meal_slot};
use ladle_core::planner::MealPlanner;
use ladle_core::service::{generate_week, plan_recipe};
use ladle_core::store::Store;

use super::helpers::{not_found, parse_date, print_week};

fn show_week(planner: &MealPlanner<'_>, start: NaiveDate, json: bool) -> Result<()> {
    let week = planner.week(start);
    if json {
        let days: BTreeMap<String, &DayPlan> = week
            .iter()
            .map(|(date, day)| (date.to_string(), day))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "startDate": start,
                "days": days,
            }))?
        );
    } else {
        print_week(&week);
    }
    Ok(())
}

pub(crate) fn cmd_plan_show(store: &Store, start: Option<String>, json: bool) -> Result<()> {
    let planner = MealPlanner::load(store)?;
    let start = match start {
        Some(s) => parse_date(Some(s))?,
        None => planner.start_date(),
    };
    show_week(&planner, start, json)
}

pub(crate) async fn cmd_plan_add(
    store: &Store,
    gateway: &dyn RecipeGateway,
    date: &str,
    slot: &str,
    id: i64,
    json: bool,
) -> Result<()> {
    let date = parse_date(Some(date.to_string()))?;
    let slot = validate_meal_slot(slot)?;
    let favorites = Favorites::load(store)?;
    let mut planner = MealPlanner::load(store)?;

    let plan = plan_recipe(gateway, &favorites, &mut planner, date, slot, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.get(&date))?);
    } else {
        let title = plan
            .get(&date)
            .and_then(|d| d.meals.last())
            .map_or("recipe", |m| m.title.as_str());
        println!("Planned {title} for {slot} on {date}");
    }
    Ok(())
}

pub(crate) fn cmd_plan_remove(
    store: &Store,
    date: &str,
    index: usize,
    slot: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date(Some(date.to_string()))?;
    let slot = slot.map(validate_meal_slot).transpose()?;
    let mut planner = MealPlanner::load(store)?;

    let exists = match slot {
        Some(s) => planner.meals_for(date, s).len() > index,
        None => planner.day(date).is_some_and(|d| d.meals.len() > index),
    };
    if !exists {
        let scope = slot.map_or_else(String::new, |s| format!(" {s}"));
        not_found(&format!("No{scope} meal #{index} planned for {date}"), json);
    }

    let plan = match slot {
        Some(s) => planner.remove_meal_in_slot(date, s, index)?,
        None => planner.remove_meal(date, index)?,
    };

    if json {
        let day = plan.get(&date).cloned().unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        println!("Removed meal #{index} from {date}");
    }
    Ok(())
}

pub(crate) async fn cmd_plan_generate(
    store: &Store,
    gateway: &dyn RecipeGateway,
    start: Option<String>,
    json: bool,
) -> Result<()> {
    let mut planner = MealPlanner::load(store)?;
    let start = match start {
        Some(s) => parse_date(Some(s))?,
        None => planner.start_date(),
    };
    generate_week(gateway, &mut planner, start).await?;

    if !json {
        println!("Generated a meal plan for the week of {start}");
    }
    show_week(&planner, start, json)
}

pub(crate) fn cmd_plan_start(store: &Store, date: &str, json: bool) -> Result<()> {
    let date = parse_date(Some(date.to_string()))?;
    let mut planner = MealPlanner::load(store)?;
    planner.set_start_date(date)?;

    if json {
        println!("{}", serde_json::json!({ "startDate": date }));
    } else {
        println!("Meal planner week now starts {date}");
    }
    Ok(())
}

pub(crate) fn cmd_plan_clear(store: &Store, date: &str, json: bool) -> Result<()> {
    let date = parse_date(Some(date.to_string()))?;
    let mut planner = MealPlanner::load(store)?;
    if !planner.clear_day(date)? {
        not_found(&format!("No meals planned for {date}"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "cleared": date }));
    } else {
        println!("Cleared all meals on {date}");
    }
    Ok(())
}
