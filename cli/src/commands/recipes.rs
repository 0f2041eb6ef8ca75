use anyhow::{Result, bail};
use std::process;
use std::sync::Arc;

use ladle_core::debounce::AUTOCOMPLETE_MIN_CHARS;
use ladle_core::favorites::Favorites;
use ladle_core::gateway::RecipeGateway;
use ladle_core::models::SearchFilters;
use ladle_core::pager::{PageOutcome, ResultPager, SearchSession};
use ladle_core::store::Store;

use super::helpers::{
    gateway_error, print_recipe_detail, print_recipe_table, print_suggestion_table,
};

/// Load up to `pages` pages, stopping early once the results run out.
///
/// A failure after the first page keeps what was loaded and warns; a failure
/// on the first page is an error.
pub(crate) async fn collect_pages(
    pager: &ResultPager,
    pages: usize,
    json: bool,
) -> Result<SearchSession> {
    for _ in 0..pages.max(1) {
        match pager.load_next_page().await {
            PageOutcome::Loaded {
                exhausted: false, ..
            } => {}
            PageOutcome::Loaded { .. }
            | PageOutcome::Exhausted
            | PageOutcome::InFlight
            | PageOutcome::Stale => break,
            PageOutcome::Failed(e) => {
                if pager.session().results.is_empty() {
                    return Err(gateway_error(e, json));
                }
                eprintln!("Warning: {}", e.user_message());
                break;
            }
        }
    }
    Ok(pager.session())
}

pub(crate) async fn cmd_search(
    gateway: Arc<dyn RecipeGateway>,
    query: &str,
    filters: SearchFilters,
    pages: usize,
    page_size: usize,
    json: bool,
) -> Result<()> {
    let pager = ResultPager::new(gateway, page_size);
    pager.reset(query.trim(), filters);
    let session = collect_pages(&pager, pages, json).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else if !session.results.is_empty() {
        print_recipe_table(&session.results, 1);
        let shown = session.results.len();
        match session.total_results {
            Some(total) if !session.exhausted => {
                println!("Showing {shown} of {total} results. Use --pages to load more.");
            }
            _ => println!("{shown} results"),
        }
    }

    if session.results.is_empty() {
        if !json {
            eprintln!("No recipes found for '{query}'");
        }
        process::exit(2);
    }

    Ok(())
}

pub(crate) async fn cmd_random(gateway: &dyn RecipeGateway, count: usize, json: bool) -> Result<()> {
    let recipes = gateway
        .random_recipes(count.max(1))
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else {
        print_recipe_table(&recipes, 1);
    }
    Ok(())
}

pub(crate) async fn cmd_show(
    store: &Store,
    gateway: &dyn RecipeGateway,
    id: i64,
    json: bool,
) -> Result<()> {
    let recipe = gateway
        .recipe_detail(id)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let favorite = Favorites::load(store)?.contains(id);
        print_recipe_detail(&recipe, favorite);
    }
    Ok(())
}

pub(crate) async fn cmd_suggest(
    gateway: &dyn RecipeGateway,
    prefix: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let prefix = prefix.trim();
    if prefix.chars().count() < AUTOCOMPLETE_MIN_CHARS {
        bail!("Type at least {AUTOCOMPLETE_MIN_CHARS} characters for suggestions");
    }
    let suggestions = gateway
        .autocomplete(prefix, limit)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        eprintln!("No suggestions for '{prefix}'");
        process::exit(2);
    } else {
        print_suggestion_table(&suggestions);
    }
    Ok(())
}

pub(crate) async fn cmd_similar(
    gateway: &dyn RecipeGateway,
    id: i64,
    limit: usize,
    json: bool,
) -> Result<()> {
    let similar = gateway
        .similar_recipes(id, limit)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&similar)?);
    } else if similar.is_empty() {
        eprintln!("No similar recipes found for {id}");
        process::exit(2);
    } else {
        print_suggestion_table(&similar);
    }
    Ok(())
}

pub(crate) async fn cmd_pantry(
    gateway: &dyn RecipeGateway,
    ingredients: &[String],
    limit: usize,
    json: bool,
) -> Result<()> {
    if ingredients.iter().all(|i| i.trim().is_empty()) {
        bail!("Give at least one ingredient");
    }
    let recipes = gateway
        .recipes_by_ingredients(ingredients, limit)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else if recipes.is_empty() {
        eprintln!("No recipes use {}", ingredients.join(", "));
        process::exit(2);
    } else {
        print_recipe_table(&recipes, 1);
    }
    Ok(())
}
