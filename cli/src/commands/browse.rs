use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use ladle_core::debounce::{
    DEFAULT_AUTOCOMPLETE_LIMIT, DEFAULT_QUIET, QuerySnapshot, autocomplete_debouncer,
    search_debouncer,
};
use ladle_core::favorites::Favorites;
use ladle_core::gateway::RecipeGateway;
use ladle_core::models::{AutocompleteSuggestion, Recipe, SearchFilters};
use ladle_core::pager::{PageOutcome, ResultPager, SearchSession};
use ladle_core::store::Store;

use super::helpers::{print_recipe_table, truncate};

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Quit,
    More,
    Help,
    /// 1-based result number.
    Favorite(usize),
    Query(String),
    Invalid(String),
}

fn parse_command(line: &str) -> BrowseCommand {
    let trimmed = line.trim();
    let Some(cmd) = trimmed.strip_prefix(':') else {
        return BrowseCommand::Query(trimmed.to_string());
    };
    let mut parts = cmd.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("q" | "quit"), None, None) => BrowseCommand::Quit,
        (Some("more" | "m"), None, None) => BrowseCommand::More,
        (Some("help" | "h"), None, None) => BrowseCommand::Help,
        (Some("fav" | "f"), Some(n), None) => match n.parse::<usize>() {
            Ok(n) if n > 0 => BrowseCommand::Favorite(n),
            _ => BrowseCommand::Invalid(format!("Invalid result number '{n}'")),
        },
        (Some("fav" | "f"), None, None) => {
            BrowseCommand::Invalid("Usage: :fav <result number>".to_string())
        }
        _ => BrowseCommand::Invalid(format!("Unknown command ':{cmd}'. Type :help")),
    }
}

fn print_help() {
    println!("Type to search. Commands: :more  :fav N  :help  :quit");
}

/// Interactive search: each typed line feeds the debounced search and
/// autocomplete, `:more` pages forward, `:fav N` toggles a favorite.
pub(crate) async fn cmd_browse(
    store: &Store,
    gateway: Arc<dyn RecipeGateway>,
    filters: SearchFilters,
    page_size: usize,
) -> Result<()> {
    let pager = Arc::new(ResultPager::new(Arc::clone(&gateway), page_size));
    pager.reset("", filters);
    let search = search_debouncer(Arc::clone(&pager), DEFAULT_QUIET);
    let suggest = autocomplete_debouncer(gateway, DEFAULT_QUIET, DEFAULT_AUTOCOMPLETE_LIMIT);
    let mut search_rx = search.subscribe();
    let mut suggest_rx = suggest.subscribe();
    let mut favorites = Favorites::load(store)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_command(&line) {
                    BrowseCommand::Quit => break,
                    BrowseCommand::Help => print_help(),
                    BrowseCommand::More => load_more(&pager, &favorites).await,
                    BrowseCommand::Favorite(n) => toggle_result(&pager, &mut favorites, n)?,
                    BrowseCommand::Invalid(message) => eprintln!("{message}"),
                    BrowseCommand::Query(text) => {
                        search.on_input(text.clone());
                        suggest.on_input(text);
                    }
                }
            }
            Ok(()) = search_rx.changed() => {
                let snapshot = search_rx.borrow_and_update().clone();
                render_search(&snapshot, &favorites);
            }
            Ok(()) = suggest_rx.changed() => {
                let snapshot = suggest_rx.borrow_and_update().clone();
                render_suggestions(&snapshot);
            }
        }
    }

    search.cancel_pending();
    suggest.cancel_pending();
    Ok(())
}

/// 1-based numbers of the favorites among `recipes`, numbered from `first_index`.
fn mark_favorites(recipes: &[Recipe], favorites: &Favorites<'_>, first_index: usize) -> String {
    recipes
        .iter()
        .enumerate()
        .filter(|(_, r)| favorites.contains(r.id))
        .map(|(i, _)| format!("#{}", first_index + i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_search(snapshot: &QuerySnapshot<SearchSession>, favorites: &Favorites<'_>) {
    if snapshot.loading {
        eprintln!("searching...");
        return;
    }
    if let Some(e) = &snapshot.error {
        eprintln!("{}", e.user_message());
        return;
    }
    let Some(session) = &snapshot.value else {
        return;
    };
    if session.results.is_empty() {
        println!("No recipes found for '{}'", session.query);
        return;
    }
    print_recipe_table(&session.results, 1);
    let marked = mark_favorites(&session.results, favorites, 1);
    if !marked.is_empty() {
        println!("★ favorites: {marked}");
    }
    if !session.exhausted {
        println!("Type :more for the next page");
    }
}

fn render_suggestions(snapshot: &QuerySnapshot<Vec<AutocompleteSuggestion>>) {
    if snapshot.loading || snapshot.error.is_some() {
        return;
    }
    if let Some(suggestions) = snapshot.value.as_ref().filter(|s| !s.is_empty()) {
        let titles: Vec<String> = suggestions.iter().map(|s| truncate(&s.title, 30)).collect();
        println!("Suggestions: {}", titles.join(" · "));
    }
}

async fn load_more(pager: &ResultPager, favorites: &Favorites<'_>) {
    if pager.session().query.is_empty() {
        println!("Type something to search first");
        return;
    }
    match pager.load_next_page().await {
        PageOutcome::Loaded {
            exhausted,
            start,
            appended,
            ..
        } => {
            if !appended.is_empty() {
                print_recipe_table(&appended, start + 1);
                let marked = mark_favorites(&appended, favorites, start + 1);
                if !marked.is_empty() {
                    println!("★ favorites: {marked}");
                }
            }
            if exhausted {
                println!("That's everything ({} results)", start + appended.len());
            }
        }
        PageOutcome::Exhausted => println!("No more results"),
        PageOutcome::InFlight => println!("Still loading, try again in a moment"),
        PageOutcome::Stale => {}
        PageOutcome::Failed(e) => eprintln!("{}", e.user_message()),
    }
}

fn toggle_result(pager: &ResultPager, favorites: &mut Favorites<'_>, n: usize) -> Result<()> {
    let session = pager.session();
    let Some(recipe) = session.results.get(n - 1) else {
        eprintln!("No result #{n} ({} shown)", session.results.len());
        return Ok(());
    };
    favorites.toggle(recipe)?;
    if favorites.contains(recipe.id) {
        println!("★ Added {} to favorites", recipe.title);
    } else {
        println!("Removed {} from favorites", recipe.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(":quit"), BrowseCommand::Quit);
        assert_eq!(parse_command("  :q  "), BrowseCommand::Quit);
        assert_eq!(parse_command(":more"), BrowseCommand::More);
        assert_eq!(parse_command(":fav 3"), BrowseCommand::Favorite(3));
        assert_eq!(
            parse_command("chicken curry"),
            BrowseCommand::Query("chicken curry".to_string())
        );
        assert_eq!(parse_command(""), BrowseCommand::Query(String::new()));
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(matches!(parse_command(":fav 0"), BrowseCommand::Invalid(_)));
        assert!(matches!(parse_command(":fav x"), BrowseCommand::Invalid(_)));
        assert!(matches!(parse_command(":fav"), BrowseCommand::Invalid(_)));
        assert!(matches!(parse_command(":dance"), BrowseCommand::Invalid(_)));
        assert!(matches!(parse_command(":more 2"), BrowseCommand::Invalid(_)));
    }

    fn recipe(id: i64) -> Recipe {
        serde_json::from_value(serde_json::json!({"id": id, "title": format!("r{id}")})).unwrap()
    }

    #[test]
    fn test_mark_favorites_numbers_from_first_index() {
        let store = Store::open_in_memory().unwrap();
        let mut favorites = Favorites::load(&store).unwrap();
        let results = vec![recipe(1), recipe(2), recipe(3)];
        favorites.toggle(&results[1]).unwrap();
        favorites.toggle(&results[2]).unwrap();
        assert_eq!(mark_favorites(&results, &favorites, 1), "#2 #3");
        // A later page keeps its session-wide numbering.
        assert_eq!(mark_favorites(&results[2..], &favorites, 3), "#3");
        assert_eq!(mark_favorites(&results, &favorites, 11), "#12 #13");
    }
}
