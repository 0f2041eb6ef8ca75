use anyhow::Result;
use std::process;

use ladle_core::favorites::Favorites;
use ladle_core::gateway::RecipeGateway;
use ladle_core::service::toggle_favorite_by_id;
use ladle_core::store::Store;

use super::helpers::{not_found, print_recipe_table};

pub(crate) fn cmd_fav_list(store: &Store, offset: usize, limit: usize, json: bool) -> Result<()> {
    let favorites = Favorites::load(store)?;
    let page = favorites.page(offset, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    if page.is_empty() {
        if favorites.is_empty() {
            eprintln!("No favorites yet. Add one with `ladle fav toggle <id>`");
        } else {
            eprintln!("No favorites past #{offset} ({} saved)", favorites.len());
        }
        process::exit(2);
    }

    print_recipe_table(page, offset + 1);
    let remaining = favorites.len().saturating_sub(offset + page.len());
    if remaining > 0 {
        let next = offset + page.len();
        println!("{remaining} more. Use --offset {next} to see them.");
    }
    Ok(())
}

pub(crate) async fn cmd_fav_toggle(
    store: &Store,
    gateway: &dyn RecipeGateway,
    id: i64,
    json: bool,
) -> Result<()> {
    let mut favorites = Favorites::load(store)?;
    let added = toggle_favorite_by_id(gateway, &mut favorites, id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "favorite": added, "count": favorites.len() })
        );
    } else if added {
        let title = favorites
            .list()
            .iter()
            .find(|r| r.id == id)
            .map_or("recipe", |r| r.title.as_str());
        println!("Added {title} ({id}) to favorites");
    } else {
        println!("Removed {id} from favorites");
    }
    Ok(())
}

pub(crate) fn cmd_fav_remove(store: &Store, id: i64, json: bool) -> Result<()> {
    let mut favorites = Favorites::load(store)?;
    if !favorites.remove(id)? {
        not_found(&format!("Recipe {id} is not a favorite"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "removed": id }));
    } else {
        println!("Removed {id} from favorites");
    }
    Ok(())
}
