use anyhow::Result;

use crate::models::Recipe;
use crate::store::{KEY_FAVORITES, Store};

/// The user's saved recipes, kept as full snapshots in insertion order.
///
/// Every mutation writes the whole list to the store first and only then
/// updates the in-memory copy, so a failed write changes nothing.
pub struct Favorites<'a> {
    store: &'a Store,
    recipes: Vec<Recipe>,
}

impl<'a> Favorites<'a> {
    pub fn load(store: &'a Store) -> Result<Self> {
        let recipes: Vec<Recipe> = store.get_or_default(KEY_FAVORITES)?;
        Ok(Self { store, recipes })
    }

    #[must_use]
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.recipes.iter().any(|r| r.id == id)
    }

    /// A window of the list for incremental display.
    #[must_use]
    pub fn page(&self, offset: usize, limit: usize) -> &[Recipe] {
        let start = offset.min(self.recipes.len());
        let end = start.saturating_add(limit).min(self.recipes.len());
        &self.recipes[start..end]
    }

    /// Add `recipe` if no favorite has its id, otherwise remove that favorite.
    pub fn toggle(&mut self, recipe: &Recipe) -> Result<&[Recipe]> {
        let mut recipes = self.recipes.clone();
        if let Some(pos) = recipes.iter().position(|r| r.id == recipe.id) {
            recipes.remove(pos);
            tracing::debug!(id = recipe.id, "removing favorite");
        } else {
            recipes.push(recipe.clone());
            tracing::debug!(id = recipe.id, "adding favorite");
        }
        self.commit(recipes)?;
        Ok(&self.recipes)
    }

    /// Remove by id. Returns false when the id was not a favorite.
    pub fn remove(&mut self, id: i64) -> Result<bool> {
        if !self.contains(id) {
            return Ok(false);
        }
        let recipes = self.recipes.iter().filter(|r| r.id != id).cloned().collect();
        self.commit(recipes)?;
        Ok(true)
    }

    fn commit(&mut self, recipes: Vec<Recipe>) -> Result<()> {
        self.store.set(KEY_FAVORITES, &recipes)?;
        self.recipes = recipes;
        Ok(())
    }
}
