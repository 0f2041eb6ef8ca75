use anyhow::Result;

use crate::models::{SearchFilters, UserPreferences};
use crate::store::{KEY_DARK_MODE, KEY_USER_PREFERENCES, Store};

pub fn dark_mode(store: &Store) -> Result<bool> {
    store.get(KEY_DARK_MODE, false)
}

pub fn set_dark_mode(store: &Store, enabled: bool) -> Result<bool> {
    store.set(KEY_DARK_MODE, &enabled)?;
    Ok(enabled)
}

pub fn toggle_dark_mode(store: &Store) -> Result<bool> {
    let next = !dark_mode(store)?;
    set_dark_mode(store, next)
}

pub fn preferences(store: &Store) -> Result<UserPreferences> {
    store.get_or_default(KEY_USER_PREFERENCES)
}

/// Shallow-merge `patch` into the stored preferences and return the result.
/// A `null` value in the patch deletes that key.
pub fn update_preferences(store: &Store, patch: UserPreferences) -> Result<UserPreferences> {
    let mut prefs = preferences(store)?;
    for (key, value) in patch {
        if value.is_null() {
            prefs.remove(&key);
        } else {
            prefs.insert(key, value);
        }
    }
    store.set(KEY_USER_PREFERENCES, &prefs)?;
    Ok(prefs)
}

/// Search filters taken from the `diet` and `cuisine` preferences, used when
/// a search gives none of its own. Non-string values are ignored.
pub fn default_filters(store: &Store) -> Result<SearchFilters> {
    let prefs = preferences(store)?;
    let text = |key: &str| {
        prefs
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };
    Ok(SearchFilters::new(text("diet"), text("cuisine")))
}
