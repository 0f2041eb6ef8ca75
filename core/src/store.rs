use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const KEY_FAVORITES: &str = "favorites";
pub const KEY_DARK_MODE: &str = "darkMode";
pub const KEY_USER_PREFERENCES: &str = "userPreferences";
pub const KEY_MEAL_PLAN: &str = "mealPlan";
pub const KEY_MEAL_PLANNER_START_DATE: &str = "mealPlannerStartDate";

/// Device-local key/value store. Values are JSON text, one row per key.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Read `key`, falling back to `default` when it is unset or unparsable.
    ///
    /// A corrupt value is logged and treated as absent so one bad write cannot
    /// break every later load.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(default);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unparsable stored value");
                Ok(default)
            }
        }
    }

    /// Like [`Store::get`] with `T::default()` as the fallback.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        self.get(key, T::default())
    }

    /// Serialize `value` and overwrite whatever is stored under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize value for '{key}'"))?;
        self.set_raw(key, &raw)
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read '{key}' from store"))?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, raw: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO user_settings (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, raw, now],
            )
            .with_context(|| format!("Failed to write '{key}' to store"))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// Make every later write fail.
    #[cfg(test)]
    pub(crate) fn reject_writes(&self) {
        self.conn.execute_batch("PRAGMA query_only = ON").unwrap();
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM user_settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPlan, MealPlan, MealSlot, PlannedMeal, Recipe, UserPreferences};
    use chrono::NaiveDate;

    fn recipe(id: i64, title: &str) -> Recipe {
        serde_json::from_value(serde_json::json!({"id": id, "title": title})).unwrap()
    }

    #[test]
    fn test_get_unset_returns_default() {
        let store = Store::open_in_memory().unwrap();
        let favs: Vec<Recipe> = store.get_or_default(KEY_FAVORITES).unwrap();
        assert!(favs.is_empty());
        assert!(!store.get(KEY_DARK_MODE, false).unwrap());
        assert!(store.get(KEY_DARK_MODE, true).unwrap());
    }

    #[test]
    fn test_favorites_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let favs = vec![recipe(42, "Shakshuka"), recipe(7, "Ramen")];
        store.set(KEY_FAVORITES, &favs).unwrap();
        let loaded: Vec<Recipe> = store.get_or_default(KEY_FAVORITES).unwrap();
        assert_eq!(loaded, favs);
    }

    #[test]
    fn test_meal_plan_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let mut plan = MealPlan::new();
        plan.insert(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            DayPlan {
                meals: vec![PlannedMeal {
                    recipe_id: 7,
                    title: "Ramen".to_string(),
                    image_type: Some("jpg".to_string()),
                    slot: MealSlot::Lunch,
                }],
            },
        );
        store.set(KEY_MEAL_PLAN, &plan).unwrap();
        let loaded: MealPlan = store.get_or_default(KEY_MEAL_PLAN).unwrap();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_preferences_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let mut prefs = UserPreferences::new();
        prefs.insert("units".to_string(), serde_json::json!("metric"));
        prefs.insert("pageSize".to_string(), serde_json::json!(12));
        store.set(KEY_USER_PREFERENCES, &prefs).unwrap();
        let loaded: UserPreferences = store.get_or_default(KEY_USER_PREFERENCES).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_set_overwrites_fully() {
        let store = Store::open_in_memory().unwrap();
        store.set(KEY_FAVORITES, &vec![recipe(1, "A"), recipe(2, "B")]).unwrap();
        store.set(KEY_FAVORITES, &vec![recipe(3, "C")]).unwrap();
        let loaded: Vec<Recipe> = store.get_or_default(KEY_FAVORITES).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 3);
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        let store = Store::open_in_memory().unwrap();
        store.set_raw(KEY_FAVORITES, "[{not json").unwrap();
        let favs: Vec<Recipe> = store.get_or_default(KEY_FAVORITES).unwrap();
        assert!(favs.is_empty());

        // Wrong shape is treated the same as unparsable text
        store.set_raw(KEY_DARK_MODE, "\"yes please\"").unwrap();
        assert!(!store.get(KEY_DARK_MODE, false).unwrap());
    }

    #[test]
    fn test_dark_mode_stored_as_text() {
        let store = Store::open_in_memory().unwrap();
        store.set(KEY_DARK_MODE, &true).unwrap();
        assert_eq!(store.get_raw(KEY_DARK_MODE).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_remove_and_keys() {
        let store = Store::open_in_memory().unwrap();
        store.set(KEY_DARK_MODE, &true).unwrap();
        store.set(KEY_FAVORITES, &Vec::<Recipe>::new()).unwrap();
        assert_eq!(store.keys().unwrap(), vec![KEY_DARK_MODE, KEY_FAVORITES]);

        assert!(store.remove(KEY_DARK_MODE).unwrap());
        assert!(!store.remove(KEY_DARK_MODE).unwrap());
        assert_eq!(store.keys().unwrap(), vec![KEY_FAVORITES]);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ladle.db");
        {
            let store = Store::open(&path).unwrap();
            store.set(KEY_FAVORITES, &vec![recipe(42, "Shakshuka")]).unwrap();
        }
        let store = Store::open(&path).unwrap();
        let favs: Vec<Recipe> = store.get_or_default(KEY_FAVORITES).unwrap();
        assert_eq!(favs[0].id, 42);
    }
}
