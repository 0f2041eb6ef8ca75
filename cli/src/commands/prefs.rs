use anyhow::{Context, Result};
use clap::ValueEnum;

use ladle_core::models::UserPreferences;
use ladle_core::prefs;
use ladle_core::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DarkModeArg {
    On,
    Off,
    Toggle,
}

pub(crate) fn cmd_prefs_show(store: &Store, json: bool) -> Result<()> {
    let dark_mode = prefs::dark_mode(store)?;
    let preferences = prefs::preferences(store)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "darkMode": dark_mode,
                "userPreferences": preferences,
            }))?
        );
        return Ok(());
    }

    println!("dark mode: {}", if dark_mode { "on" } else { "off" });
    if preferences.is_empty() {
        println!("no other preferences set");
    }
    for (key, value) in &preferences {
        println!("{key}: {value}");
    }
    Ok(())
}

/// Parse a preference value. Bare words that are not JSON are taken as strings.
pub(crate) fn parse_pref_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

pub(crate) fn cmd_prefs_set(store: &Store, key: &str, raw: &str, json: bool) -> Result<()> {
    let key = key.trim();
    anyhow::ensure!(!key.is_empty(), "Preference key cannot be empty");

    let mut patch = UserPreferences::new();
    patch.insert(key.to_string(), parse_pref_value(raw));
    let merged = prefs::update_preferences(store, patch)
        .with_context(|| format!("Failed to save preference '{key}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else if let Some(value) = merged.get(key) {
        println!("{key} = {value}");
    } else {
        println!("Cleared {key}");
    }
    Ok(())
}

pub(crate) fn cmd_dark_mode(store: &Store, mode: Option<DarkModeArg>, json: bool) -> Result<()> {
    let enabled = match mode {
        None => prefs::dark_mode(store)?,
        Some(DarkModeArg::On) => prefs::set_dark_mode(store, true)?,
        Some(DarkModeArg::Off) => prefs::set_dark_mode(store, false)?,
        Some(DarkModeArg::Toggle) => prefs::toggle_dark_mode(store)?,
    };

    if json {
        println!("{}", serde_json::json!({ "darkMode": enabled }));
    } else {
        println!("dark mode: {}", if enabled { "on" } else { "off" });
    }
    Ok(())
}
