use anyhow::Result;

use crate::config::{API_KEY_ENV, Config, env_api_key, mask_key};

use super::helpers::not_found;

pub(crate) fn cmd_key_set(config: &Config, key: &str, json: bool) -> Result<()> {
    config.save_api_key(key)?;

    if json {
        println!("{}", serde_json::json!({ "saved": true }));
    } else {
        println!("Saved API key {}", mask_key(key.trim()));
        if env_api_key().is_some() {
            eprintln!("Note: {API_KEY_ENV} is set and takes precedence over the saved key");
        }
    }
    Ok(())
}

pub(crate) fn cmd_key_show(config: &Config, json: bool) -> Result<()> {
    let Some(key) = config.api_key()? else {
        not_found(
            &format!("No API key configured. Run `ladle key set <KEY>` or set {API_KEY_ENV}"),
            json,
        );
    };
    let source = if env_api_key().is_some() {
        "environment"
    } else {
        "file"
    };

    if json {
        println!(
            "{}",
            serde_json::json!({ "key": mask_key(&key), "source": source })
        );
    } else {
        println!("{} (from {source})", mask_key(&key));
    }
    Ok(())
}
