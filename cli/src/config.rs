use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use ladle_core::gateway::{DEFAULT_BASE_URL, GatewayConfig};

pub const API_KEY_ENV: &str = "LADLE_API_KEY";
pub const API_BASE_ENV: &str = "LADLE_API_BASE";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "ladle").context("Could not determine home directory")?;
        Self::in_dir(proj_dirs.data_dir())
    }

    /// Use `data_dir` for all local state, creating it if needed.
    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("ladle.db");

        Ok(Config {
            db_path,
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn api_key_path(&self) -> PathBuf {
        self.data_dir.join("api_key")
    }

    /// The key saved by `ladle key set`, if any.
    pub fn stored_api_key(&self) -> Result<Option<String>> {
        let path = self.api_key_path();
        if !path.exists() {
            return Ok(None);
        }
        let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
        let key = key.trim();
        Ok((!key.is_empty()).then(|| key.to_string()))
    }

    pub fn save_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            bail!("API key cannot be empty");
        }
        let path = self.api_key_path();
        std::fs::write(&path, key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        Ok(())
    }

    /// Environment first, then the stored key.
    pub fn api_key(&self) -> Result<Option<String>> {
        match env_api_key() {
            Some(key) => Ok(Some(key)),
            None => self.stored_api_key(),
        }
    }

    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let Some(api_key) = self.api_key()? else {
            bail!("No API key configured. Run `ladle key set <KEY>` or set {API_KEY_ENV}");
        };
        let base_url = base_url_from(std::env::var(API_BASE_ENV).ok());
        tracing::debug!(%base_url, "using recipe API");
        Ok(GatewayConfig::new(base_url, api_key))
    }
}

pub fn env_api_key() -> Option<String> {
    non_blank(std::env::var(API_KEY_ENV).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn base_url_from(env_value: Option<String>) -> String {
    non_blank(env_value).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Show only the last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("ladle");
        let config = Config::in_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.db_path, dir.join("ladle.db"));
    }

    #[test]
    fn test_api_key_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::in_dir(tmp.path()).unwrap();
        assert_eq!(config.stored_api_key().unwrap(), None);

        config.save_api_key("  abc123\n").unwrap();
        assert_eq!(config.stored_api_key().unwrap().as_deref(), Some("abc123"));
    }

    #[cfg(unix)]
    #[test]
    fn test_api_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::in_dir(tmp.path()).unwrap();
        config.save_api_key("abc123").unwrap();
        let mode = std::fs::metadata(tmp.path().join("api_key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_blank_key_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::in_dir(tmp.path()).unwrap();
        assert!(config.save_api_key("   ").is_err());
    }

    #[test]
    fn test_base_url_override() {
        assert_eq!(base_url_from(None), DEFAULT_BASE_URL);
        assert_eq!(base_url_from(Some("  ".to_string())), DEFAULT_BASE_URL);
        assert_eq!(
            base_url_from(Some("http://localhost:9000".to_string())),
            "http://localhost:9000"
        );
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdef123456"), "********3456");
        assert_eq!(mask_key("abc"), "***");
    }
}
