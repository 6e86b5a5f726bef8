//! Runtime configuration from environment (and `.env` via dotenvy)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_DB_PATH: &str = "gymfuel.db";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// App id / key pair used by Nutritionix and Edamam
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_key: String,
}

/// Endpoints and credentials of the nutrition APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub open_food_facts_url: String,
    pub upcitemdb_url: String,
    pub usda_url: String,
    /// USDA accepts the rate-limited `DEMO_KEY` when no key is set
    pub usda_api_key: String,
    pub nutritionix_url: String,
    pub nutritionix: Option<AppCredentials>,
    pub edamam_url: String,
    pub edamam: Option<AppCredentials>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            open_food_facts_url: "https://world.openfoodfacts.org".to_string(),
            upcitemdb_url: "https://api.upcitemdb.com".to_string(),
            usda_url: "https://api.nal.usda.gov/fdc/v1".to_string(),
            usda_api_key: "DEMO_KEY".to_string(),
            nutritionix_url: "https://trackapi.nutritionix.com".to_string(),
            nutritionix: None,
            edamam_url: "https://api.edamam.com".to_string(),
            edamam: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub http_timeout: Duration,
    /// Curated food database (JSON), consulted before any API
    pub foods_path: Option<PathBuf>,
    pub providers: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            foods_path: None,
            providers: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Read configuration from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read configuration through a variable getter (empty values count as unset)
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| get(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(path) = var("GYMFUEL_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(secs) = var("GYMFUEL_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("GYMFUEL_HTTP_TIMEOUT_SECS is not a number: {secs}"))?;
            config.http_timeout = Duration::from_secs(secs);
        }
        config.foods_path = var("GYMFUEL_FOODS").map(PathBuf::from);

        let providers = &mut config.providers;
        if let Some(url) = var("OPEN_FOOD_FACTS_URL") {
            providers.open_food_facts_url = url;
        }
        if let Some(url) = var("UPCITEMDB_URL") {
            providers.upcitemdb_url = url;
        }
        if let Some(url) = var("USDA_URL") {
            providers.usda_url = url;
        }
        if let Some(key) = var("USDA_API_KEY") {
            providers.usda_api_key = key;
        }
        if let Some(url) = var("NUTRITIONIX_URL") {
            providers.nutritionix_url = url;
        }
        providers.nutritionix = credentials(&var, "NUTRITIONIX_APP_ID", "NUTRITIONIX_APP_KEY");
        if let Some(url) = var("EDAMAM_URL") {
            providers.edamam_url = url;
        }
        providers.edamam = credentials(&var, "EDAMAM_APP_ID", "EDAMAM_APP_KEY");

        Ok(config)
    }
}

fn credentials(
    var: &impl Fn(&str) -> Option<String>,
    id_name: &str,
    key_name: &str,
) -> Option<AppCredentials> {
    Some(AppCredentials {
        app_id: var(id_name)?,
        app_key: var(key_name)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.providers.usda_api_key, "DEMO_KEY");
        assert!(config.providers.nutritionix.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GYMFUEL_DB", "/tmp/fit.db"),
            ("GYMFUEL_HTTP_TIMEOUT_SECS", "3"),
            ("USDA_API_KEY", "abc"),
            ("EDAMAM_APP_ID", "id"),
            ("EDAMAM_APP_KEY", "key"),
            ("NUTRITIONIX_APP_ID", "only-id"),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/fit.db"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.providers.usda_api_key, "abc");
        assert_eq!(
            config.providers.edamam,
            Some(AppCredentials { app_id: "id".into(), app_key: "key".into() })
        );
        // half-configured credentials are ignored
        assert!(config.providers.nutritionix.is_none());
    }

    #[test]
    fn test_empty_values_ignored() {
        let config = config_from(&[("GYMFUEL_DB", "  ")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_bad_timeout() {
        assert!(config_from(&[("GYMFUEL_HTTP_TIMEOUT_SECS", "soon")]).is_err());
    }
}
