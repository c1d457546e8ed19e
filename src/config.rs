use crate::constants::*;
use crate::error::{Result, SniperError};
use crate::pipeline::retry::RetryPolicy;
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Immutable run configuration handed to the coordinator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogQuery,
    pub endpoints: Endpoints,
    pub retry: RetryConfig,
    pub pipeline: PipelineConfig,
    pub credentials: CredentialsConfig,
}

/// Catalog search filter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub category: u32,
    pub max_price: u64,
    pub limit: u32,
    pub include_not_for_sale: bool,
    pub creator_target_id: Option<u64>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY,
            max_price: DEFAULT_MAX_PRICE,
            limit: DEFAULT_PAGE_LIMIT,
            include_not_for_sale: false,
            creator_target_id: Some(DEFAULT_CREATOR_TARGET_ID),
        }
    }
}

impl CatalogQuery {
    /// Query string without the cursor, e.g. `Category=1&MaxPrice=0&...`
    pub fn query_string(&self) -> String {
        let mut qs = format!(
            "Category={}&MaxPrice={}&Limit={}&IncludeNotForSale={}",
            self.category, self.max_price, self.limit, self.include_not_for_sale
        );
        if let Some(creator) = self.creator_target_id {
            qs.push_str(&format!("&CreatorTargetId={}", creator));
        }
        qs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub catalog: String,
    pub economy: String,
    pub ownership: String,
    pub web: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalog: CATALOG_BASE_URL.to_string(),
            economy: ECONOMY_BASE_URL.to_string(),
            ownership: OWNERSHIP_BASE_URL.to_string(),
            web: WEB_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// All base URLs pointed at one host; used against mock servers
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            catalog: base.clone(),
            economy: base.clone(),
            ownership: base.clone(),
            web: base,
        }
    }

    /// The cursor is an opaque token and gets form-encoded
    pub fn catalog_search_url(&self, query: &CatalogQuery, cursor: Option<&str>) -> Result<String> {
        let raw = format!(
            "{}{}?{}",
            self.catalog.trim_end_matches('/'),
            CATALOG_SEARCH_PATH,
            query.query_string()
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| SniperError::Config(format!("Invalid catalog URL {}: {}", raw, e)))?;
        if let Some(cursor) = cursor {
            url.query_pairs_mut().append_pair("cursor", cursor);
        }
        Ok(url.to_string())
    }

    pub fn owned_bundles_url(&self, user_id: u64) -> String {
        format!(
            "{}/v1/users/{}/bundles?sortOrder=Asc&limit={}",
            self.catalog.trim_end_matches('/'),
            user_id,
            BUNDLE_PAGE_LIMIT
        )
    }

    pub fn has_asset_url(&self, user_id: u64, asset_id: u64) -> String {
        format!(
            "{}{}?userId={}&assetId={}",
            self.ownership.trim_end_matches('/'),
            HAS_ASSET_PATH,
            user_id,
            asset_id
        )
    }

    pub fn purchase_url(&self, product_id: u64) -> String {
        format!(
            "{}/v1/purchases/products/{}",
            self.economy.trim_end_matches('/'),
            product_id
        )
    }

    pub fn resellers_url(&self, asset_id: u64) -> String {
        format!(
            "{}/v1/assets/{}/resellers",
            self.economy.trim_end_matches('/'),
            asset_id
        )
    }

    pub fn profile_url(&self) -> String {
        format!("{}{}", self.web.trim_end_matches('/'), PROFILE_PATH)
    }
}

/// Retry windows in seconds; caps are unset (unbounded) unless configured
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub page_delay_secs: f64,
    pub page_max_attempts: Option<u32>,
    pub purchase_delay_secs: f64,
    pub purchase_max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            page_delay_secs: PAGE_RETRY_DELAY_SECS as f64,
            page_max_attempts: None,
            purchase_delay_secs: PURCHASE_RETRY_DELAY_SECS as f64,
            purchase_max_attempts: None,
        }
    }
}

impl RetryConfig {
    pub fn page_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs_f64(self.page_delay_secs.max(0.0)),
            self.page_max_attempts,
        )
    }

    pub fn purchase_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs_f64(self.purchase_delay_secs.max(0.0)),
            self.purchase_max_attempts,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on page workers running at once. None keeps fan-out unbounded.
    pub max_concurrent_pages: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CREDENTIALS_PATH.to_string(),
        }
    }
}

impl Config {
    /// Load `config.toml`-style settings. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            SniperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.limit == 0 {
            return Err(SniperError::Config("catalog.limit must be positive".into()));
        }
        if self.pipeline.max_concurrent_pages == Some(0) {
            return Err(SniperError::Config(
                "pipeline.max_concurrent_pages must be positive when set".into(),
            ));
        }
        for (name, base) in [
            ("endpoints.catalog", &self.endpoints.catalog),
            ("endpoints.economy", &self.endpoints.economy),
            ("endpoints.ownership", &self.endpoints.ownership),
            ("endpoints.web", &self.endpoints.web),
        ] {
            if let Err(e) = Url::parse(base) {
                return Err(SniperError::Config(format!("{} is not a valid URL: {}", name, e)));
            }
        }
        for (name, secs) in [
            ("retry.page_delay_secs", self.retry.page_delay_secs),
            ("retry.purchase_delay_secs", self.retry.purchase_delay_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(SniperError::Config(format!("{} must be a non-negative number", name)));
            }
        }
        Ok(())
    }
}

/// Load the session cookie. The `ROBLOXCOOKIE` environment variable wins over
/// the JSON credentials file (`{"ROBLOXCOOKIE": "..."}`).
pub fn load_credential(path: &Path) -> Result<String> {
    if let Ok(value) = std::env::var(CREDENTIAL_KEY) {
        if !value.trim().is_empty() {
            debug!("Using credential from environment");
            return Ok(value.trim().to_string());
        }
    }
    read_credential_file(path)
}

pub fn read_credential_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        SniperError::Config(format!("Could not read credentials file '{}': {}", path.display(), e))
    })?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let cookie = value[CREDENTIAL_KEY]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SniperError::MissingField(format!("{} in {}", CREDENTIAL_KEY, path.display())))?;
    Ok(cookie.to_string())
}
