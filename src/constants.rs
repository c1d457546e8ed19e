// Endpoint and timing constants shared across the pipeline.
// Base URLs can be overridden through `[endpoints]` in config.toml.

pub const CATALOG_BASE_URL: &str = "https://catalog.roblox.com";
pub const ECONOMY_BASE_URL: &str = "https://economy.roblox.com";
pub const OWNERSHIP_BASE_URL: &str = "https://api.roblox.com";
pub const WEB_BASE_URL: &str = "https://www.roblox.com";

pub const CATALOG_SEARCH_PATH: &str = "/v1/search/items/details";
pub const PROFILE_PATH: &str = "/my/profile";
pub const HAS_ASSET_PATH: &str = "/ownership/hasasset";

/// Name of the session cookie carrying the credential
pub const AUTH_COOKIE_NAME: &str = ".ROBLOSECURITY";
/// Key of the credential inside the JSON credentials file, also used as env var name
pub const CREDENTIAL_KEY: &str = "ROBLOXCOOKIE";
pub const CSRF_HEADER: &str = "x-csrf-token";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

// Fixed retry windows of the remote rate limiter
pub const PAGE_RETRY_DELAY_SECS: u64 = 40;
pub const PURCHASE_RETRY_DELAY_SECS: u64 = 60;

pub const DEFAULT_CATEGORY: u32 = 1;
pub const DEFAULT_MAX_PRICE: u64 = 0;
pub const DEFAULT_PAGE_LIMIT: u32 = 30;
pub const DEFAULT_CREATOR_TARGET_ID: u64 = 1;
pub const BUNDLE_PAGE_LIMIT: u32 = 100;

/// Robux currency code expected by the purchase endpoint
pub const EXPECTED_CURRENCY: u32 = 1;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_CREDENTIALS_PATH: &str = "config.json";
