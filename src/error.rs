use thiserror::Error;

#[derive(Error, Debug)]
pub enum SniperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Unexpected status {status} from {url}")]
    BadStatus { status: u16, url: String },

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Gave up on {operation} after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    #[error("Purchase of asset {asset_id} failed after {attempts} submissions: {reason}")]
    PurchaseFailed {
        asset_id: u64,
        attempts: u32,
        reason: String,
    },

    #[error("Ownership probe failed for asset {asset_id}: {reason}")]
    Probe { asset_id: u64, reason: String },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl SniperError {
    /// Purchase requests already sent when a purchase gave up
    pub fn purchase_submissions(&self) -> u32 {
        match self {
            SniperError::PurchaseFailed { attempts, .. } | SniperError::RetriesExhausted { attempts, .. } => {
                *attempts
            }
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, SniperError>;
