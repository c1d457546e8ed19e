use crate::error::SniperError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One item of the catalog feed, captured at listing time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "id")]
    pub asset_id: u64,
    #[serde(rename = "productId")]
    pub product_id: u64,
    #[serde(rename = "creatorTargetId")]
    pub expected_seller_id: u64,
    /// Absent for off-sale listings
    #[serde(rename = "price", default)]
    pub expected_price: Option<u64>,
}

impl CatalogItem {
    pub fn is_for_sale(&self) -> bool {
        self.expected_price.is_some()
    }
}

/// A single page of the catalog feed. `cursor == None` marks the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub cursor: Option<String>,
    pub items: Vec<CatalogItem>,
}

impl CatalogPage {
    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Values submitted to the purchase endpoint. Price and seller are the ones
/// captured from the listing; the remote side rejects stale combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub asset_id: u64,
    pub product_id: u64,
    pub expected_price: u64,
    pub expected_seller_id: u64,
}

impl TryFrom<&CatalogItem> for PurchaseRequest {
    type Error = SniperError;

    fn try_from(item: &CatalogItem) -> Result<Self, Self::Error> {
        let expected_price = item
            .expected_price
            .ok_or_else(|| SniperError::MissingField(format!("price of asset {}", item.asset_id)))?;
        Ok(Self {
            asset_id: item.asset_id,
            product_id: item.product_id,
            expected_price,
            expected_seller_id: item.expected_seller_id,
        })
    }
}

/// Result of one purchase submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased,
    /// Carries the server's Retry-After hint when one was sent
    RateLimited(Option<Duration>),
    Failed(String),
}

/// Returned once an item has been bought
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub asset_id: u64,
    pub product_id: u64,
    pub attempts: u32,
}

/// Answer of the per-asset ownership endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipProbe {
    Owned,
    NotOwned,
    ProbeError(String),
}

/// What happened to one catalog item during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Purchased { attempts: u32 },
    AlreadyOwnedBundle,
    AlreadyOwnedAsset,
    /// Listed without a price; never probed or bought
    NotForSale,
    /// `submissions` counts purchase requests sent before giving up
    Failed { reason: String, submissions: u32 },
}

impl ItemOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Purchased { .. } => "purchased",
            ItemOutcome::AlreadyOwnedBundle => "owned_bundle",
            ItemOutcome::AlreadyOwnedAsset => "owned_asset",
            ItemOutcome::NotForSale => "not_for_sale",
            ItemOutcome::Failed { .. } => "failed",
        }
    }
}

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "UserId")]
    pub id: u64,
    #[serde(rename = "Username")]
    pub name: String,
}

/// Cheapest resale offer of a limited asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResellerListing {
    pub user_asset_id: u64,
    pub price: u64,
    pub seller_id: u64,
}

/// Counters for a finished page worker or a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub items_seen: usize,
    pub purchased: usize,
    pub already_owned: usize,
    pub not_for_sale: usize,
    pub failed: usize,
    pub purchase_submissions: u64,
    pub worker_panics: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.items_seen += 1;
        match outcome {
            ItemOutcome::Purchased { attempts } => {
                self.purchased += 1;
                self.purchase_submissions += u64::from(*attempts);
            }
            ItemOutcome::AlreadyOwnedBundle | ItemOutcome::AlreadyOwnedAsset => {
                self.already_owned += 1
            }
            ItemOutcome::NotForSale => self.not_for_sale += 1,
            ItemOutcome::Failed { submissions, .. } => {
                self.failed += 1;
                self.purchase_submissions += u64::from(*submissions);
            }
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.pages_fetched += other.pages_fetched;
        self.items_seen += other.items_seen;
        self.purchased += other.purchased;
        self.already_owned += other.already_owned;
        self.not_for_sale += other.not_for_sale;
        self.failed += other.failed;
        self.purchase_submissions += other.purchase_submissions;
        self.worker_panics += other.worker_panics;
    }
}
