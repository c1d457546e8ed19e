use crate::app::ports::{HttpResponse, SessionPort};
use crate::config::Endpoints;
use crate::error::{Result, SniperError};
use crate::metrics::OwnershipMetrics;
use crate::types::{CatalogItem, OwnershipProbe};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct BundleListResponse {
    data: Vec<BundleEntry>,
}

#[derive(Debug, Deserialize)]
struct BundleEntry {
    id: u64,
}

/// Ownership verdict for one catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Found in the bundle set loaded at run start; no probe was sent
    Bundle,
    /// The per-asset probe said owned
    Asset,
    NotOwned,
}

impl Ownership {
    pub fn is_owned(self) -> bool {
        !matches!(self, Ownership::NotOwned)
    }
}

/// Load the ids of every bundle `user_id` owns. Errors on a non-success status.
#[instrument(skip(session, endpoints))]
pub async fn fetch_owned_bundle_ids(
    session: &dyn SessionPort,
    endpoints: &Endpoints,
    user_id: u64,
) -> Result<HashSet<u64>> {
    let url = endpoints.owned_bundles_url(user_id);
    let response = session.get(&url).await?;
    if !response.is_success() {
        return Err(SniperError::BadStatus {
            status: response.status,
            url,
        });
    }
    let list: BundleListResponse = response.json()?;
    Ok(list.data.into_iter().map(|b| b.id).collect())
}

/// JSON truthiness as the ownership endpoint uses it: `true`, non-zero
/// numbers and non-empty strings/arrays/objects count as owned.
pub fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Interpret an ownership probe response. A body that is not JSON is the
/// endpoint's way of saying "not owned".
pub fn interpret_probe(response: &HttpResponse) -> OwnershipProbe {
    if !response.is_json() {
        return OwnershipProbe::NotOwned;
    }
    match serde_json::from_slice::<Value>(&response.bytes) {
        Ok(value) if !response.is_success() => OwnershipProbe::ProbeError(format!(
            "status {} with body {}",
            response.status, value
        )),
        Ok(value) if json_truthy(&value) => OwnershipProbe::Owned,
        Ok(_) => OwnershipProbe::NotOwned,
        Err(_) => OwnershipProbe::NotOwned,
    }
}

/// Decides whether the authenticated user already owns a catalog item.
///
/// The bundle set is a snapshot taken once per run. Per-asset answers are
/// never cached, each item is probed live.
pub struct OwnershipFilter {
    session: Arc<dyn SessionPort>,
    endpoints: Endpoints,
    user_id: u64,
    bundle_ids: HashSet<u64>,
}

impl OwnershipFilter {
    pub fn new(
        session: Arc<dyn SessionPort>,
        endpoints: Endpoints,
        user_id: u64,
        bundle_ids: HashSet<u64>,
    ) -> Self {
        Self {
            session,
            endpoints,
            user_id,
            bundle_ids,
        }
    }

    /// Build the filter, loading the bundle set. A failed load degrades to an
    /// empty set instead of aborting the run.
    pub async fn load(session: Arc<dyn SessionPort>, endpoints: Endpoints, user_id: u64) -> Self {
        let bundle_ids = match fetch_owned_bundle_ids(&*session, &endpoints, user_id).await {
            Ok(ids) => {
                info!("User {} owns {} bundles", user_id, ids.len());
                OwnershipMetrics::record_bundles_loaded(ids.len());
                ids
            }
            Err(e) => {
                warn!("Bundles could not be retrieved, assuming none are owned: {}", e);
                println!("⚠️  Bundles could not be retrieved: {}", e);
                OwnershipMetrics::record_bundle_load_failed();
                HashSet::new()
            }
        };
        Self::new(session, endpoints, user_id, bundle_ids)
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn bundle_count(&self) -> usize {
        self.bundle_ids.len()
    }

    /// Ask the remote side whether the user owns `asset_id` right now
    pub async fn probe(&self, asset_id: u64) -> OwnershipProbe {
        let url = self.endpoints.has_asset_url(self.user_id, asset_id);
        let probe = match self.session.get(&url).await {
            Ok(response) => interpret_probe(&response),
            Err(e) => OwnershipProbe::ProbeError(e.to_string()),
        };
        OwnershipMetrics::record_probe(match probe {
            OwnershipProbe::Owned => "owned",
            OwnershipProbe::NotOwned => "not_owned",
            OwnershipProbe::ProbeError(_) => "error",
        });
        probe
    }

    /// Bundle lookup first, per-asset probe only when that misses
    #[instrument(skip(self, item), fields(asset_id = item.asset_id))]
    pub async fn check(&self, item: &CatalogItem) -> Result<Ownership> {
        if self.bundle_ids.contains(&item.asset_id) {
            OwnershipMetrics::record_bundle_hit();
            return Ok(Ownership::Bundle);
        }
        match self.probe(item.asset_id).await {
            OwnershipProbe::Owned => Ok(Ownership::Asset),
            OwnershipProbe::NotOwned => {
                debug!("Asset {} not owned", item.asset_id);
                Ok(Ownership::NotOwned)
            }
            OwnershipProbe::ProbeError(reason) => Err(SniperError::Probe {
                asset_id: item.asset_id,
                reason,
            }),
        }
    }

    pub async fn is_owned(&self, item: &CatalogItem) -> Result<bool> {
        Ok(self.check(item).await?.is_owned())
    }
}
