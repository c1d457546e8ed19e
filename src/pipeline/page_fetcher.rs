use crate::app::ports::SessionPort;
use crate::config::{CatalogQuery, Endpoints};
use crate::error::{Result, SniperError};
use crate::metrics::CatalogMetrics;
use crate::pipeline::retry::RetryPolicy;
use crate::types::{CatalogItem, CatalogPage};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct CatalogSearchResponse {
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
    data: Vec<CatalogItem>,
}

/// Parse one catalog search body. Missing, null and empty cursors all mark
/// the last page.
pub fn parse_catalog_page(bytes: &[u8]) -> Result<CatalogPage> {
    let raw: CatalogSearchResponse = serde_json::from_slice(bytes)?;
    Ok(CatalogPage {
        cursor: raw.next_page_cursor.filter(|c| !c.is_empty()),
        items: raw.data,
    })
}

/// Fetches catalog pages, waiting out non-success answers
pub struct PageFetcher {
    session: Arc<dyn SessionPort>,
    endpoints: Endpoints,
    query: CatalogQuery,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(
        session: Arc<dyn SessionPort>,
        endpoints: Endpoints,
        query: CatalogQuery,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            session,
            endpoints,
            query,
            retry,
        }
    }

    /// Fetch the page for `cursor` (None for the first page).
    ///
    /// Any non-success status is treated as the remote rate limiter: the same
    /// request is re-issued after the fixed retry delay, forever unless the
    /// policy has a cap. Transport errors and malformed bodies are returned.
    #[instrument(skip(self, cursor), fields(cursor = cursor.unwrap_or("<first>")))]
    pub async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage> {
        let url = self.endpoints.catalog_search_url(&self.query, cursor)?;
        let started = Instant::now();
        let mut attempts = 0u32;

        let response = loop {
            let response = self.session.get(&url).await?;
            attempts += 1;
            if response.is_success() {
                break response;
            }

            CatalogMetrics::record_page_retry(response.status);
            if self.retry.is_exhausted(attempts) {
                return Err(SniperError::RetriesExhausted {
                    operation: "catalog page fetch".to_string(),
                    attempts,
                });
            }
            warn!(
                status = response.status,
                attempts,
                "Possibly rate limited, retrying page in {:?}",
                self.retry.delay
            );
            println!(
                "⏳ Possibly rate limited, status: {}... Retrying in {} seconds...",
                response.status,
                self.retry.delay.as_secs()
            );
            self.retry.wait().await;
        };

        let page = parse_catalog_page(&response.bytes).map_err(|e| SniperError::Api {
            message: format!("Malformed catalog page from {}: {}", url, e),
        })?;
        CatalogMetrics::record_page_fetched(page.items.len(), started.elapsed().as_secs_f64());
        debug!(items = page.items.len(), has_next = !page.is_last(), attempts, "Fetched catalog page");
        Ok(page)
    }
}
