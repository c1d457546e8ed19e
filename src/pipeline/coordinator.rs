use crate::app::ports::SessionPort;
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::ownership::{Ownership, OwnershipFilter};
use crate::pipeline::page_fetcher::PageFetcher;
use crate::pipeline::purchase::PurchaseExecutor;
use crate::pipeline::report::report_item;
use crate::types::{CatalogItem, ItemOutcome, RunSummary};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// Processes the items of one page: ownership check, then purchase
pub struct PageWorker {
    filter: OwnershipFilter,
    executor: PurchaseExecutor,
}

impl PageWorker {
    pub fn new(filter: OwnershipFilter, executor: PurchaseExecutor) -> Self {
        Self { filter, executor }
    }

    pub async fn process_item(&self, item: &CatalogItem) -> ItemOutcome {
        let outcome = if !item.is_for_sale() {
            ItemOutcome::NotForSale
        } else {
            match self.filter.check(item).await {
                Ok(Ownership::Bundle) => ItemOutcome::AlreadyOwnedBundle,
                Ok(Ownership::Asset) => ItemOutcome::AlreadyOwnedAsset,
                Ok(Ownership::NotOwned) => match self.executor.buy(item).await {
                    Ok(receipt) => ItemOutcome::Purchased {
                        attempts: receipt.attempts,
                    },
                    Err(e) => ItemOutcome::Failed {
                        submissions: e.purchase_submissions(),
                        reason: e.to_string(),
                    },
                },
                Err(e) => ItemOutcome::Failed {
                    reason: e.to_string(),
                    submissions: 0,
                },
            }
        };
        report_item(item, &outcome);
        outcome
    }

    /// Items run one after another; a failed item never stops the page
    pub async fn process_page(&self, items: Vec<CatalogItem>) -> RunSummary {
        let mut summary = RunSummary::default();
        for item in &items {
            let outcome = self.process_item(item).await;
            summary.record(&outcome);
        }
        summary
    }
}

/// Drives pagination and fans pages out to concurrent workers.
///
/// The next page is fetched as soon as the previous one arrives, without
/// waiting for its worker. The run finishes once the last page has been
/// fetched and every worker has joined.
pub struct Coordinator {
    fetcher: PageFetcher,
    worker: Arc<PageWorker>,
    page_slots: Option<Arc<Semaphore>>,
}

impl Coordinator {
    pub fn new(fetcher: PageFetcher, worker: PageWorker, max_concurrent_pages: Option<usize>) -> Self {
        Self {
            fetcher,
            worker: Arc::new(worker),
            page_slots: max_concurrent_pages.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Wire every component from `config` for the authenticated `user_id`.
    /// Loads the owned bundle set once.
    pub async fn from_config(session: Arc<dyn SessionPort>, config: &Config, user_id: u64) -> Self {
        let fetcher = PageFetcher::new(
            session.clone(),
            config.endpoints.clone(),
            config.catalog.clone(),
            config.retry.page_policy(),
        );
        let filter = OwnershipFilter::load(session.clone(), config.endpoints.clone(), user_id).await;
        let executor = PurchaseExecutor::new(session, config.endpoints.clone(), config.retry.purchase_policy());
        Self::new(
            fetcher,
            PageWorker::new(filter, executor),
            config.pipeline.max_concurrent_pages,
        )
    }

    fn spawn_page(&self, workers: &mut JoinSet<RunSummary>, page_number: usize, items: Vec<CatalogItem>) {
        let worker = self.worker.clone();
        let slots = self.page_slots.clone();
        let span = info_span!("page", page = page_number, items = items.len());

        workers.spawn(
            async move {
                let _permit = match slots {
                    Some(slots) => slots.acquire_owned().await.ok(),
                    None => None,
                };
                let summary = worker.process_page(items).await;
                debug!(
                    purchased = summary.purchased,
                    owned = summary.already_owned,
                    failed = summary.failed,
                    "Page worker finished"
                );
                summary
            }
            .instrument(span),
        );
    }

    /// Run the whole acquisition pipeline.
    ///
    /// A fatal page fetch error cancels the in-flight workers and is returned.
    #[instrument(skip(self), fields(run_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let mut workers = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut seen_cursors = HashSet::new();
        let mut cursor: Option<String> = None;

        info!(started_at = %chrono::Utc::now().to_rfc3339(), "🚀 Starting catalog scan");
        loop {
            let page = match self.fetcher.fetch_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    error!("Page fetch failed, aborting run: {}", e);
                    workers.shutdown().await;
                    return Err(e);
                }
            };
            summary.pages_fetched += 1;
            info!(
                page = summary.pages_fetched,
                items = page.items.len(),
                "📄 Fetched catalog page"
            );

            let next = page.cursor;
            self.spawn_page(&mut workers, summary.pages_fetched, page.items);

            match next {
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    warn!("Cursor {} was already visited, stopping pagination", next);
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!("Last page reached, waiting for {} page workers", workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(page_summary) => summary.merge(&page_summary),
                Err(e) => {
                    error!("Page worker did not complete: {}", e);
                    summary.worker_panics += 1;
                }
            }
        }

        info!(
            pages = summary.pages_fetched,
            purchased = summary.purchased,
            owned = summary.already_owned,
            failed = summary.failed,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Run complete"
        );
        println!("✅ Completed!");
        Ok(summary)
    }
}
