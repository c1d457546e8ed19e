//! The acquisition pipeline: page fetching, ownership filtering, purchasing,
//! and the coordinator that ties them together.

pub mod coordinator;
pub mod ownership;
pub mod page_fetcher;
pub mod purchase;
pub mod report;
pub mod retry;

pub use coordinator::{Coordinator, PageWorker};
pub use ownership::{Ownership, OwnershipFilter};
pub use page_fetcher::PageFetcher;
pub use purchase::PurchaseExecutor;
pub use retry::RetryPolicy;
