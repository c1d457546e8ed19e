use crate::types::{CatalogItem, ItemOutcome};
use tracing::{error, info};

/// Operator-facing record of what happened to one item. Goes to stdout and
/// to the structured log.
pub fn report_item(item: &CatalogItem, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Purchased { attempts } => {
            info!(
                asset_id = item.asset_id,
                product_id = item.product_id,
                attempts,
                outcome = outcome.label(),
                "Purchased asset"
            );
            println!("🛒 Purchased asset {}; productId = {}", item.asset_id, item.product_id);
        }
        ItemOutcome::AlreadyOwnedBundle => {
            info!(asset_id = item.asset_id, outcome = outcome.label(), "User already owns bundle");
            println!("   User already owns bundle {}", item.asset_id);
        }
        ItemOutcome::AlreadyOwnedAsset => {
            info!(
                asset_id = item.asset_id,
                product_id = item.product_id,
                outcome = outcome.label(),
                "User already owns asset"
            );
            println!("   User already owns asset {}; productId = {}", item.asset_id, item.product_id);
        }
        ItemOutcome::NotForSale => {
            info!(asset_id = item.asset_id, outcome = outcome.label(), "Asset is not for sale");
            println!("   Asset {} is not for sale", item.asset_id);
        }
        ItemOutcome::Failed { reason, submissions } => {
            error!(
                asset_id = item.asset_id,
                product_id = item.product_id,
                submissions,
                outcome = outcome.label(),
                "Skipping asset: {}",
                reason
            );
            println!("❌ Skipping asset {}: {}", item.asset_id, reason);
        }
    }
}
