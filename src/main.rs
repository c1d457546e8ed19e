use anyhow::Context;
use catalog_sniper::app::identity::resolve_user;
use catalog_sniper::app::ports::SessionPort;
use catalog_sniper::app::resellers::cheapest_reseller;
use catalog_sniper::config::{load_credential, Config};
use catalog_sniper::constants::DEFAULT_CONFIG_PATH;
use catalog_sniper::infra::RobloxSession;
use catalog_sniper::pipeline::Coordinator;
use catalog_sniper::{logging, metrics};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "catalog_sniper")]
#[command(about = "Buys every catalog item matching a filter that the account does not own yet")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML settings file (defaults apply when it is missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON file holding {"ROBLOXCOOKIE": "..."}; overrides credentials.path
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Serve Prometheus metrics at this address, e.g. 127.0.0.1:9898
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the catalog and buy every unowned item
    Run {
        /// Catalog category id
        #[arg(long)]
        category: Option<u32>,
        /// Highest price to consider
        #[arg(long)]
        max_price: Option<u64>,
        /// Include items that are not for sale
        #[arg(long)]
        include_not_for_sale: bool,
        /// Only items made by this creator
        #[arg(long, conflicts_with = "any_creator")]
        creator_target_id: Option<u64>,
        /// Drop the creator filter
        #[arg(long)]
        any_creator: bool,
        /// Cap on page workers running at once
        #[arg(long)]
        max_concurrent_pages: Option<usize>,
    },
    /// Show which account the credential belongs to
    Whoami,
    /// Show the cheapest resale listing of a limited asset
    Resellers {
        #[arg(long)]
        asset_id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let log_guard = logging::init_logging();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config).context("Could not load settings")?;
    let credentials_path = cli
        .credentials
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.credentials.path));
    let cookie = match load_credential(&credentials_path) {
        Ok(cookie) => cookie,
        Err(e) => {
            error!("Could not read config file: {}", e);
            println!("❌ Could not read config file. {}", e);
            // exit skips destructors
            drop(log_guard);
            std::process::exit(1);
        }
    };

    if let Some(addr) = cli
        .metrics_addr
        .clone()
        .or_else(|| std::env::var("SNIPER_METRICS_ADDR").ok())
    {
        metrics::init_metrics(&addr);
    }

    let session: Arc<dyn SessionPort> = Arc::new(RobloxSession::new(&cookie)?);

    match cli.command {
        Commands::Run {
            category,
            max_price,
            include_not_for_sale,
            creator_target_id,
            any_creator,
            max_concurrent_pages,
        } => {
            if let Some(category) = category {
                config.catalog.category = category;
            }
            if let Some(max_price) = max_price {
                config.catalog.max_price = max_price;
            }
            if include_not_for_sale {
                config.catalog.include_not_for_sale = true;
            }
            if any_creator {
                config.catalog.creator_target_id = None;
            } else if creator_target_id.is_some() {
                config.catalog.creator_target_id = creator_target_id;
            }
            if max_concurrent_pages.is_some() {
                config.pipeline.max_concurrent_pages = max_concurrent_pages;
            }
            config.validate()?;

            let profile = resolve_user(&*session, &config.endpoints).await?;
            println!("👤 Logged in as {} ({})", profile.name, profile.id);
            info!(query = %config.catalog.query_string(), "Catalog filter");

            let coordinator = Coordinator::from_config(session.clone(), &config, profile.id).await;
            let summary = coordinator.run().await?;

            println!("\n📊 Run summary:");
            println!("   Pages fetched: {}", summary.pages_fetched);
            println!("   Items seen: {}", summary.items_seen);
            println!("   Purchased: {}", summary.purchased);
            println!("   Already owned: {}", summary.already_owned);
            println!("   Not for sale: {}", summary.not_for_sale);
            println!("   Failed: {}", summary.failed);
            println!("   Purchase submissions: {}", summary.purchase_submissions);
        }
        Commands::Whoami => {
            let profile = resolve_user(&*session, &config.endpoints).await?;
            println!("{} ({})", profile.name, profile.id);
        }
        Commands::Resellers { asset_id } => {
            match cheapest_reseller(&*session, &config.endpoints, asset_id).await? {
                Some(listing) => println!(
                    "Cheapest listing for {}: {} Robux from seller {} (userAssetId {})",
                    asset_id, listing.price, listing.seller_id, listing.user_asset_id
                ),
                None => println!("Nobody is reselling asset {}", asset_id),
            }
        }
    }
    Ok(())
}
