//! Operator diagnostic: can the store be reached, and which collections
//! does it hold? Exits non-zero when the server would refuse to start.

use std::process::ExitCode;
use std::sync::Arc;

use taskboard::{
    bootstrap::Bootstrap,
    config::{BootstrapConfig, StoreConfig},
    store::DynamoStore,
    telemetry,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let store_cfg = StoreConfig::from_env()?;
    info!(
        region = %store_cfg.region,
        endpoint = store_cfg.endpoint.as_deref().unwrap_or("aws default"),
        "checking document store"
    );
    let store = Arc::new(DynamoStore::new(&store_cfg).await?);
    let bootstrap = Bootstrap::new(store, &BootstrapConfig::from_env()?);

    if let Err(e) = bootstrap.check_connection().await {
        error!(error = %e, "store is unreachable");
        return Ok(ExitCode::FAILURE);
    }

    let report = bootstrap.collection_report().await?;
    for entry in &report {
        println!("{}", entry);
    }

    if report.iter().any(|r| r.blocks_startup()) {
        error!("required collections are missing or not active");
        return Ok(ExitCode::FAILURE);
    }
    info!("store is ready");
    Ok(ExitCode::SUCCESS)
}
