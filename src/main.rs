use anyhow::Context;

use taskboard::{app, bootstrap::Bootstrap, config::AppConfig, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    // Collections must exist and be active before any request is accepted.
    let bootstrap = Bootstrap::new(app_state.store.clone(), &app_state.config.bootstrap);
    bootstrap
        .initialize_tables()
        .await
        .context("initialize collections")?;
    if !bootstrap.validate_tables().await {
        tracing::error!("required collections are not ready; refusing to serve");
        anyhow::bail!("required collections are not ready");
    }

    let config = app_state.config.clone();
    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
