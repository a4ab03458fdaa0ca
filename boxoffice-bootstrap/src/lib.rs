pub mod context;
pub mod lifecycle;
pub mod telemetry;

pub use lifecycle::{build_router_with_layers, run_standalone};
pub use telemetry::init_tracing;

pub async fn run() -> anyhow::Result<()> {
    let config = boxoffice_infrastructure::AppConfig::load().await?;
    let _log_guard = init_tracing(&config)?;
    run_standalone(config).await
}
