use anyhow::Result;
use clap::Parser;

use boxoffice_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "boxoffice")]
#[command(about = "Box office purchase server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("BOXOFFICE_CONFIG", config);
    }

    let config = AppConfig::load().await?;
    // dropping the guard stops the file writer
    let _log_guard = boxoffice_bootstrap::init_tracing(&config)?;

    boxoffice_bootstrap::run_standalone(config).await
}
