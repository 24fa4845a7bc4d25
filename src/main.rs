use clap::Parser;
use textlens::config::{Config, ServerArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets usually live in a .env file next to the binary
    dotenvy::dotenv().ok();

    let args = ServerArgs::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    tracing::info!("Starting textlens-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Binding to {} (target script: {}, max file size: {} bytes)",
        config.bind_addr(),
        config.target_script,
        config.max_file_size
    );

    textlens::server::run(config).await
}
