use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;
mod config;
mod demo;
mod gift;
mod server;
mod session;
mod webcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subathon_timer=debug,tower_http=info".into()),
        )
        .init();

    let cli = args::parse_cli_args();
    let config = config::Config::from_cli(&cli);

    info!(port = config.port, gateway = %config.gateway_url, "starting subathon timer");
    server::serve(config).await?;

    Ok(())
}
