use std::sync::Arc;

use clap::Parser;

/// Subathon countdown widget server.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Port for the widget websocket server
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Websocket gateway supplying live gift events
    #[arg(long, default_value = "wss://webcast.example.tv/ws")]
    pub gateway_url: String,

    /// Starting countdown balance, in seconds
    #[arg(long, default_value_t = 3600)]
    pub initial_seconds: u64,

    /// Seconds a finished combo stays live in the ledger
    #[arg(long, default_value_t = 5)]
    pub combo_grace_secs: u64,

    /// Seconds a retired combo's final count is remembered to absorb
    /// late duplicate terminal notifications
    #[arg(long, default_value_t = 60)]
    pub combo_suppress_secs: u64,

    /// Milliseconds a time-added effect stays visible
    #[arg(long, default_value_t = 3500)]
    pub effect_millis: u64,

    /// Seconds between synthetic gifts in demo mode
    #[arg(long, default_value_t = 2)]
    pub demo_interval_secs: u64,
}

pub fn parse_cli_args() -> Arc<Cli> {
    Arc::new(Cli::parse())
}
