use std::time::Duration;

use crate::args::Cli;

pub const DEFAULT_INITIAL_SECONDS: u64 = 3600;
pub const DEFAULT_COMBO_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_COMBO_SUPPRESS: Duration = Duration::from_secs(60);
pub const DEFAULT_EFFECT_DURATION: Duration = Duration::from_millis(3500);
pub const DEFAULT_DEMO_INTERVAL: Duration = Duration::from_secs(2);

/// Runtime configuration shared by the server and every session it spawns.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gateway_url: String,
    /// Countdown balance a fresh session starts with.
    pub initial_seconds: u64,
    /// How long a finished combo stays live in the ledger.
    pub combo_grace: Duration,
    /// How long a retired combo's tombstone is kept after the grace period.
    pub combo_suppress: Duration,
    /// How long a time-added effect stays visible.
    pub effect_duration: Duration,
    /// Gap between synthetic gifts in demo mode.
    pub demo_interval: Duration,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            port: cli.port,
            gateway_url: cli.gateway_url.clone(),
            initial_seconds: cli.initial_seconds,
            combo_grace: Duration::from_secs(cli.combo_grace_secs),
            combo_suppress: Duration::from_secs(cli.combo_suppress_secs),
            effect_duration: Duration::from_millis(cli.effect_millis),
            demo_interval: Duration::from_secs(cli.demo_interval_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            gateway_url: "wss://webcast.example.tv/ws".to_string(),
            initial_seconds: DEFAULT_INITIAL_SECONDS,
            combo_grace: DEFAULT_COMBO_GRACE,
            combo_suppress: DEFAULT_COMBO_SUPPRESS,
            effect_duration: DEFAULT_EFFECT_DURATION,
            demo_interval: DEFAULT_DEMO_INTERVAL,
        }
    }
}
