//! CLI flags parsed into a typed, immutable configuration, validated once at
//! startup and shared via application state. Never re-read per request.

use std::path::PathBuf;

use clap::Parser;

/// Path-addressed HTTP relay: a POST writes, concurrent GETs read.
#[derive(Parser, Debug, Clone)]
#[command(name = "relay-server", about = "Path-addressed HTTP pub/sub relay")]
pub struct Config {
    /// Archive root directory; created if missing.
    #[arg(long, env = "RELAY_FOLDER", default_value = "archived")]
    pub folder: PathBuf,

    /// TCP listen port.
    #[arg(long, env = "RELAY_PORT", default_value_t = 9222)]
    pub port: u16,

    /// Bind address.
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Enable verbose (debug) logging.
    #[arg(long, env = "RELAY_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Parse from `std::env::args`, creating the archive folder if absent.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::parse();
        std::fs::create_dir_all(&config.folder)?;
        Ok(config)
    }
}
