use clap::Parser;
use std::path::PathBuf;

use signal_relay::config;

#[derive(Parser, Debug)]
#[command(name = "signal-relay")]
#[command(author = "Selkies Team")]
#[command(version)]
#[command(about = "Room-based WebRTC signaling relay", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/signal-relay.toml")]
    pub config: PathBuf,

    /// HTTP bind address
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory with the static web client
    #[arg(long)]
    pub static_root: Option<PathBuf>,

    /// Do not serve the static web client
    #[arg(long, action)]
    pub no_static: bool,

    /// Verbose logging
    #[arg(short, long, action)]
    pub verbose: bool,
}

impl Args {
    pub fn load_config(&self) -> Result<config::Config, Box<dyn std::error::Error>> {
        config::Config::load(&self.config)
    }

    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut config::Config) {
        if let Some(ref host) = self.host {
            config.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(ref root) = self.static_root {
            config.http.static_root = root.clone();
        }
        if self.no_static {
            config.http.serve_static = false;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}
