//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Resilient HTTP gateway for the event service
#[derive(Parser, Debug)]
#[command(name = "event-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "EVENT_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "EVENT_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "EVENT_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Base URL of the upstream event service
    #[arg(long, env = "EXTERNAL_BASE_URL")]
    pub upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "EVENT_GATEWAY_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "EVENT_GATEWAY_LOG_FORMAT")]
    pub log_format: Option<String>,
}
