// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker Monitor HTTP server
//!
//! # Usage
//!
//! ```bash
//! # Defaults: monitoring on 0.0.0.0:8222
//! broker-monitor-http
//!
//! # From a config file, overriding the port
//! broker-monitor-http --config broker.json --port 9222
//! ```

use broker_monitor::{Monitor, MonitorConfig, Server};
use broker_monitor_http::build_router;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Broker monitoring endpoint server
#[derive(Parser, Debug)]
#[command(name = "broker-monitor-http")]
#[command(about = "HTTP/JSON monitoring endpoints for the broker")]
#[command(version)]
struct Args {
    /// HTTP port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Server configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server name reported by varz
    #[arg(long)]
    server_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(bind) = args.bind {
        config.http_host = bind;
    }
    if let Some(name) = args.server_name {
        config.server_name = name;
    }
    config.validate()?;

    let addr = format!("{}:{}", config.http_host, config.http_port);
    let server = Arc::new(Server::new(config));
    let monitor = Arc::new(Monitor::new(Arc::clone(&server)));
    let app = build_router(monitor);

    info!("Broker Monitor v{}", broker_monitor::VERSION);
    info!("Server id: {}", server.id());
    info!("Monitoring: http://{}/", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    server.shutdown();
    info!("Monitoring stopped");
    Ok(())
}
