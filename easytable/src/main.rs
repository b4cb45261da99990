// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use easytable::config;
use easytable::relay;

use std::net::{IpAddr, SocketAddr};

#[derive(Parser)]
#[command(name = "easytable", about = "Image-to-HTML table extraction relay")]
struct Cli {
    /// Path to the easytable.yaml config file
    #[arg(long, default_value = "easytable.yaml", env = "EASYTABLE_CONFIG")]
    config: String,

    /// Port to listen on (overrides server.port)
    #[arg(long, env = "EASYTABLE_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "EASYTABLE_BIND")]
    bind: IpAddr,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = config::FileSource::new(&cli.config);
    let config = match config::load_config(&source) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        quota_gate = config.auth.is_some(),
        max_image_bytes = config.server.max_image_bytes,
        "config loaded"
    );

    let port = cli.port.unwrap_or(config.server.port);
    let addr = SocketAddr::new(cli.bind, port);

    let app = relay::build_router(relay::build_app_state(&config));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "easytable listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
