// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

use chatrelay::chat::ChatService;
use chatrelay::config;
use chatrelay::proxy;
use chatrelay::upstream::ReqwestHttpSender;
use clap::Parser;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "chatrelay", about = "Streaming chat relay for OpenRouter-compatible providers")]
struct Cli {
    /// Path to a chatrelay.yaml config file (built-in defaults when omitted)
    #[arg(long, env = "CHATRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value_t = proxy::DEFAULT_PORT, env = "CHATRELAY_PORT")]
    port: u16,

    /// Dotenv file loaded into the environment before the config
    #[arg(long, default_value = "config/.env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match dotenvy::from_path(&cli.env_file) {
        Ok(()) => tracing::info!(path = %cli.env_file.display(), "loaded environment file"),
        Err(e) if e.not_found() => {
            tracing::debug!(path = %cli.env_file.display(), "no environment file")
        }
        Err(e) => tracing::warn!(path = %cli.env_file.display(), error = %e, "failed to load environment file"),
    }

    let source: Box<dyn config::ConfigSource> = match &cli.config {
        Some(path) => Box::new(config::FileSource { path: path.clone() }),
        None => Box::new(config::StringSource::builtin()),
    };
    let config = match config::load_config(source.as_ref()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        source = %source.describe(),
        upstream = %config.upstream.base_url,
        default_model = %config.models.default,
        advanced_model = %config.models.advanced,
        fallback_model = %config.models.fallback,
        allowed_origins = ?config.server.allowed_origins,
        config_hash = %config.config_hash,
        "config loaded"
    );
    if config.upstream.api_key.is_none() {
        tracing::warn!(
            env = config::API_KEY_ENV,
            "no upstream API key configured; chat requests will fail"
        );
    }

    let service = ChatService::new(config.clone(), Arc::new(ReqwestHttpSender::default()));
    let app = proxy::build_router(Arc::new(service), &config.server);

    let addr = SocketAddr::from((proxy::BIND_IP, cli.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind to address");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "chatrelay listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
