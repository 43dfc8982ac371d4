#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use buzzer_server::config;
use buzzer_server::logging;
use buzzer_server::questions::TriviaApiSource;
use buzzer_server::server::{routes, GameServer};
use clap::Parser;

/// Buzzer Server -- authoritative back end for a real-time trivia buzzer game
#[derive(Parser, Debug)]
#[command(name = "buzzer-server")]
#[command(about = "In-memory multiplayer back end for a real-time trivia buzzer game")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code defaults.
    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if cli.validate_config {
        println!("Configuration validation passed");
        println!();
        println!("Configuration summary:");
        println!("  Port: {}", cfg.port);
        println!("  CORS origins: {}", cfg.cors_origins);
        println!("  Question provider: {}", cfg.provider.base_url);
        println!(
            "  Question fetch timeout: {}s",
            cfg.server.question_fetch_timeout_secs
        );
        println!(
            "  Empty room timeout: {}s",
            cfg.server.empty_room_timeout_secs
        );
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, "Starting buzzer server");

    let questions = Arc::new(TriviaApiSource::new(
        cfg.provider.base_url.clone(),
        Duration::from_secs(cfg.provider.request_timeout_secs),
    ));
    let game_server = GameServer::new(cfg.clone(), questions);

    // Sweep rooms that were created but never joined.
    let cleanup_server = game_server.clone();
    tokio::spawn(async move {
        cleanup_server.cleanup_task().await;
    });

    let app = routes::create_router(&cfg.cors_origins).with_state(game_server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %cfg.cors_origins,
        "Server started - HTTP API under /api, WebSocket at /ws/{{code}}"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
