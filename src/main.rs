//! Path details service - last-commit and size lookups for hosted git repositories
//!
//! # Usage
//! ```bash
//! path-details --repos-root /srv/git                            # Start server
//! path-details --repos-root /srv/git details app.git main src   # One batch, JSON to stdout
//! ```

use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use path_details::config::{Cli, Command, ServiceConfig};
use path_details::git::PathsDetailsService;
use path_details::routes::{self, SharedService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.service.clone();
    let service: SharedService = Arc::new(PathsDetailsService::new(config.clone()));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(service, &config).await,
        Command::Details {
            repo,
            revision,
            paths,
        } => {
            let response = service.paths_details(&repo, &revision, paths).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

async fn serve(service: SharedService, config: &ServiceConfig) -> anyhow::Result<()> {
    let app = routes::create_router(service).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to {}: {}", addr, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Serving repositories under {} (cache capacity {}, timeout {:?})",
        config.repos_root.display(),
        config.cache_capacity,
        config.request_timeout()
    );
    println!();
    println!("  Repositories: {}", config.repos_root.display());
    println!("  Server:       http://{}", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
