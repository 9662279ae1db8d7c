// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whispers secret-sharing server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whispers_server::jobs::{JobScheduler, OAuthStateCleanupJob, PurgeExpiredSecretsJob};
use whispers_server::{create_app_state, create_router};

/// Whispers server - HTTP server for sharing time-limited secrets.
#[derive(Parser, Debug)]
#[command(name = "whispers-server", about = "Whispers secret sharing server", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/whispers/server.toml).
	#[arg(long, env = "WHISPERS_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Subcommands for whispers-server (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Parse CLI arguments
	let args = Args::parse();

	// Handle subcommands that should not start the server
	if let Some(Command::Version) = args.command {
		println!("whispers-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	// Load configuration
	let config = match args.config {
		Some(ref path) => whispers_server_config::load_config_with_file(path.clone())?,
		None => whispers_server_config::load_config()?,
	};

	// Setup tracing
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting whispers-server"
	);

	// Create database pool and run migrations
	let pool = whispers_server::db::create_pool(&config.database.url).await?;
	whispers_server::db::run_migrations(&pool).await?;

	let state = create_app_state(pool, &config).await?;

	// Register background jobs
	let mut scheduler = JobScheduler::new();
	scheduler.register_periodic(
		Arc::new(PurgeExpiredSecretsJob::new(Arc::clone(&state.secrets))),
		Duration::from_secs(config.jobs.purge_interval_secs),
	);
	scheduler.register_periodic(
		Arc::new(OAuthStateCleanupJob::new(Arc::clone(&state.oauth_states))),
		Duration::from_secs(10 * 60),
	);
	let scheduler = Arc::new(scheduler);

	// Sweep once at startup, then on the configured interval.
	scheduler.run_all_once().await;
	scheduler.start().await;

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	// Start server
	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	// Run server with graceful shutdown
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
			scheduler.shutdown().await;
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
