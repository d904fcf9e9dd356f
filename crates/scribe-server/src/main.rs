// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scribe server binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scribe_server::{auth_middleware, create_app_state, create_router, db};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scribe server - GitHub App installation webhooks and repository configuration.
#[derive(Parser, Debug)]
#[command(
	name = "scribe-server",
	about = "Scribe installation webhook and repository configuration server",
	version
)]
struct Args {
	/// Config file to read instead of /etc/scribe/server.toml
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
	/// Manage user API tokens
	Token {
		#[command(subcommand)]
		command: TokenCommand,
	},
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
	/// Mint a token for a GitHub login and print it once
	Create {
		#[arg(long)]
		username: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("scribe-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => scribe_server_config::load_config_with_file(path.clone())?,
		None => scribe_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let pool = db::create_pool(&config.database.url).await?;
	db::run_migrations(&pool).await?;

	if let Some(Command::Token {
		command: TokenCommand::Create { username },
	}) = &args.command
	{
		let tokens = db::TokenRepository::new(pool.clone());
		let token = auth_middleware::issue_token(&tokens, username).await?;
		println!("{token}");
		return Ok(());
	}

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting scribe-server"
	);

	let state = create_app_state(pool, &config);

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
