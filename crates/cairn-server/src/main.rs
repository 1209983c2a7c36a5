// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cairn server binary.

use cairn_server::{
	backfill_versions, create_app_state, create_ledger, create_router, migrate_credentials,
};
use cairn_server_cipher::SecretCipher;
use cairn_server_config::ServerConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cairn server - IT documentation and credential vault.
#[derive(Parser, Debug)]
#[command(name = "cairn-server", about = "Cairn IT documentation server", version)]
struct Args {
	/// Config file to use instead of /etc/cairn/server.toml
	#[arg(long, global = true, env = "CAIRN_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Encrypt every plaintext credential and verify every encrypted one
	MigrateCredentials,
	/// Write an initial version for every record without history
	BackfillVersions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", cairn_server::version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => cairn_server_config::load_config_with_file(path.clone())?,
		None => cairn_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let pool = cairn_server_db::create_pool_with(
		&config.database.url,
		config.database.busy_timeout(),
		config.database.max_connections,
	)
	.await?;
	cairn_server_db::run_migrations(&pool).await?;

	// PBKDF2 runs once, here.
	let cipher = Arc::new(SecretCipher::new(&config.cipher.master_secret)?);

	match args.command {
		Some(Command::MigrateCredentials) => {
			let report = migrate_credentials(&pool, &cipher).await?;
			println!(
				"encrypted: {}, verified: {}, sealed versions: {}, skipped: {}, failed: {}",
				report.encrypted,
				report.verified,
				report.sealed_versions,
				report.skipped,
				report.failed.len()
			);
			if !report.is_success() {
				for id in &report.failed {
					eprintln!("failed: {id}");
				}
				std::process::exit(1);
			}
			Ok(())
		}
		Some(Command::BackfillVersions) => {
			let ledger = create_ledger(pool.clone(), config.ledger.clone(), cipher.clone());
			let report = backfill_versions(&pool, &ledger).await?;
			println!(
				"created: {}, already versioned: {}",
				report.created, report.already_versioned
			);
			Ok(())
		}
		Some(Command::Version) | None => serve(pool, cipher, &config).await,
	}
}

async fn serve(
	pool: sqlx::SqlitePool,
	cipher: Arc<SecretCipher>,
	config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting cairn-server"
	);

	let state = create_app_state(pool, cipher, config);
	let app = create_router(state);

	let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
	tracing::info!(addr = %config.socket_addr(), "listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	tracing::info!("server shut down");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");
	}
	tracing::info!("shutdown signal received");
}
