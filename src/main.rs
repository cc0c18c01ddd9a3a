// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use libvirt_aws::{
    api::{router, AppState},
    backend::{ObjectId, VirshBackend},
    config::{load_record_sets, Cli, Command},
    constants::CONNECT_RETRY_DELAY,
    session::Session,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("libvirt-aws")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!(uri = %cli.libvirt_uri, "Logging initialized");

    let backend = VirshBackend::new(cli.libvirt_uri.as_str())
        .with_transient_updates(cli.transient_updates);
    let session = Arc::new(Session::new(Arc::new(backend)));
    let connected = session
        .connect_with_retry(
            &ObjectId::parse(&cli.libvirt_image_pool),
            &ObjectId::parse(&cli.libvirt_network),
            CONNECT_RETRY_DELAY,
        )
        .await
        .context("Failed to connect to libvirt")?;
    let pool = connected.pool.name.as_str();
    let network = connected.network.name.as_str();

    match cli.command {
        Command::Records(args) => {
            print_json(&session.get_dns_records(network, &args.to_query()).await?)
        }
        Command::Diff(args) => {
            let records = load_record_sets(&args.file)?;
            let desired = session
                .zone_desired(network, args.zone.as_deref(), &records)
                .await?;
            print_json(&session.get_dns_diff(network, &desired).await?)
        }
        Command::Apply(args) => {
            let records = load_record_sets(&args.file)?;
            let change = session
                .replace_zone_records(network, args.zone.as_deref(), &records)
                .await?;
            print_json(&change)
        }
        Command::Volumes => {
            let volumes = session.get_all_volumes(pool).await?;
            let volumes: Vec<_> = volumes.iter().map(|volume| &**volume).collect();
            print_json(&volumes)
        }
        Command::Attachments { volume } => {
            print_json(&session.get_vol_attachments(pool, &volume).await?)
        }
        Command::Network => print_json(&session.describe_network(network).await?.summary()),
        Command::Serve(args) => {
            let addr = args.socket_addr();
            let app = router(AppState {
                session: Arc::clone(&session),
                network: network.to_string(),
            });
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;

            info!(%addr, network = %network, pool = %pool, "Serving HTTP API");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("HTTP API stopped");
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
