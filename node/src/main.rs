// Copyright (c) 2026 Digital Reserve Contributors. MIT License.
// See LICENSE for details.

//! # Digital Reserve Node
//!
//! Entry point for the `dr-node` binary. Parses CLI arguments, initializes
//! logging and metrics, deploys a reserve over the seeded devnet market, and
//! serves it over HTTP.
//!
//! The binary supports three subcommands:
//!
//! - `run`      — serve the reserve API and metrics
//! - `simulate` — run a deposit / withdraw lifecycle and print the records
//! - `version`  — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use std::sync::Arc;

use alloy_primitives::{address, Address};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dr_contracts::WithdrawalFee;
use dr_protocol::config::{units, DEFAULT_DEADLINE_WINDOW_SECS, PROTOCOL_VERSION};
use dr_protocol::devnet;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::signal;

use cli::{Commands, DrNodeCli, ReserveArgs};
use logging::LogFormat;
use metrics::ReserveMetrics;

/// First depositor in `simulate`.
const SIM_ALICE: Address = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");

/// Second depositor in `simulate`.
const SIM_BOB: Address = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");

/// Lending yield credited between the deposits and the withdrawals in
/// `simulate`, in basis points.
const SIM_YIELD_BPS: u64 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DrNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Simulate(args) => simulate(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Turns CLI reserve arguments into devnet deployment parameters.
fn devnet_params(args: &ReserveArgs, now: u64) -> Result<api::DevnetParams> {
    let fee = WithdrawalFee::new(args.fee_fraction, args.fee_base).context("invalid withdrawal fee")?;
    let strategy = api::resolve_token(&args.strategy)
        .ok_or_else(|| anyhow!("unknown strategy asset {:?}", args.strategy))?;
    Ok(api::DevnetParams {
        owner: args.owner.unwrap_or(devnet::DEPLOYER),
        fee,
        deposits_enabled: !args.deposits_disabled,
        strategy,
        now,
    })
}

/// Starts the API server and the metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_str_lossy(&args.log_format));

    let params = devnet_params(&args.reserve, api::unix_now())?;
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        owner = %params.owner,
        strategy = %args.reserve.strategy,
        deposits_enabled = params.deposits_enabled,
        "starting dr-node"
    );

    // --- Reserve ---
    let reserve = api::devnet_reserve(&params)?;
    tracing::info!(address = %reserve.address(), "reserve deployed");

    // --- Metrics ---
    let reserve_metrics = Arc::new(ReserveMetrics::new().context("failed to register metrics")?);
    reserve_metrics.observe(&reserve);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        reserve: Arc::new(Mutex::new(reserve)),
        metrics: Arc::clone(&reserve_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&reserve_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("dr-node stopped");
    Ok(())
}

/// Prints one JSON line to stdout.
fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Runs two depositors through a full lifecycle against a fresh reserve:
/// bootstrap deposit, follow-up deposit, yield, partial and full exits.
fn simulate(args: cli::SimulateArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_str_lossy(&args.log_format));

    let now = api::unix_now();
    let params = devnet_params(&args.reserve, now)?;
    let mut reserve = api::devnet_reserve(&params)?;
    if !params.deposits_enabled {
        reserve
            .change_deposit_status(params.owner, true)
            .context("failed to enable deposits")?;
    }
    let spender = reserve.address();
    let deadline = now + DEFAULT_DEADLINE_WINDOW_SECS;

    for (user, whole) in [(SIM_ALICE, args.first_deposit), (SIM_BOB, args.second_deposit)] {
        let market = reserve.market_mut();
        devnet::faucet(market, user, whole)?;
        dr_protocol::market::AssetLedger::approve(market, devnet::DRC, user, spender, units(whole))?;
        emit(&reserve.deposit_drc(user, units(whole), deadline)?)?;
    }

    reserve.market_mut().accrue_yield(params.strategy, SIM_YIELD_BPS)?;
    tracing::info!(
        bps = SIM_YIELD_BPS,
        price = %reserve.get_proof_of_deposit_price()?,
        "lending yield accrued"
    );

    emit(&reserve.withdraw_drc(SIM_BOB, units(args.partial_withdrawal), deadline)?)?;
    emit(&reserve.withdraw_percentage(SIM_ALICE, 100, deadline)?)?;
    emit(&reserve.withdraw_percentage(SIM_BOB, 100, deadline)?)?;

    tracing::info!(
        supply = %reserve.total_supply(),
        retained_fees = %reserve.retained_fees(),
        events = reserve.events().len(),
        "simulation complete"
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("dr-node   {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", PROTOCOL_VERSION);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. A handler that fails to
/// install is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
