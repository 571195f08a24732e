//! # Prometheus Metrics
//!
//! Operation counters and reserve gauges, scraped by Prometheus at the
//! `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use std::sync::Arc;

use alloy_primitives::U256;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use dr_contracts::DigitalReserve;
use dr_protocol::config::SCALE;
use dr_protocol::market::Market;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct ReserveMetrics {
    registry: Registry,
    /// Committed deposits.
    pub deposits_total: IntCounter,
    /// Committed withdrawals, exact and percentage.
    pub withdrawals_total: IntCounter,
    /// Committed strategy switches.
    pub strategy_switches_total: IntCounter,
    /// Rejected or rolled-back operations, by operation name.
    pub failed_operations_total: IntCounterVec,
    /// POD supply in whole shares.
    pub pod_total_supply: Gauge,
    /// Strategy position in whole tokens.
    pub tokens_stored: Gauge,
    /// POD price in whole deposit-asset units.
    pub pod_price: Gauge,
    /// Idle deposit asset retained as fees.
    pub retained_fees: Gauge,
    /// Time spent inside the reserve lock per operation.
    pub operation_latency_seconds: Histogram,
}

impl ReserveMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("dr".into()), None)?;

        let deposits_total = IntCounter::new("deposits_total", "Committed deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total = IntCounter::new("withdrawals_total", "Committed withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let strategy_switches_total =
            IntCounter::new("strategy_switches_total", "Committed strategy switches")?;
        registry.register(Box::new(strategy_switches_total.clone()))?;

        let failed_operations_total = IntCounterVec::new(
            Opts::new("failed_operations_total", "Rejected or rolled-back operations"),
            &["operation"],
        )?;
        registry.register(Box::new(failed_operations_total.clone()))?;

        let pod_total_supply = Gauge::new("pod_total_supply", "POD supply in whole shares")?;
        registry.register(Box::new(pod_total_supply.clone()))?;

        let tokens_stored = Gauge::new("tokens_stored", "Strategy position in whole tokens")?;
        registry.register(Box::new(tokens_stored.clone()))?;

        let pod_price = Gauge::new("pod_price", "POD price in whole deposit-asset units")?;
        registry.register(Box::new(pod_price.clone()))?;

        let retained_fees = Gauge::new("retained_fees", "Deposit asset retained as withdrawal fees")?;
        registry.register(Box::new(retained_fees.clone()))?;

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Time spent executing a reserve operation",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(operation_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            deposits_total,
            withdrawals_total,
            strategy_switches_total,
            failed_operations_total,
            pod_total_supply,
            tokens_stored,
            pod_price,
            retained_fees,
            operation_latency_seconds,
        })
    }

    /// Refreshes the gauges from the reserve's current state.
    pub fn observe<M: Market>(&self, reserve: &DigitalReserve<M>) {
        self.pod_total_supply.set(to_whole(reserve.total_supply()));
        self.tokens_stored.set(to_whole(reserve.total_token_stored()));
        self.retained_fees.set(to_whole(reserve.retained_fees()));
        match reserve.get_proof_of_deposit_price() {
            Ok(price) => self.pod_price.set(to_whole(price)),
            Err(e) => tracing::warn!(error = %e, "price unavailable for metrics"),
        }
    }

    /// Counts a failed `operation`.
    pub fn record_failure(&self, operation: &str) {
        self.failed_operations_total.with_label_values(&[operation]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Raw 18-decimal units as whole units. Lossy by nature; gauges only.
fn to_whole(raw: U256) -> f64 {
    raw.to_string().parse::<f64>().unwrap_or(f64::MAX) / SCALE as f64
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<ReserveMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
