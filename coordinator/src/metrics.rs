//! Prometheus metrics for the coordinator.
//!
//! [`CoordinatorMetrics`] owns a dedicated [`Registry`] that the HTTP
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

pub struct CoordinatorMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub wallets_registered: IntCounter,
    pub proposals_created: IntCounter,
    /// Same-nonce proposals superseded by a newer one, plus explicit cancels.
    pub proposals_cancelled: IntCounter,
    pub signatures_collected: IntCounter,
    pub executions_submitted: IntCounter,
    pub executions_succeeded: IntCounter,
    /// Executions whose receipt reported a revert.
    pub executions_failed: IntCounter,
    /// Read-modify-write attempts that lost a version race.
    pub update_conflicts: IntCounter,
    /// Contract calls that failed for transport or provider reasons.
    pub upstream_errors: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Executions currently waiting for a receipt.
    pub executions_in_flight: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time from submission to observed receipt, in milliseconds.
    pub receipt_latency_ms: Histogram,
}

impl CoordinatorMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| {
            register_int_counter_with_registry!(Opts::new(name, help), registry)
                .unwrap_or_else(|e| panic!("failed to register {name} counter: {e}"))
        };

        let wallets_registered = counter("cosign_wallets_registered_total", "Wallets registered");
        let proposals_created = counter("cosign_proposals_created_total", "Proposals created");
        let proposals_cancelled =
            counter("cosign_proposals_cancelled_total", "Proposals cancelled");
        let signatures_collected =
            counter("cosign_signatures_collected_total", "Signatures appended");
        let executions_submitted = counter(
            "cosign_executions_submitted_total",
            "Executions submitted on-chain",
        );
        let executions_succeeded = counter(
            "cosign_executions_succeeded_total",
            "Executions confirmed with a success receipt",
        );
        let executions_failed = counter(
            "cosign_executions_failed_total",
            "Executions whose receipt reported a revert",
        );
        let update_conflicts = counter(
            "cosign_update_conflicts_total",
            "Transaction writes that lost a version race",
        );
        let upstream_errors = counter(
            "cosign_upstream_errors_total",
            "Contract calls that failed upstream",
        );

        let executions_in_flight = register_int_gauge_with_registry!(
            Opts::new(
                "cosign_executions_in_flight",
                "Executions waiting for a receipt"
            ),
            registry
        )
        .expect("failed to register executions_in_flight gauge");

        // 100 ms → ~27 min
        let receipt_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "cosign_receipt_latency_ms",
                "Submission to receipt latency in milliseconds"
            )
            .buckets(
                prometheus::exponential_buckets(100.0, 2.0, 15)
                    .expect("valid bucket parameters")
            ),
            registry
        )
        .expect("failed to register receipt_latency_ms histogram");

        Self {
            registry,
            wallets_registered,
            proposals_created,
            proposals_cancelled,
            signatures_collected,
            executions_submitted,
            executions_succeeded,
            executions_failed,
            update_conflicts,
            upstream_errors,
            executions_in_flight,
            receipt_latency_ms,
        }
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for CoordinatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = CoordinatorMetrics::new();
        metrics.proposals_created.inc();
        metrics.proposals_created.inc();
        metrics.receipt_latency_ms.observe(250.0);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("cosign_proposals_created_total 2"));
        assert!(text.contains("cosign_receipt_latency_ms_bucket"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = CoordinatorMetrics::new();
        let b = CoordinatorMetrics::new();
        a.executions_succeeded.inc();
        assert_eq!(b.executions_succeeded.get(), 0);
    }
}
