//! Prometheus metrics for the HTTP surface.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Votes committed.
    pub votes_cast: IntCounter,
    /// Casts refused, labelled by error code.
    pub votes_rejected: IntCounterVec,
    /// Standings requests that failed.
    pub snapshot_errors: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent casting a vote, in milliseconds, whatever the outcome.
    pub cast_latency_ms: Histogram,
}

impl RpcMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let votes_cast = register_int_counter_with_registry!(
            Opts::new("votatoon_votes_cast_total", "Total votes cast"),
            registry
        )?;

        let votes_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "votatoon_votes_rejected_total",
                "Total vote casts rejected, by reason"
            ),
            &["reason"],
            registry
        )?;

        let snapshot_errors = register_int_counter_with_registry!(
            Opts::new(
                "votatoon_snapshot_errors_total",
                "Total race standings requests that failed"
            ),
            registry
        )?;

        // 0.1 ms → ~1.6 s
        let cast_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new("votatoon_cast_latency_ms", "Vote cast latency in milliseconds")
                .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            votes_cast,
            votes_rejected,
            snapshot_errors,
            cast_latency_ms,
        })
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
