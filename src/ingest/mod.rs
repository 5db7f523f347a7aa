// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::describe_counter;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_events_total",
            "Fixtures normalized from provider payloads."
        );
        describe_counter!(
            "ingest_parse_errors_total",
            "Per-event parse failures dropped during normalization."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch errors (network/HTTP)."
        );
        describe_counter!(
            "reconcile_dedup_total",
            "Secondary-source events removed by the identity heuristic."
        );
        describe_counter!(
            "reconcile_placeholders_total",
            "Synthetic round placeholders emitted."
        );
        describe_counter!("feed_cache_hits_total", "Hourly cache hits per feed.");
        describe_counter!("feed_cache_misses_total", "Hourly cache misses per feed.");
    });
}
