use std::net::SocketAddr;

// ── Cycle metrics ───────────────────────────────────────────────

/// Counter: facility cycles run. Labels: facility, status.
pub const CYCLES_TOTAL: &str = "courtwatch_cycles_total";

/// Histogram: wall time of one facility cycle in seconds. Labels: facility.
pub const CYCLE_DURATION_SECONDS: &str = "courtwatch_cycle_duration_seconds";

/// Gauge: half-hour slots in the latest snapshot. Labels: facility.
pub const SLOTS_CURRENT: &str = "courtwatch_slots_current";

/// Counter: slots not present in the previous snapshot. Labels: facility.
pub const NEW_SLOTS_TOTAL: &str = "courtwatch_new_slots_total";

/// Counter: openings handed to the notifier. Labels: facility.
pub const OPENINGS_NOTIFIED_TOTAL: &str = "courtwatch_openings_notified_total";

// ── Ingest metrics ──────────────────────────────────────────────

/// Counter: scrape days that came back with an error.
pub const SCRAPE_DAYS_FAILED_TOTAL: &str = "courtwatch_scrape_days_failed_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Label value for a cycle outcome.
pub fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(_) => "error",
    }
}
