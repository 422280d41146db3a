use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub transition_latency_seconds: HistogramVec,
    pub bulk_items_total: IntCounterVec,
    pub history_events_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Order transitions by outcome"),
            &["outcome"],
        )
        .expect("valid transitions_total metric");

        let transition_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "transition_latency_seconds",
                "Latency of order transition commits in seconds",
            ),
            &["outcome"],
        )
        .expect("valid transition_latency_seconds metric");

        let bulk_items_total = IntCounterVec::new(
            Opts::new("bulk_items_total", "Bulk operation items by outcome"),
            &["outcome"],
        )
        .expect("valid bulk_items_total metric");

        let history_events_total = IntCounter::new(
            "history_events_total",
            "Total order history events appended",
        )
        .expect("valid history_events_total metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(transition_latency_seconds.clone()))
            .expect("register transition_latency_seconds");
        registry
            .register(Box::new(bulk_items_total.clone()))
            .expect("register bulk_items_total");
        registry
            .register(Box::new(history_events_total.clone()))
            .expect("register history_events_total");

        Self {
            registry,
            transitions_total,
            transition_latency_seconds,
            bulk_items_total,
            history_events_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
