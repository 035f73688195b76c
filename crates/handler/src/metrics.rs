use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub request_counter: IntCounter,
    pub deprecated_usage_counter: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let request_counter = IntCounter::new(
            "depgate_requests_total",
            "Total number of GraphQL documents checked",
        )?;
        let deprecated_usage_counter = IntCounterVec::new(
            Opts::new(
                "depgate_deprecated_usage_total",
                "Number of checked documents referencing a deprecated member",
            ),
            &["member"],
        )?;
        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(deprecated_usage_counter.clone()))?;
        Ok(Metrics {
            registry,
            request_counter,
            deprecated_usage_counter,
        })
    }

    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
