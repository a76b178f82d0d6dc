use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::cluster::ReplicationTracker;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub kv_ops: IntCounterVec,
    pub requests: IntCounterVec,
    pub errors: IntCounterVec,
    pub write_latency: Histogram,
    pub replication_in_flight: IntGauge,
    pub replication_acks: IntGauge,
    pub replication_failures: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let kv_ops = IntCounterVec::new(Opts::new("kv_ops", "Key-Value Operations"), &["op"])?;
        let requests = IntCounterVec::new(
            Opts::new("requests", "Total API Requests"),
            &["method", "path", "status"],
        )?;
        let errors = IntCounterVec::new(Opts::new("errors", "Total API Errors"), &["kind"])?;
        let write_latency = Histogram::with_opts(
            HistogramOpts::new(
                "write_latency_seconds",
                "Time from local commit until the write quorum acked",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        let replication_in_flight = IntGauge::new(
            "replication_in_flight",
            "Replication tasks still running, including those past quorum",
        )?;
        let replication_acks =
            IntGauge::new("replication_acks_total", "Replication tasks acked by a follower")?;
        let replication_failures =
            IntGauge::new("replication_failures_total", "Replication tasks that failed in transport")?;

        registry.register(Box::new(kv_ops.clone()))?;
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(write_latency.clone()))?;
        registry.register(Box::new(replication_in_flight.clone()))?;
        registry.register(Box::new(replication_acks.clone()))?;
        registry.register(Box::new(replication_failures.clone()))?;

        Ok(Self {
            registry,
            kv_ops,
            requests,
            errors,
            write_latency,
            replication_in_flight,
            replication_acks,
            replication_failures,
        })
    }

    /// Copies the tracker's counters into the replication gauges.
    pub fn observe_tracker(&self, tracker: &ReplicationTracker) {
        self.replication_in_flight.set(tracker.in_flight() as i64);
        self.replication_acks.set(tracker.acks() as i64);
        self.replication_failures.set(tracker.failures() as i64);
    }

    /// Prometheus text exposition of everything registered.
    pub fn encode(&self) -> prometheus::Result<(String, Vec<u8>)> {
        let mut buffer = Vec::new();
        let enc = TextEncoder::new();
        enc.encode(&self.registry.gather(), &mut buffer)?;
        Ok((enc.format_type().to_string(), buffer))
    }
}
