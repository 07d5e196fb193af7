use std::collections::HashMap;

use crate::address::Address;
use crate::time::VirtualTime;

/// A single (time, value) observation.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub at: VirtualTime,
    pub value: f64,
}

/// The run-wide statistics registry.
///
/// Every actor records into the same `Metrics` instance (handed to it
/// through [`crate::world::Context`]) rather than keeping its own counters,
/// so a fresh [`Metrics::default`] per run is sufficient to reset state
/// between sweep combinations.
#[derive(Debug, Default)]
pub struct Metrics {
    server_queue_depth: HashMap<Address, Vec<Sample>>,
    lb_request_queue_depth: Vec<Sample>,
    lb_response_queue_depth: Vec<Sample>,
    dns_queue_depth: Vec<Sample>,
    client_latency: Vec<Sample>,
    server_drops: HashMap<Address, u64>,
    server_drops_series: HashMap<Address, Vec<Sample>>,
    lb_request_drops: u64,
    lb_request_drops_series: Vec<Sample>,
    lb_response_drops: u64,
    lb_response_drops_series: Vec<Sample>,
    dns_drops: u64,
    dns_drops_series: Vec<Sample>,
    concurrent_clients: i64,
    concurrent_clients_series: Vec<Sample>,
    completed_requests: u64,
    completions_series: Vec<Sample>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_server_queue_depth(&mut self, server: &Address, at: VirtualTime, depth: usize) {
        self.server_queue_depth
            .entry(server.clone())
            .or_default()
            .push(Sample {
                at,
                value: depth as f64,
            });
    }

    pub fn record_lb_request_queue_depth(&mut self, at: VirtualTime, depth: usize) {
        self.lb_request_queue_depth.push(Sample {
            at,
            value: depth as f64,
        });
    }

    pub fn record_lb_response_queue_depth(&mut self, at: VirtualTime, depth: usize) {
        self.lb_response_queue_depth.push(Sample {
            at,
            value: depth as f64,
        });
    }

    pub fn record_dns_queue_depth(&mut self, at: VirtualTime, depth: usize) {
        self.dns_queue_depth.push(Sample {
            at,
            value: depth as f64,
        });
    }

    /// Records a completed request's latency and advances the cumulative
    /// completion counter. Every completed request produces exactly one
    /// latency sample, so the two stay in lockstep.
    pub fn record_client_latency(&mut self, at: VirtualTime, latency: f64) {
        self.client_latency.push(Sample { at, value: latency });
        self.completed_requests += 1;
        self.completions_series.push(Sample {
            at,
            value: self.completed_requests as f64,
        });
    }

    pub fn record_server_drop(&mut self, server: &Address, at: VirtualTime) {
        let count = self.server_drops.entry(server.clone()).or_insert(0);
        *count += 1;
        self.server_drops_series
            .entry(server.clone())
            .or_default()
            .push(Sample {
                at,
                value: *count as f64,
            });
    }

    pub fn record_lb_request_drop(&mut self, at: VirtualTime) {
        self.lb_request_drops += 1;
        self.lb_request_drops_series.push(Sample {
            at,
            value: self.lb_request_drops as f64,
        });
    }

    pub fn record_lb_response_drop(&mut self, at: VirtualTime) {
        self.lb_response_drops += 1;
        self.lb_response_drops_series.push(Sample {
            at,
            value: self.lb_response_drops as f64,
        });
    }

    pub fn record_dns_drop(&mut self, at: VirtualTime) {
        self.dns_drops += 1;
        self.dns_drops_series.push(Sample {
            at,
            value: self.dns_drops as f64,
        });
    }

    pub fn client_born(&mut self, at: VirtualTime) {
        self.concurrent_clients += 1;
        self.concurrent_clients_series.push(Sample {
            at,
            value: self.concurrent_clients as f64,
        });
    }

    pub fn client_terminated(&mut self, at: VirtualTime) {
        self.concurrent_clients -= 1;
        self.concurrent_clients_series.push(Sample {
            at,
            value: self.concurrent_clients as f64,
        });
    }

    pub fn client_latency_series(&self) -> &[Sample] {
        &self.client_latency
    }

    pub fn server_queue_depth_series(&self) -> &HashMap<Address, Vec<Sample>> {
        &self.server_queue_depth
    }

    pub fn server_drops_series(&self) -> &HashMap<Address, Vec<Sample>> {
        &self.server_drops_series
    }

    pub fn lb_request_queue_depth_series(&self) -> &[Sample] {
        &self.lb_request_queue_depth
    }

    pub fn lb_response_queue_depth_series(&self) -> &[Sample] {
        &self.lb_response_queue_depth
    }

    pub fn lb_request_drops_series(&self) -> &[Sample] {
        &self.lb_request_drops_series
    }

    pub fn lb_response_drops_series(&self) -> &[Sample] {
        &self.lb_response_drops_series
    }

    pub fn dns_queue_depth_series(&self) -> &[Sample] {
        &self.dns_queue_depth
    }

    pub fn dns_drops_series(&self) -> &[Sample] {
        &self.dns_drops_series
    }

    pub fn completions_series(&self) -> &[Sample] {
        &self.completions_series
    }

    pub fn concurrent_clients_series(&self) -> &[Sample] {
        &self.concurrent_clients_series
    }

    /// Mean of each server's mean queue depth, then averaged across servers.
    /// Each server contributes equally regardless of how many samples it
    /// produced, matching the per-server-then-pool reduction the reference
    /// statistics module used.
    ///
    /// Servers are summed in address order rather than `HashMap` iteration
    /// order: the latter varies run-to-run even for an identical seed/config,
    /// which would make this reduction differ in its last ULP and break
    /// byte-for-byte determinism.
    pub fn avg_server_queue_length(&self) -> f64 {
        if self.server_queue_depth.is_empty() {
            return 0.0;
        }
        let mut servers: Vec<&Address> = self.server_queue_depth.keys().collect();
        servers.sort();
        let total: f64 = servers
            .into_iter()
            .map(|addr| mean(&self.server_queue_depth[addr]))
            .sum();
        total / self.server_queue_depth.len() as f64
    }

    pub fn avg_client_latency(&self) -> f64 {
        mean(&self.client_latency)
    }

    /// Mean utilization across servers, each computed from its own busy-time
    /// fraction (supplied by the caller, since `Metrics` does not track
    /// server lifetimes itself).
    pub fn avg_server_utilization(&self, utilizations: &[f64]) -> f64 {
        if utilizations.is_empty() {
            return 0.0;
        }
        utilizations.iter().sum::<f64>() / utilizations.len() as f64
    }

    pub fn total_dropped(&self) -> u64 {
        let server_drops: u64 = self.server_drops.values().sum();
        server_drops + self.lb_request_drops + self.lb_response_drops + self.dns_drops
    }
}

fn mean(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.value).sum::<f64>() / samples.len() as f64
}
