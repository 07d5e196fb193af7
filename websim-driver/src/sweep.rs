//! The parameter-sweep matrix: one [`SimConfig`] per combination of
//! (client count, strategy, LB topology, service-time tier, cache-time
//! tier), run in the same nested order as the reference driver's loop so
//! that the output row order is itself reproducible, not just the values.

use serde::{Deserialize, Serialize};

use websim_core::address::EntityKind;
use websim_core::config::{LbTopology, SimConfig, TransportDelay};
use websim_core::distributions::Distribution;
use websim_core::error::SimResult;
use websim_core::strategy::StrategyKind;
use websim_core::World;

/// Coarse tier for the backend service-time mean, matching the reference
/// driver's `service_time in ['high', 'low']` sweep axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTimeTier {
    High,
    Low,
}

impl ServiceTimeTier {
    pub fn mean(self) -> f64 {
        match self {
            ServiceTimeTier::High => 1.2,
            ServiceTimeTier::Low => 0.6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTimeTier::High => "high",
            ServiceTimeTier::Low => "low",
        }
    }
}

/// Coarse tier for the DNS cache invalidation window, matching the
/// reference driver's `cache_time in ['high', 'low']` sweep axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTimeTier {
    High,
    Low,
}

impl CacheTimeTier {
    pub fn window(self) -> f64 {
        match self {
            CacheTimeTier::High => 500.0,
            CacheTimeTier::Low => 200.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheTimeTier::High => "high",
            CacheTimeTier::Low => "low",
        }
    }
}

/// The full matrix plus every parameter that is held fixed across a sweep.
///
/// A single run can still be driven by overriding `client_counts` etc. with
/// a single-element list from the CLI; the matrix machinery doesn't care
/// how many combinations it's given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub client_counts: Vec<u64>,
    pub strategies: Vec<StrategyKind>,
    pub topologies: Vec<LbTopology>,
    pub service_time_tiers: Vec<ServiceTimeTier>,
    pub cache_time_tiers: Vec<CacheTimeTier>,

    pub seed: u64,
    pub horizon_seconds: f64,
    pub arrival_interval_mean: f64,
    pub termination_probability: f64,
    pub client_think_time: Vec<Distribution>,

    pub server_count: usize,
    pub server_buffer_size: usize,
    pub dns_buffer_size: usize,
    pub dns_service_time_mean: f64,
    pub lb_buffer_size: usize,
    pub lb_base_processing_mean: f64,

    pub transport_delays: Vec<TransportDelay>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            client_counts: vec![350, 400, 450, 500, 550, 600],
            strategies: vec![
                StrategyKind::RoundRobin,
                StrategyKind::LeastConnections,
                StrategyKind::Random,
            ],
            topologies: vec![LbTopology::Gateway, LbTopology::DnsLb],
            service_time_tiers: vec![ServiceTimeTier::High, ServiceTimeTier::Low],
            cache_time_tiers: vec![CacheTimeTier::High, CacheTimeTier::Low],

            seed: 42,
            horizon_seconds: 1_000.0,
            arrival_interval_mean: 2.0,
            termination_probability: 0.01,
            client_think_time: vec![
                Distribution::Normal {
                    mean: 5.0,
                    std_dev: 1.5,
                },
                Distribution::Exponential { mean: 4.0 },
                Distribution::Uniform {
                    low: 1.0,
                    high: 8.0,
                },
                Distribution::Gamma {
                    shape: 2.0,
                    scale: 2.0,
                },
                Distribution::ChiSquared {
                    degrees_of_freedom: 4.0,
                },
                Distribution::Burst { value: 0.1 },
            ],

            server_count: 5,
            server_buffer_size: 10,
            dns_buffer_size: 20,
            dns_service_time_mean: 0.01,
            lb_buffer_size: 20,
            lb_base_processing_mean: 0.01,

            transport_delays: default_transport_delays(),
        }
    }
}

fn default_transport_delays() -> Vec<TransportDelay> {
    use EntityKind::*;
    [
        (Client, Dns, 0.005),
        (Dns, Client, 0.005),
        (Client, LoadBalancer, 0.005),
        (LoadBalancer, Client, 0.005),
        (Client, Server, 0.005),
        (Server, Client, 0.005),
        (LoadBalancer, Server, 0.005),
        (Server, LoadBalancer, 0.005),
    ]
    .into_iter()
    .map(|(src, dst, seconds)| TransportDelay { src, dst, seconds })
    .collect()
}

/// One point in the Cartesian product, carrying the axis labels the CSV
/// row needs alongside the built [`SimConfig`].
#[derive(Debug, Clone)]
pub struct RunParams {
    pub num_clients: u64,
    pub strategy: StrategyKind,
    pub topology: LbTopology,
    pub service_time_tier: ServiceTimeTier,
    pub cache_time_tier: CacheTimeTier,
}

/// The four reductions the reference driver appends per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub server_utilization: f64,
    pub client_latency: f64,
    pub server_queue_length: f64,
    pub dropped_requests: u64,
}

/// Builds the Cartesian product in `num_clients -> strategy -> topology ->
/// service_time -> cache_time` nesting order, matching `main.py`'s loop
/// nesting so two sweeps with the same config produce rows in the same
/// order.
pub fn matrix(cfg: &SweepConfig) -> Vec<RunParams> {
    let mut out = Vec::new();
    for &num_clients in &cfg.client_counts {
        for &strategy in &cfg.strategies {
            for &topology in &cfg.topologies {
                for &service_time_tier in &cfg.service_time_tiers {
                    for &cache_time_tier in &cfg.cache_time_tiers {
                        out.push(RunParams {
                            num_clients,
                            strategy,
                            topology,
                            service_time_tier,
                            cache_time_tier,
                        });
                    }
                }
            }
        }
    }
    out
}

/// The per-strategy processing-delay mean added into request handling
/// wherever that strategy runs its selection (spec: "RR ~ 0, LC ~ 40ms
/// mean"). Random falls between the two, since it does no bookkeeping but
/// still draws from the RNG.
fn strategy_processing_time(strategy: StrategyKind) -> Distribution {
    match strategy {
        StrategyKind::RoundRobin => Distribution::Exponential { mean: 0.001 },
        StrategyKind::LeastConnections => Distribution::Exponential { mean: 0.040 },
        StrategyKind::Random => Distribution::Exponential { mean: 0.002 },
    }
}

/// Renders one matrix point into a concrete, standalone [`SimConfig`].
pub fn build_sim_config(cfg: &SweepConfig, params: &RunParams) -> SimConfig {
    let server_addresses = (0..cfg.server_count)
        .map(|i| format!("192.168.1.{}", i + 1))
        .collect();

    SimConfig {
        horizon_seconds: cfg.horizon_seconds,
        seed: cfg.seed,
        number_of_clients: params.num_clients,
        arrival_interval_mean: cfg.arrival_interval_mean,
        termination_probability: cfg.termination_probability,
        cache_validity_window: params.cache_time_tier.window(),
        client_think_time: cfg.client_think_time.clone(),
        dns_buffer_size: cfg.dns_buffer_size,
        dns_service_time: Distribution::Exponential {
            mean: cfg.dns_service_time_mean,
        },
        lb_topology: params.topology,
        lb_request_buffer_size: cfg.lb_buffer_size,
        lb_response_buffer_size: cfg.lb_buffer_size,
        lb_base_processing_time: Distribution::Exponential {
            mean: cfg.lb_base_processing_mean,
        },
        strategy: params.strategy,
        strategy_processing_time: strategy_processing_time(params.strategy),
        server_addresses,
        server_buffer_size: cfg.server_buffer_size,
        server_service_time: Distribution::Exponential {
            mean: params.service_time_tier.mean(),
        },
        transport_delays: cfg.transport_delays.clone(),
    }
}

/// Builds and drives a fresh [`World`] for one matrix point, seeded
/// independently from the sweep's configured seed so any single
/// combination can be replayed in isolation and still reproduce
/// byte-for-byte.
pub fn run_one(config: &SimConfig) -> SimResult<(RunSummary, World)> {
    let mut world = World::new(config)?;
    world.run()?;

    let utilizations = world.server_utilizations();
    let metrics = world.metrics();
    let summary = RunSummary {
        server_utilization: metrics.avg_server_utilization(&utilizations),
        client_latency: metrics.avg_client_latency(),
        server_queue_length: metrics.avg_server_queue_length(),
        dropped_requests: metrics.total_dropped(),
    };
    Ok((summary, world))
}
