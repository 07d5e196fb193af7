use serde::{Deserialize, Serialize};

use crate::address::EntityKind;
use crate::distributions::Distribution;
use crate::strategy::StrategyKind;

/// Where the load balancer sits in the topology, if anywhere.
///
/// `Gateway` puts a dedicated load-balancer actor in front of the server
/// pool, addressed directly by clients after DNS resolution. `DnsLb` skips
/// the dedicated actor and has the DNS server itself pick a backend and
/// hand back its address, so the strategy delay is folded into DNS
/// resolution instead of request forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LbTopology {
    Gateway,
    DnsLb,
}

impl LbTopology {
    /// Matches the `type` column values the reference sweep driver wrote:
    /// `gateway` or `dns`.
    pub fn as_str(self) -> &'static str {
        match self {
            LbTopology::Gateway => "gateway",
            LbTopology::DnsLb => "dns",
        }
    }
}

/// Full configuration for a single simulation run.
///
/// One `SimConfig` corresponds to one row of sweep output; the sweep driver
/// builds a fresh one per combination of (client count, strategy, topology,
/// service-time tier, cache-time tier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Wall-clock horizon of virtual time to simulate, in seconds.
    pub horizon_seconds: f64,
    /// RNG seed; identical seed + config must reproduce identical output.
    pub seed: u64,

    /// Total number of clients that will ever be spawned over the run.
    pub number_of_clients: u64,
    /// Mean of the exponential inter-arrival distribution between client
    /// births.
    pub arrival_interval_mean: f64,
    /// Probability, checked at the start of every cycle, that a client
    /// terminates instead of issuing another request.
    pub termination_probability: f64,
    /// How long a client's cached DNS resolution remains valid.
    pub cache_validity_window: f64,
    /// The set of distributions a client's think-time is drawn from; one is
    /// chosen uniformly at random each cycle.
    pub client_think_time: Vec<Distribution>,

    pub dns_buffer_size: usize,
    pub dns_service_time: Distribution,

    pub lb_topology: LbTopology,
    pub lb_request_buffer_size: usize,
    pub lb_response_buffer_size: usize,
    pub lb_base_processing_time: Distribution,

    pub strategy: StrategyKind,
    pub strategy_processing_time: Distribution,

    pub server_addresses: Vec<String>,
    pub server_buffer_size: usize,
    pub server_service_time: Distribution,

    pub transport_delays: Vec<TransportDelay>,
}

/// One entry of the transport-delay table: the one-way delay from `src` to
/// `dst` kinds. Stored as a flat list (rather than a map keyed by a tuple)
/// so the whole config round-trips through TOML, whose tables require
/// string keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransportDelay {
    pub src: EntityKind,
    pub dst: EntityKind,
    pub seconds: f64,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), crate::error::SimError> {
        use crate::error::SimError;

        if self.server_addresses.is_empty() {
            return Err(SimError::InvalidConfig(
                "at least one server address is required".into(),
            ));
        }
        if self.client_think_time.is_empty() {
            return Err(SimError::InvalidConfig(
                "client think-time distribution set must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.termination_probability) {
            return Err(SimError::InvalidConfig(
                "termination_probability must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
