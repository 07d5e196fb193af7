//! Integration tests for the concrete scenarios in `spec.md` §8, driven
//! through the public `World` API exactly as a caller (the sweep driver)
//! would use it.

use websim_core::address::EntityKind;
use websim_core::config::{LbTopology, SimConfig, TransportDelay};
use websim_core::distributions::Distribution;
use websim_core::strategy::StrategyKind;
use websim_core::World;

fn burst(value: f64) -> Distribution {
    Distribution::Burst { value }
}

fn delay(src: EntityKind, dst: EntityKind, seconds: f64) -> TransportDelay {
    TransportDelay { src, dst, seconds }
}

/// Scenario 1: happy path, gateway + round-robin, 3 servers, 1 client, no
/// drops. Every delay is a fixed `Burst` value, so the single recorded
/// latency can be checked against the exact analytic sum from `spec.md`
/// §8 scenario 1 (DNS path + LB request leg + service + LB response leg).
#[test]
fn happy_path_gateway_round_robin_latency_matches_analytic_sum() {
    use EntityKind::*;

    let client_dns = 0.001;
    let dns_client = 0.001;
    let client_lb = 0.002;
    let lb_server = 0.003;
    let server_lb = 0.003;
    let lb_client = 0.002;

    let dns_service = 0.010;
    let strategy_proc = 0.0; // round-robin: "~0"
    let lb_base_proc = 0.020;
    let server_service = 0.050;

    let config = SimConfig {
        horizon_seconds: 50.0,
        seed: 1,
        number_of_clients: 1,
        arrival_interval_mean: 1.0,
        termination_probability: 0.0,
        cache_validity_window: 1_000.0,
        client_think_time: vec![burst(1_000.0)],
        dns_buffer_size: 4,
        dns_service_time: burst(dns_service),
        lb_topology: LbTopology::Gateway,
        lb_request_buffer_size: 4,
        lb_response_buffer_size: 4,
        lb_base_processing_time: burst(lb_base_proc),
        strategy: StrategyKind::RoundRobin,
        strategy_processing_time: burst(strategy_proc),
        server_addresses: vec!["s1".into(), "s2".into(), "s3".into()],
        server_buffer_size: 4,
        server_service_time: burst(server_service),
        transport_delays: vec![
            delay(Client, Dns, client_dns),
            delay(Dns, Client, dns_client),
            delay(Client, LoadBalancer, client_lb),
            delay(LoadBalancer, Client, lb_client),
            delay(LoadBalancer, Server, lb_server),
            delay(Server, LoadBalancer, server_lb),
        ],
    };

    let mut world = World::new(&config).expect("valid config");
    world.run().expect("run succeeds");

    let metrics = world.metrics();
    let latencies = metrics.client_latency_series();
    assert_eq!(latencies.len(), 1, "exactly one completed request");
    assert_eq!(metrics.total_dropped(), 0);

    let expected = client_dns
        + dns_service
        + dns_client
        + client_lb
        + (strategy_proc + lb_base_proc)
        + lb_server
        + server_service
        + server_lb
        + lb_base_proc
        + lb_client;

    assert!(
        (latencies[0].value - expected).abs() < 1e-9,
        "latency {} did not match analytic sum {expected}",
        latencies[0].value
    );
}

/// Scenario 2: DNS-LB + a single client with a large cache window. Only the
/// first cycle should pay the DNS round trip; every later cycle reuses the
/// cached resolution. A DNS queue-depth sample is recorded once on enqueue
/// and once on dequeue per request (spec.md §9 open question), so exactly
/// two samples means exactly one DNS request was ever issued.
#[test]
fn dns_lb_cache_skips_dns_after_first_cycle() {
    use EntityKind::*;

    let config = SimConfig {
        horizon_seconds: 5.0,
        seed: 7,
        number_of_clients: 1,
        arrival_interval_mean: 0.01,
        termination_probability: 0.0,
        cache_validity_window: 10_000.0,
        client_think_time: vec![burst(0.05)],
        dns_buffer_size: 4,
        dns_service_time: burst(0.01),
        lb_topology: LbTopology::DnsLb,
        lb_request_buffer_size: 4,
        lb_response_buffer_size: 4,
        lb_base_processing_time: burst(0.0),
        strategy: StrategyKind::RoundRobin,
        strategy_processing_time: burst(0.0),
        server_addresses: vec!["s1".into()],
        server_buffer_size: 16,
        server_service_time: burst(0.02),
        transport_delays: vec![
            delay(Client, Dns, 0.001),
            delay(Dns, Client, 0.001),
            delay(Client, Server, 0.001),
            delay(Server, Client, 0.001),
        ],
    };

    let mut world = World::new(&config).expect("valid config");
    world.run().expect("run succeeds");

    let metrics = world.metrics();
    assert!(
        metrics.client_latency_series().len() > 1,
        "expected more than one completed cycle within the horizon"
    );
    assert_eq!(
        metrics.dns_queue_depth_series().len(),
        2,
        "only the first cycle's DNS request should ever touch the queue"
    );
}

/// Scenario 3: a single-slot server queue under a burst of near-simultaneous
/// arrivals produces `drop_server` messages for every arrival beyond the one
/// slot plus the one in service.
#[test]
fn server_overflow_drops_excess_requests() {
    use EntityKind::*;

    let config = SimConfig {
        horizon_seconds: 5.0,
        seed: 3,
        number_of_clients: 20,
        arrival_interval_mean: 0.0002,
        termination_probability: 0.0,
        cache_validity_window: 10_000.0,
        client_think_time: vec![burst(1_000.0)],
        dns_buffer_size: 32,
        dns_service_time: burst(0.0),
        lb_topology: LbTopology::DnsLb,
        lb_request_buffer_size: 32,
        lb_response_buffer_size: 32,
        lb_base_processing_time: burst(0.0),
        strategy: StrategyKind::RoundRobin,
        strategy_processing_time: burst(0.0),
        server_addresses: vec!["only-server".into()],
        server_buffer_size: 1,
        server_service_time: burst(0.1),
        transport_delays: vec![
            delay(Client, Dns, 0.0005),
            delay(Dns, Client, 0.0005),
            delay(Client, Server, 0.0005),
            delay(Server, Client, 0.0005),
        ],
    };

    let mut world = World::new(&config).expect("valid config");
    world.run().expect("run succeeds");

    let metrics = world.metrics();
    assert!(
        metrics.total_dropped() > 0,
        "expected at least one server-queue overflow drop"
    );
}

/// Scenario 4: an LB response queue with zero capacity drops every
/// response; the client never records a latency for that cycle.
#[test]
fn lb_response_queue_zero_capacity_drops_every_response() {
    use EntityKind::*;

    let config = SimConfig {
        horizon_seconds: 5.0,
        seed: 11,
        number_of_clients: 1,
        arrival_interval_mean: 0.01,
        termination_probability: 0.0,
        cache_validity_window: 10_000.0,
        client_think_time: vec![burst(1_000.0)],
        dns_buffer_size: 4,
        dns_service_time: burst(0.001),
        lb_topology: LbTopology::Gateway,
        lb_request_buffer_size: 4,
        lb_response_buffer_size: 0,
        lb_base_processing_time: burst(0.001),
        strategy: StrategyKind::RoundRobin,
        strategy_processing_time: burst(0.0),
        server_addresses: vec!["s1".into()],
        server_buffer_size: 4,
        server_service_time: burst(0.01),
        transport_delays: vec![
            delay(Client, Dns, 0.001),
            delay(Dns, Client, 0.001),
            delay(Client, LoadBalancer, 0.001),
            delay(LoadBalancer, Client, 0.001),
            delay(LoadBalancer, Server, 0.001),
            delay(Server, LoadBalancer, 0.001),
        ],
    };

    let mut world = World::new(&config).expect("valid config");
    world.run().expect("run succeeds");

    let metrics = world.metrics();
    assert!(metrics.client_latency_series().is_empty());
    assert_eq!(metrics.total_dropped(), 1);
}

/// Scenario 6: two runs built from an identical configuration and seed
/// produce identical summary reductions to full precision.
#[test]
fn deterministic_replay_reproduces_summary_exactly() {
    use EntityKind::*;

    let config = SimConfig {
        horizon_seconds: 200.0,
        seed: 99,
        number_of_clients: 40,
        arrival_interval_mean: 0.5,
        termination_probability: 0.02,
        cache_validity_window: 50.0,
        client_think_time: vec![
            Distribution::Exponential { mean: 2.0 },
            Distribution::Normal {
                mean: 3.0,
                std_dev: 1.0,
            },
            burst(0.1),
        ],
        dns_buffer_size: 8,
        dns_service_time: Distribution::Exponential { mean: 0.01 },
        lb_topology: LbTopology::Gateway,
        lb_request_buffer_size: 8,
        lb_response_buffer_size: 8,
        lb_base_processing_time: Distribution::Exponential { mean: 0.01 },
        strategy: StrategyKind::LeastConnections,
        strategy_processing_time: Distribution::Exponential { mean: 0.04 },
        server_addresses: vec!["s1".into(), "s2".into(), "s3".into()],
        server_buffer_size: 4,
        server_service_time: Distribution::Exponential { mean: 0.3 },
        transport_delays: vec![
            delay(Client, Dns, 0.005),
            delay(Dns, Client, 0.005),
            delay(Client, LoadBalancer, 0.005),
            delay(LoadBalancer, Client, 0.005),
            delay(LoadBalancer, Server, 0.005),
            delay(Server, LoadBalancer, 0.005),
        ],
    };

    let mut first = World::new(&config).expect("valid config");
    first.run().expect("run succeeds");
    let first_utilizations = first.server_utilizations();
    let first_metrics = first.metrics();

    let mut second = World::new(&config).expect("valid config");
    second.run().expect("run succeeds");
    let second_utilizations = second.server_utilizations();
    let second_metrics = second.metrics();

    assert_eq!(
        first_metrics.avg_server_utilization(&first_utilizations),
        second_metrics.avg_server_utilization(&second_utilizations)
    );
    assert_eq!(
        first_metrics.avg_client_latency(),
        second_metrics.avg_client_latency()
    );
    assert_eq!(
        first_metrics.avg_server_queue_length(),
        second_metrics.avg_server_queue_length()
    );
    assert_eq!(first_metrics.total_dropped(), second_metrics.total_dropped());
}
