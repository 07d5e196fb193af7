use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::actors::{Actor, ClientActor, DnsActor, LoadBalancerActor, ServerActor};
use crate::address::{Address, EntityKind};
use crate::config::{LbTopology, SimConfig};
use crate::distributions::Distribution;
use crate::error::{SimError, SimResult};
use crate::metrics::Metrics;
use crate::network::Fabric;
use crate::scheduler::{Action, Scheduler, Timer};
use crate::strategy::Strategy;
use crate::time::VirtualTime;

pub const DNS_ADDRESS: &str = "dns.internal";
pub const GATEWAY_ADDRESS: &str = "gateway.internal";

/// Everything an actor needs to produce effects: send a message, arm a
/// timer, touch the metrics registry, draw randomness, or ask for another
/// actor's queue depth.
///
/// Built fresh by [`World::dispatch`] for the duration of a single
/// `on_message`/`on_wake` call; actors never hold one past that call.
pub struct Context<'a> {
    scheduler: &'a mut Scheduler,
    fabric: &'a Fabric,
    metrics: &'a mut Metrics,
    actors: &'a HashMap<Address, Box<dyn Actor>>,
    rng: &'a mut StdRng,
}

impl<'a> Context<'a> {
    pub fn now(&self) -> VirtualTime {
        self.scheduler.now()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    pub fn metrics(&mut self) -> &mut Metrics {
        self.metrics
    }

    pub fn queue_depth_of(&self, addr: &Address) -> usize {
        self.actors.get(addr).map(|a| a.queue_depth()).unwrap_or(0)
    }

    pub fn sample(&mut self, dist: &Distribution) -> f64 {
        dist.sample(self.rng)
    }

    /// Sends `message` from `from` to `to`, resolving the transport delay
    /// from the fabric's (source kind, destination kind) table.
    pub fn send(&mut self, from: Address, to: Address, message: crate::message::Message) -> SimResult<()> {
        let src_kind = self
            .fabric
            .kind_of(&from)
            .ok_or_else(|| SimError::UnregisteredAddress(from.clone()))?;
        let dst_kind = self
            .fabric
            .kind_of(&to)
            .ok_or_else(|| SimError::UnregisteredAddress(to.clone()))?;
        let delay = self.fabric.delay(src_kind, dst_kind);
        trace!(%from, %to, delay, "sending message");
        self.scheduler
            .schedule_after(delay, Action::Deliver { from, to, message })?;
        Ok(())
    }

    pub fn schedule_wake(&mut self, addr: Address, dt: f64, timer: Timer) -> SimResult<()> {
        self.scheduler
            .schedule_after(dt, Action::Wake { addr, timer })?;
        Ok(())
    }

    pub fn select_server(&mut self, strategy: &mut dyn Strategy) -> SimResult<Address> {
        strategy.select(self.actors, self.rng)
    }
}

/// Owns the scheduler, the fabric, every actor, and the metrics registry for
/// a single simulation run. One `World` is built and driven per sweep
/// combination; there is no reuse across runs.
pub struct World {
    scheduler: Scheduler,
    fabric: Fabric,
    metrics: Metrics,
    actors: HashMap<Address, Box<dyn Actor>>,
    server_addresses: Vec<Address>,
    rng: StdRng,
    horizon: VirtualTime,

    dns_address: Address,
    arrival_interval_mean: f64,
    remaining_clients: u64,
    next_client_index: u64,
    client_think_time: Vec<Distribution>,
    termination_probability: f64,
    cache_validity_window: f64,
}

impl World {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;

        let mut fabric = Fabric::new();
        for delay in &config.transport_delays {
            fabric.set_delay(delay.src, delay.dst, delay.seconds);
        }

        let dns_address = Address::new(DNS_ADDRESS);
        fabric.register(dns_address.clone(), EntityKind::Dns);

        let mut actors: HashMap<Address, Box<dyn Actor>> = HashMap::new();

        let mut server_addrs = Vec::new();
        for raw in &config.server_addresses {
            let addr = Address::new(raw.clone());
            fabric.register(addr.clone(), EntityKind::Server);
            actors.insert(
                addr.clone(),
                Box::new(ServerActor::new(
                    addr.clone(),
                    config.server_buffer_size,
                    config.server_service_time,
                )),
            );
            server_addrs.push(addr);
        }

        let mut strategy = config.strategy.build();
        for addr in &server_addrs {
            strategy.register_server(addr.clone());
        }

        match config.lb_topology {
            LbTopology::Gateway => {
                let gateway = Address::new(GATEWAY_ADDRESS);
                fabric.register(gateway.clone(), EntityKind::LoadBalancer);
                actors.insert(
                    gateway.clone(),
                    Box::new(LoadBalancerActor::new(
                        gateway.clone(),
                        config.lb_request_buffer_size,
                        config.lb_response_buffer_size,
                        config.lb_base_processing_time,
                        config.strategy_processing_time,
                        strategy,
                    )),
                );
                actors.insert(
                    dns_address.clone(),
                    Box::new(DnsActor::new(
                        dns_address.clone(),
                        config.dns_buffer_size,
                        config.dns_service_time,
                        DnsTarget::Gateway(gateway),
                    )),
                );
            }
            LbTopology::DnsLb => {
                actors.insert(
                    dns_address.clone(),
                    Box::new(DnsActor::new(
                        dns_address.clone(),
                        config.dns_buffer_size,
                        config.dns_service_time,
                        DnsTarget::Strategy {
                            strategy,
                            processing_time: config.strategy_processing_time,
                        },
                    )),
                );
            }
        }

        Ok(Self {
            scheduler: Scheduler::new(),
            fabric,
            metrics: Metrics::new(),
            actors,
            server_addresses: server_addrs,
            rng: StdRng::seed_from_u64(config.seed),
            horizon: VirtualTime::new(config.horizon_seconds),
            dns_address,
            arrival_interval_mean: config.arrival_interval_mean,
            remaining_clients: config.number_of_clients,
            next_client_index: 0,
            client_think_time: config.client_think_time.clone(),
            termination_probability: config.termination_probability,
            cache_validity_window: config.cache_validity_window,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Utilizations in server-registration order (not `HashMap` iteration
    /// order), so that two runs built from an identical seed/config reduce
    /// them in the same order and reproduce byte-for-byte.
    pub fn server_utilizations(&self) -> Vec<f64> {
        let now = self.scheduler.now();
        self.server_addresses
            .iter()
            .filter_map(|addr| self.actors.get(addr))
            .filter_map(|a| a.utilization(now))
            .collect()
    }

    /// Drives the simulation to completion: pops events until the heap runs
    /// dry or every remaining event lies beyond the configured horizon.
    pub fn run(&mut self) -> SimResult<()> {
        self.arm_next_arrival()?;

        while let Some((time, action)) = self.scheduler.pop_ready(self.horizon) {
            match action {
                Action::Deliver { from, to, message } => self.dispatch_message(time, from, to, message)?,
                Action::Wake { addr, timer } => self.dispatch_wake(time, addr, timer)?,
                Action::SpawnClient { index } => self.spawn_client(time, index)?,
            }
        }
        debug!(horizon = %self.horizon, "simulation run complete");
        Ok(())
    }

    fn dispatch_message(
        &mut self,
        _time: VirtualTime,
        from: Address,
        to: Address,
        message: crate::message::Message,
    ) -> SimResult<()> {
        let mut actor = self
            .actors
            .remove(&to)
            .ok_or_else(|| SimError::UnknownActor(to.clone()))?;
        let mut ctx = Context {
            scheduler: &mut self.scheduler,
            fabric: &self.fabric,
            metrics: &mut self.metrics,
            actors: &self.actors,
            rng: &mut self.rng,
        };
        let result = actor.on_message(&mut ctx, from, message);
        self.actors.insert(to, actor);
        result
    }

    fn dispatch_wake(&mut self, _time: VirtualTime, addr: Address, timer: Timer) -> SimResult<()> {
        let Some(mut actor) = self.actors.remove(&addr) else {
            // A client that has already terminated may still have an
            // in-flight backoff timer racing its own removal; ignore it.
            return Ok(());
        };
        let mut ctx = Context {
            scheduler: &mut self.scheduler,
            fabric: &self.fabric,
            metrics: &mut self.metrics,
            actors: &self.actors,
            rng: &mut self.rng,
        };
        let result = actor.on_wake(&mut ctx, timer);
        self.actors.insert(addr, actor);
        result
    }

    fn arm_next_arrival(&mut self) -> SimResult<()> {
        if self.remaining_clients == 0 {
            return Ok(());
        }
        let dt = Distribution::Exponential {
            mean: self.arrival_interval_mean,
        }
        .sample(&mut self.rng);
        self.scheduler.schedule_after(
            dt,
            Action::SpawnClient {
                index: self.next_client_index,
            },
        )?;
        Ok(())
    }

    fn spawn_client(&mut self, time: VirtualTime, index: u64) -> SimResult<()> {
        self.next_client_index = index + 1;
        self.remaining_clients = self.remaining_clients.saturating_sub(1);

        let addr = Address::new(format!("10.0.0.{}", index + 1));
        self.fabric.register(addr.clone(), EntityKind::Client);
        self.metrics.client_born(time);

        let mut client = ClientActor::new(
            addr.clone(),
            index,
            self.dns_address.clone(),
            self.client_think_time.clone(),
            self.termination_probability,
            self.cache_validity_window,
        );

        let mut ctx = Context {
            scheduler: &mut self.scheduler,
            fabric: &self.fabric,
            metrics: &mut self.metrics,
            actors: &self.actors,
            rng: &mut self.rng,
        };
        client.start_cycle(&mut ctx)?;
        self.actors.insert(addr, Box::new(client));

        self.arm_next_arrival()?;
        Ok(())
    }
}

/// What a DNS resolution hands back to the client: either a fixed gateway
/// address (gateway topology) or a freshly strategy-selected server
/// (dns-lb topology).
pub enum DnsTarget {
    Gateway(Address),
    Strategy {
        strategy: Box<dyn Strategy>,
        processing_time: Distribution,
    },
}

impl std::fmt::Debug for DnsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsTarget::Gateway(addr) => write!(f, "DnsTarget::Gateway({addr})"),
            DnsTarget::Strategy { .. } => write!(f, "DnsTarget::Strategy"),
        }
    }
}
