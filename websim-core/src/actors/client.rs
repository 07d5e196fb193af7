use rand::Rng;

use crate::actors::Actor;
use crate::address::Address;
use crate::distributions::{choose_uniformly, Distribution};
use crate::error::SimResult;
use crate::message::Message;
use crate::scheduler::Timer;
use crate::time::VirtualTime;
use crate::world::Context;

/// Where a client is in its think → resolve → request → think cycle.
///
/// A client waits for exactly one event while in `AwaitingDns` or
/// `AwaitingResponse`; any other message arriving in that phase (or any
/// message at all once the client has terminated) is simply ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Thinking,
    AwaitingDns,
    AwaitingResponse,
    Terminated,
}

/// A simulated client cycling through: decide whether to keep going, resolve
/// a target address (cached or via DNS), send a request, wait for the
/// response, think for a while, repeat.
#[derive(Debug)]
pub struct ClientActor {
    address: Address,
    client_id: u64,
    dns_address: Address,
    phase: Phase,
    cached: Option<(Address, VirtualTime)>,
    cache_validity_window: f64,
    think_time_set: Vec<Distribution>,
    termination_probability: f64,
    cycle_start: VirtualTime,
}

impl ClientActor {
    pub fn new(
        address: Address,
        client_id: u64,
        dns_address: Address,
        think_time_set: Vec<Distribution>,
        termination_probability: f64,
        cache_validity_window: f64,
    ) -> Self {
        Self {
            address,
            client_id,
            dns_address,
            phase: Phase::Thinking,
            cached: None,
            cache_validity_window,
            think_time_set,
            termination_probability,
            cycle_start: VirtualTime::ZERO,
        }
    }

    /// Begins a cycle: with `termination_probability` the client retires for
    /// good; otherwise it resolves a target (from cache if still valid, via
    /// DNS otherwise) and moves on to issuing a request.
    pub fn start_cycle(&mut self, ctx: &mut Context) -> SimResult<()> {
        if ctx.rng().gen_bool(self.termination_probability) {
            self.phase = Phase::Terminated;
            ctx.metrics().client_terminated(ctx.now());
            return Ok(());
        }

        self.cycle_start = ctx.now();

        if let Some((resolved, cached_at)) = self.cached.clone() {
            if ctx.now() - cached_at < self.cache_validity_window {
                return self.issue_request(ctx, resolved);
            }
        }

        self.phase = Phase::AwaitingDns;
        ctx.send(
            self.address.clone(),
            self.dns_address.clone(),
            Message::DnsRequest {
                client_id: self.client_id,
                client_ip: self.address.clone(),
                start_timestamp: self.cycle_start,
            },
        )
    }

    fn issue_request(&mut self, ctx: &mut Context, resolved: Address) -> SimResult<()> {
        self.phase = Phase::AwaitingResponse;
        ctx.send(
            self.address.clone(),
            resolved,
            Message::Request {
                client_id: self.client_id,
                client_ip: self.address.clone(),
                start_timestamp: self.cycle_start,
                through_lb: false,
            },
        )
    }

    fn end_cycle(&mut self, ctx: &mut Context, latency: Option<f64>) -> SimResult<()> {
        if let Some(latency) = latency {
            ctx.metrics().record_client_latency(ctx.now(), latency);
        }
        self.phase = Phase::Thinking;
        let think_time = choose_uniformly(&self.think_time_set, ctx.rng()).sample(ctx.rng());
        ctx.schedule_wake(self.address.clone(), think_time, Timer::ClientBackoffDone)
    }
}

impl Actor for ClientActor {
    fn on_message(&mut self, ctx: &mut Context, _from: Address, message: Message) -> SimResult<()> {
        match (self.phase, message) {
            (Phase::AwaitingDns, Message::DnsResponse { resolved, .. }) => {
                self.cached = Some((resolved.clone(), ctx.now()));
                self.issue_request(ctx, resolved)
            }
            (Phase::AwaitingDns, Message::DropDns { .. }) => self.end_cycle(ctx, None),
            (Phase::AwaitingResponse, Message::Response { .. }) => {
                let latency = ctx.now() - self.cycle_start;
                self.end_cycle(ctx, Some(latency))
            }
            (Phase::AwaitingResponse, Message::DropServer { .. }) => self.end_cycle(ctx, None),
            (Phase::AwaitingResponse, Message::DropDns { .. }) => self.end_cycle(ctx, None),
            _ => Ok(()),
        }
    }

    fn on_wake(&mut self, ctx: &mut Context, timer: Timer) -> SimResult<()> {
        if timer != Timer::ClientBackoffDone || self.phase == Phase::Terminated {
            return Ok(());
        }
        self.start_cycle(ctx)
    }
}
