mod client;
mod dns;
mod lb;
mod server;

pub use client::ClientActor;
pub use dns::DnsActor;
pub use lb::LoadBalancerActor;
pub use server::ServerActor;

use crate::address::Address;
use crate::error::SimResult;
use crate::scheduler::Timer;
use crate::world::Context;

/// Common behavior every simulated entity implements.
///
/// Actors never reach for the network or scheduler directly; every effect
/// goes through the [`Context`] handed to them, keeping the actor itself a
/// plain state machine that the world drives.
pub trait Actor: std::fmt::Debug {
    fn on_message(&mut self, ctx: &mut Context, from: Address, message: crate::message::Message) -> SimResult<()>;

    fn on_wake(&mut self, ctx: &mut Context, timer: Timer) -> SimResult<()>;

    /// Current queue occupancy, consulted by the least-connections strategy.
    /// Non-server actors never get asked, so the default is never exercised.
    fn queue_depth(&self) -> usize {
        0
    }

    /// Busy-time fraction since this actor started, for server actors only.
    fn utilization(&self, _now: crate::time::VirtualTime) -> Option<f64> {
        None
    }
}
