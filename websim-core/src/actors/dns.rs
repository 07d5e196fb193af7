use tracing::warn;

use crate::actors::Actor;
use crate::address::Address;
use crate::distributions::Distribution;
use crate::error::SimResult;
use crate::message::{DropReason, Message};
use crate::queue::BoundedQueue;
use crate::scheduler::Timer;
use crate::world::{Context, DnsTarget};

struct PendingLookup {
    client_id: u64,
    client_ip: Address,
}

/// The DNS server: a single bounded queue and worker that resolves each
/// lookup to either a fixed gateway address or a freshly strategy-selected
/// backend, depending on the topology it was built for.
///
/// Unlike the process this replaces, overflow here always produces a typed
/// [`Message::DropDns`] back to the client rather than being silently
/// discarded — a silent drop would leave the client waiting on a response
/// that never arrives.
pub struct DnsActor {
    address: Address,
    queue: BoundedQueue<PendingLookup>,
    in_service: Option<PendingLookup>,
    service_time: Distribution,
    target: DnsTarget,
}

impl std::fmt::Debug for DnsActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsActor").field("address", &self.address).finish()
    }
}

impl DnsActor {
    pub fn new(
        address: Address,
        capacity: usize,
        service_time: Distribution,
        target: DnsTarget,
    ) -> Self {
        Self {
            address,
            queue: BoundedQueue::new(capacity),
            in_service: None,
            service_time,
            target,
        }
    }

    fn try_start_next(&mut self, ctx: &mut Context) -> SimResult<()> {
        if self.in_service.is_some() {
            return Ok(());
        }
        let Some(item) = self.queue.pop_front() else {
            return Ok(());
        };
        ctx.metrics()
            .record_dns_queue_depth(ctx.now(), self.queue.len());

        let mut service_time = ctx.sample(&self.service_time);
        if let DnsTarget::Strategy { processing_time, .. } = &self.target {
            service_time += ctx.sample(processing_time);
        }
        self.in_service = Some(item);
        ctx.schedule_wake(self.address.clone(), service_time, Timer::DnsServiceDone)?;
        Ok(())
    }

    fn resolve(&mut self, ctx: &mut Context) -> SimResult<Address> {
        match &mut self.target {
            DnsTarget::Gateway(addr) => Ok(addr.clone()),
            DnsTarget::Strategy { strategy, .. } => ctx.select_server(strategy.as_mut()),
        }
    }
}

impl Actor for DnsActor {
    fn on_message(&mut self, ctx: &mut Context, _from: Address, message: Message) -> SimResult<()> {
        let Message::DnsRequest {
            client_id,
            client_ip,
            ..
        } = message
        else {
            return Ok(());
        };

        let item = PendingLookup { client_id, client_ip };
        match self.queue.try_push(item) {
            Ok(()) => {
                ctx.metrics()
                    .record_dns_queue_depth(ctx.now(), self.queue.len());
                self.try_start_next(ctx)?;
            }
            Err(item) => {
                let now = ctx.now();
                warn!(client = %item.client_ip, "dns queue full, dropping");
                ctx.metrics().record_dns_drop(now);
                ctx.send(
                    self.address.clone(),
                    item.client_ip,
                    Message::DropDns {
                        client_id: item.client_id,
                        reason: DropReason::DnsQueueFull,
                        timestamp: ctx.now(),
                    },
                )?;
            }
        }
        Ok(())
    }

    fn on_wake(&mut self, ctx: &mut Context, timer: Timer) -> SimResult<()> {
        if timer != Timer::DnsServiceDone {
            return Ok(());
        }
        let Some(item) = self.in_service.take() else {
            return Ok(());
        };

        let resolved = self.resolve(ctx)?;
        ctx.send(
            self.address.clone(),
            item.client_ip,
            Message::DnsResponse {
                client_id: item.client_id,
                resolved,
                timestamp: ctx.now(),
            },
        )?;

        self.try_start_next(ctx)?;
        Ok(())
    }

    fn queue_depth(&self) -> usize {
        self.queue.len() + usize::from(self.in_service.is_some())
    }
}
