use tracing::warn;

use crate::actors::Actor;
use crate::address::Address;
use crate::distributions::Distribution;
use crate::error::SimResult;
use crate::message::{DropReason, Message};
use crate::queue::BoundedQueue;
use crate::scheduler::Timer;
use crate::time::VirtualTime;
use crate::world::Context;

#[derive(Debug)]
struct InFlight {
    client_id: u64,
    client_ip: Address,
    lb_address: Option<Address>,
}

/// A single backend server: one bounded FIFO queue and one worker that
/// processes requests strictly in arrival order.
///
/// Requests that arrive while the worker is already busy wait in the
/// queue; requests that arrive when the queue is already at capacity are
/// dropped with a [`Message::DropServer`] sent straight back to the client.
#[derive(Debug)]
pub struct ServerActor {
    address: Address,
    queue: BoundedQueue<InFlight>,
    in_service: Option<InFlight>,
    service_time: Distribution,
    busy_time: f64,
    started_at: Option<VirtualTime>,
}

impl ServerActor {
    pub fn new(address: Address, capacity: usize, service_time: Distribution) -> Self {
        Self {
            address,
            queue: BoundedQueue::new(capacity),
            in_service: None,
            service_time,
            busy_time: 0.0,
            started_at: None,
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
            .record_server_queue_depth(&self.address, ctx.now(), self.queue.len());

        let service_time = ctx.sample(&self.service_time);
        self.busy_time += service_time;
        self.in_service = Some(item);
        ctx.schedule_wake(self.address.clone(), service_time, Timer::ServerServiceDone)?;
        Ok(())
    }
}

impl Actor for ServerActor {
    fn on_message(&mut self, ctx: &mut Context, from: Address, message: Message) -> SimResult<()> {
        let Message::Request {
            client_id,
            client_ip,
            through_lb,
            ..
        } = message
        else {
            return Ok(());
        };

        if self.started_at.is_none() {
            self.started_at = Some(ctx.now());
        }

        let lb_address = through_lb.then_some(from);
        let item = InFlight {
            client_id,
            client_ip,
            lb_address,
        };

        match self.queue.try_push(item) {
            Ok(()) => {
                ctx.metrics().record_server_queue_depth(
                    &self.address,
                    ctx.now(),
                    self.queue.len(),
                );
                self.try_start_next(ctx)?;
            }
            Err(item) => {
                let now = ctx.now();
                warn!(server = %self.address, client = %item.client_ip, "request queue full, dropping");
                ctx.metrics().record_server_drop(&self.address, now);
                ctx.send(
                    self.address.clone(),
                    item.client_ip,
                    Message::DropServer {
                        client_id: item.client_id,
                        reason: DropReason::ServerQueueFull,
                        timestamp: ctx.now(),
                    },
                )?;
            }
        }
        Ok(())
    }

    fn on_wake(&mut self, ctx: &mut Context, timer: Timer) -> SimResult<()> {
        if timer != Timer::ServerServiceDone {
            return Ok(());
        }
        let Some(item) = self.in_service.take() else {
            return Ok(());
        };

        let destination = item.lb_address.unwrap_or_else(|| item.client_ip.clone());
        ctx.send(
            self.address.clone(),
            destination,
            Message::Response {
                client_id: item.client_id,
                server_ip: self.address.clone(),
                client_ip: item.client_ip.clone(),
                timestamp: ctx.now(),
            },
        )?;

        self.try_start_next(ctx)?;
        Ok(())
    }

    fn queue_depth(&self) -> usize {
        self.queue.len() + usize::from(self.in_service.is_some())
    }

    fn utilization(&self, now: VirtualTime) -> Option<f64> {
        let started_at = self.started_at?;
        let elapsed = now - started_at;
        if elapsed <= 0.0 {
            return Some(0.0);
        }
        Some((self.busy_time / elapsed).clamp(0.0, 1.0))
    }
}
