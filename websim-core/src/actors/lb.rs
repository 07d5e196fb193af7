use tracing::warn;

use crate::actors::Actor;
use crate::address::Address;
use crate::distributions::Distribution;
use crate::error::SimResult;
use crate::message::{DropReason, Message};
use crate::queue::BoundedQueue;
use crate::scheduler::Timer;
use crate::strategy::Strategy;
use crate::time::VirtualTime;
use crate::world::Context;

struct PendingRequest {
    client_id: u64,
    client_ip: Address,
    start_timestamp: VirtualTime,
}

struct PendingResponse {
    client_id: u64,
    server_ip: Address,
    client_ip: Address,
    timestamp: VirtualTime,
}

/// The gateway load balancer: two independent worker loops, one forwarding
/// client requests to a strategy-selected backend and one forwarding
/// backend responses back to the originating client.
///
/// Each direction has its own bounded queue and its own busy flag, so a
/// burst of responses never blocks new requests from being accepted (or
/// vice versa).
pub struct LoadBalancerActor {
    address: Address,
    request_queue: BoundedQueue<PendingRequest>,
    response_queue: BoundedQueue<PendingResponse>,
    request_in_service: Option<PendingRequest>,
    response_in_service: Option<PendingResponse>,
    base_processing_time: Distribution,
    strategy_processing_time: Distribution,
    strategy: Box<dyn Strategy>,
}

impl std::fmt::Debug for LoadBalancerActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancerActor")
            .field("address", &self.address)
            .field("strategy", &self.strategy.kind())
            .finish()
    }
}

impl LoadBalancerActor {
    pub fn new(
        address: Address,
        request_capacity: usize,
        response_capacity: usize,
        base_processing_time: Distribution,
        strategy_processing_time: Distribution,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        Self {
            address,
            request_queue: BoundedQueue::new(request_capacity),
            response_queue: BoundedQueue::new(response_capacity),
            request_in_service: None,
            response_in_service: None,
            base_processing_time,
            strategy_processing_time,
            strategy,
        }
    }

    fn try_start_request(&mut self, ctx: &mut Context) -> SimResult<()> {
        if self.request_in_service.is_some() {
            return Ok(());
        }
        let Some(item) = self.request_queue.pop_front() else {
            return Ok(());
        };
        ctx.metrics()
            .record_lb_request_queue_depth(ctx.now(), self.request_queue.len());

        let processing_time =
            ctx.sample(&self.strategy_processing_time) + ctx.sample(&self.base_processing_time);
        self.request_in_service = Some(item);
        ctx.schedule_wake(
            self.address.clone(),
            processing_time,
            Timer::LoadBalancerRequestDone,
        )?;
        Ok(())
    }

    fn try_start_response(&mut self, ctx: &mut Context) -> SimResult<()> {
        if self.response_in_service.is_some() {
            return Ok(());
        }
        let Some(item) = self.response_queue.pop_front() else {
            return Ok(());
        };
        ctx.metrics()
            .record_lb_response_queue_depth(ctx.now(), self.response_queue.len());

        let processing_time = ctx.sample(&self.base_processing_time);
        self.response_in_service = Some(item);
        ctx.schedule_wake(
            self.address.clone(),
            processing_time,
            Timer::LoadBalancerResponseDone,
        )?;
        Ok(())
    }
}

impl Actor for LoadBalancerActor {
    fn on_message(&mut self, ctx: &mut Context, _from: Address, message: Message) -> SimResult<()> {
        match message {
            Message::Request {
                client_id,
                client_ip,
                start_timestamp,
                ..
            } => {
                let item = PendingRequest {
                    client_id,
                    client_ip,
                    start_timestamp,
                };
                match self.request_queue.try_push(item) {
                    Ok(()) => {
                        ctx.metrics().record_lb_request_queue_depth(
                            ctx.now(),
                            self.request_queue.len(),
                        );
                        self.try_start_request(ctx)?;
                    }
                    Err(item) => {
                        let now = ctx.now();
                        warn!(lb = %self.address, client = %item.client_ip, "request queue full, dropping");
                        ctx.metrics().record_lb_request_drop(now);
                        ctx.send(
                            self.address.clone(),
                            item.client_ip,
                            Message::DropServer {
                                client_id: item.client_id,
                                reason: DropReason::LoadBalancerRequestQueueFull,
                                timestamp: ctx.now(),
                            },
                        )?;
                    }
                }
            }
            Message::Response {
                client_id,
                server_ip,
                client_ip,
                timestamp,
            } => {
                let item = PendingResponse {
                    client_id,
                    server_ip,
                    client_ip,
                    timestamp,
                };
                match self.response_queue.try_push(item) {
                    Ok(()) => {
                        ctx.metrics().record_lb_response_queue_depth(
                            ctx.now(),
                            self.response_queue.len(),
                        );
                        self.try_start_response(ctx)?;
                    }
                    Err(item) => {
                        let now = ctx.now();
                        warn!(lb = %self.address, client = %item.client_ip, "response queue full, dropping");
                        ctx.metrics().record_lb_response_drop(now);
                        ctx.send(
                            self.address.clone(),
                            item.client_ip,
                            Message::DropServer {
                                client_id: item.client_id,
                                reason: DropReason::LoadBalancerResponseQueueFull,
                                timestamp: ctx.now(),
                            },
                        )?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_wake(&mut self, ctx: &mut Context, timer: Timer) -> SimResult<()> {
        match timer {
            Timer::LoadBalancerRequestDone => {
                if let Some(item) = self.request_in_service.take() {
                    let server = ctx.select_server(self.strategy.as_mut())?;
                    ctx.send(
                        self.address.clone(),
                        server,
                        Message::Request {
                            client_id: item.client_id,
                            client_ip: item.client_ip,
                            start_timestamp: item.start_timestamp,
                            through_lb: true,
                        },
                    )?;
                }
                self.try_start_request(ctx)?;
            }
            Timer::LoadBalancerResponseDone => {
                if let Some(item) = self.response_in_service.take() {
                    ctx.send(
                        self.address.clone(),
                        item.client_ip.clone(),
                        Message::Response {
                            client_id: item.client_id,
                            server_ip: item.server_ip,
                            client_ip: item.client_ip,
                            timestamp: item.timestamp,
                        },
                    )?;
                }
                self.try_start_response(ctx)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn queue_depth(&self) -> usize {
        self.request_queue.len() + self.response_queue.len()
    }
}
