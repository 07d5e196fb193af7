//! Property tests for the two laws in `spec.md` §8 that are naturally
//! quantified over arbitrary input: a bounded queue never exceeds its
//! capacity, and dispatched event times never decrease.

use proptest::prelude::*;
use websim_core::queue::BoundedQueue;
use websim_core::scheduler::{Action, Scheduler};
use websim_core::address::Address;
use websim_core::message::{DropReason, Message};
use websim_core::time::VirtualTime;

#[derive(Debug, Clone, Copy)]
enum QueueOp {
    Push,
    Pop,
}

fn queue_op_strategy() -> impl Strategy<Value = QueueOp> {
    prop_oneof![Just(QueueOp::Push), Just(QueueOp::Pop)]
}

proptest! {
    /// For every queue capacity and arbitrary sequence of push/pop
    /// operations, `0 <= len(Q) <= capacity` holds after every operation.
    #[test]
    fn bounded_queue_never_exceeds_capacity(
        capacity in 0usize..8,
        ops in prop::collection::vec(queue_op_strategy(), 0..200),
    ) {
        let mut queue: BoundedQueue<u32> = BoundedQueue::new(capacity);
        let mut next_value = 0u32;

        for op in ops {
            match op {
                QueueOp::Push => {
                    let _ = queue.try_push(next_value);
                    next_value += 1;
                }
                QueueOp::Pop => {
                    queue.pop_front();
                }
            }
            prop_assert!(queue.len() <= queue.capacity());
        }
    }

    /// For an arbitrary sequence of non-negative delays scheduled from
    /// whatever the scheduler's `now` is at the time, popped event times
    /// never decrease.
    #[test]
    fn scheduler_dispatches_in_non_decreasing_time_order(
        deltas in prop::collection::vec(0.0f64..100.0, 1..200),
    ) {
        let mut scheduler = Scheduler::new();
        for dt in &deltas {
            scheduler
                .schedule_after(*dt, deliver_to("x"))
                .expect("non-negative delay is always accepted");
        }

        let mut last = VirtualTime::ZERO;
        while let Some((time, _action)) = scheduler.pop_ready(VirtualTime::new(1_000_000.0)) {
            prop_assert!(time >= last);
            last = time;
        }
    }
}

fn deliver_to(addr: &str) -> Action {
    Action::Deliver {
        from: Address::new("origin"),
        to: Address::new(addr),
        message: Message::DropServer {
            client_id: 0,
            reason: DropReason::ServerQueueFull,
            timestamp: VirtualTime::ZERO,
        },
    }
}
