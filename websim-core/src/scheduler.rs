use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::address::Address;
use crate::error::{SimError, SimResult};
use crate::message::Message;
use crate::time::VirtualTime;

/// A timer kind, re-delivered to the actor that scheduled it once its delay
/// elapses. Shared across actor kinds since each only ever schedules the
/// timers relevant to its own worker loop(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    ServerServiceDone,
    LoadBalancerRequestDone,
    LoadBalancerResponseDone,
    DnsServiceDone,
    ClientBackoffDone,
}

/// The side effect a scheduled event carries out when it fires.
#[derive(Debug, Clone)]
pub enum Action {
    /// Deliver `message` to the actor at `to`, as if sent by `from`.
    Deliver {
        from: Address,
        to: Address,
        message: Message,
    },
    /// Wake the actor at `addr` with the given timer.
    Wake { addr: Address, timer: Timer },
    /// Spawn the next client in the arrival process.
    SpawnClient { index: u64 },
}

#[derive(Debug)]
struct ScheduledEvent {
    time: VirtualTime,
    seq: u64,
    action: Action,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

/// A min-heap of (time, action) events, ordered by virtual time and then by
/// insertion order so equal-time events resolve deterministically as FIFO.
pub struct Scheduler {
    now: VirtualTime,
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            now: VirtualTime::ZERO,
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Schedules `action` to fire `dt` seconds from the current time.
    pub fn schedule_after(&mut self, dt: f64, action: Action) -> SimResult<VirtualTime> {
        if dt < 0.0 {
            return Err(SimError::NegativeDelay { dt });
        }
        let time = self.now.advance(dt);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, action }));
        Ok(time)
    }

    /// Pops the next event whose time is `<= horizon`, advancing `now` to
    /// its time. Returns `None` once the heap is empty or every remaining
    /// event lies beyond the horizon.
    pub fn pop_ready(&mut self, horizon: VirtualTime) -> Option<(VirtualTime, Action)> {
        let Reverse(next) = self.heap.peek()?;
        if next.time > horizon {
            return None;
        }
        let Reverse(event) = self.heap.pop().expect("just peeked");
        self.now = event.time;
        Some((event.time, event.action))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver(to: &str) -> Action {
        Action::Deliver {
            from: Address::new("a"),
            to: Address::new(to),
            message: Message::DropServer {
                client_id: 0,
                reason: crate::message::DropReason::ServerQueueFull,
                timestamp: VirtualTime::ZERO,
            },
        }
    }

    #[test]
    fn pops_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule_after(5.0, deliver("late")).unwrap();
        sched.schedule_after(1.0, deliver("early")).unwrap();

        let (_, first) = sched.pop_ready(VirtualTime::new(100.0)).unwrap();
        assert!(matches!(first, Action::Deliver { to, .. } if to.as_str() == "early"));
        let (_, second) = sched.pop_ready(VirtualTime::new(100.0)).unwrap();
        assert!(matches!(second, Action::Deliver { to, .. } if to.as_str() == "late"));
    }

    #[test]
    fn ties_resolve_fifo() {
        let mut sched = Scheduler::new();
        sched.schedule_after(1.0, deliver("first")).unwrap();
        sched.schedule_after(1.0, deliver("second")).unwrap();

        let (_, first) = sched.pop_ready(VirtualTime::new(100.0)).unwrap();
        assert!(matches!(first, Action::Deliver { to, .. } if to.as_str() == "first"));
        let (_, second) = sched.pop_ready(VirtualTime::new(100.0)).unwrap();
        assert!(matches!(second, Action::Deliver { to, .. } if to.as_str() == "second"));
    }

    #[test]
    fn horizon_stops_early() {
        let mut sched = Scheduler::new();
        sched.schedule_after(50.0, deliver("beyond")).unwrap();
        assert!(sched.pop_ready(VirtualTime::new(10.0)).is_none());
    }

    #[test]
    fn negative_delay_rejected() {
        let mut sched = Scheduler::new();
        assert!(matches!(
            sched.schedule_after(-1.0, deliver("x")),
            Err(SimError::NegativeDelay { .. })
        ));
    }
}
