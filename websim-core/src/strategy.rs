use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actors::Actor;
use crate::address::Address;
use crate::error::{SimError, SimResult};

/// Which load-balancing strategy a run is configured with. Kept separate
/// from the `Strategy` trait objects so sweep configuration and CSV output
/// can name a strategy without constructing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoundRobin,
    LeastConnections,
    Random,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::LeastConnections => "least_connections",
            StrategyKind::Random => "random",
        }
    }

    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(RoundRobin::default()),
            StrategyKind::LeastConnections => Box::new(LeastConnections::default()),
            StrategyKind::Random => Box::new(Random::default()),
        }
    }
}

/// Chooses a backend server for a request. Implementations keep their own
/// bookkeeping of the registered server pool; `select` is given read access
/// to the live actor table so least-connections can ask each server for its
/// current queue depth.
pub trait Strategy: std::fmt::Debug {
    fn select(
        &mut self,
        actors: &HashMap<Address, Box<dyn Actor>>,
        rng: &mut StdRng,
    ) -> SimResult<Address>;
    fn register_server(&mut self, addr: Address);
    fn remove_server(&mut self, addr: &Address);
    fn kind(&self) -> StrategyKind;
}

#[derive(Debug, Default)]
pub struct RoundRobin {
    servers: Vec<Address>,
    next: usize,
}

impl Strategy for RoundRobin {
    fn select(
        &mut self,
        _actors: &HashMap<Address, Box<dyn Actor>>,
        _rng: &mut StdRng,
    ) -> SimResult<Address> {
        if self.servers.is_empty() {
            return Err(SimError::EmptyServerPool);
        }
        let addr = self.servers[self.next % self.servers.len()].clone();
        self.next = (self.next + 1) % self.servers.len();
        Ok(addr)
    }

    fn register_server(&mut self, addr: Address) {
        self.servers.push(addr);
    }

    fn remove_server(&mut self, addr: &Address) {
        self.servers.retain(|s| s != addr);
        if !self.servers.is_empty() {
            self.next %= self.servers.len();
        } else {
            self.next = 0;
        }
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::RoundRobin
    }
}

#[derive(Debug, Default)]
pub struct LeastConnections {
    servers: Vec<Address>,
}

impl Strategy for LeastConnections {
    fn select(
        &mut self,
        actors: &HashMap<Address, Box<dyn Actor>>,
        _rng: &mut StdRng,
    ) -> SimResult<Address> {
        if self.servers.is_empty() {
            return Err(SimError::EmptyServerPool);
        }
        let selected = self
            .servers
            .iter()
            .min_by_key(|addr| {
                actors
                    .get(*addr)
                    .map(|actor| actor.queue_depth())
                    .unwrap_or(0)
            })
            .expect("non-empty server list");
        Ok(selected.clone())
    }

    fn register_server(&mut self, addr: Address) {
        self.servers.push(addr);
    }

    fn remove_server(&mut self, addr: &Address) {
        self.servers.retain(|s| s != addr);
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastConnections
    }
}

#[derive(Debug, Default)]
pub struct Random {
    servers: Vec<Address>,
}

impl Strategy for Random {
    fn select(
        &mut self,
        _actors: &HashMap<Address, Box<dyn Actor>>,
        rng: &mut StdRng,
    ) -> SimResult<Address> {
        if self.servers.is_empty() {
            return Err(SimError::EmptyServerPool);
        }
        let idx = rng.gen_range(0..self.servers.len());
        Ok(self.servers[idx].clone())
    }

    fn register_server(&mut self, addr: Address) {
        self.servers.push(addr);
    }

    fn remove_server(&mut self, addr: &Address) {
        self.servers.retain(|s| s != addr);
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_wraps() {
        let mut rr = RoundRobin::default();
        rr.register_server(Address::new("a"));
        rr.register_server(Address::new("b"));
        let actors = HashMap::new();
        let mut rng = rand::SeedableRng::seed_from_u64(0);
        assert_eq!(rr.select(&actors, &mut rng).unwrap().as_str(), "a");
        assert_eq!(rr.select(&actors, &mut rng).unwrap().as_str(), "b");
        assert_eq!(rr.select(&actors, &mut rng).unwrap().as_str(), "a");
    }

    #[test]
    fn empty_pool_errors() {
        let mut rr = RoundRobin::default();
        let actors = HashMap::new();
        let mut rng = rand::SeedableRng::seed_from_u64(0);
        assert!(matches!(
            rr.select(&actors, &mut rng),
            Err(SimError::EmptyServerPool)
        ));
    }

    #[test]
    fn round_robin_single_server_always_returns_it() {
        let mut rr = RoundRobin::default();
        rr.register_server(Address::new("only"));
        let actors = HashMap::new();
        let mut rng = rand::SeedableRng::seed_from_u64(0);
        for _ in 0..5 {
            assert_eq!(rr.select(&actors, &mut rng).unwrap().as_str(), "only");
        }
    }

    #[test]
    fn least_connections_ties_break_by_registration_order() {
        let mut lc = LeastConnections::default();
        lc.register_server(Address::new("first"));
        lc.register_server(Address::new("second"));
        lc.register_server(Address::new("third"));
        // No servers are registered in `actors`, so every queue depth
        // lookup falls back to 0 and every server is equally idle.
        let actors = HashMap::new();
        let mut rng = rand::SeedableRng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(lc.select(&actors, &mut rng).unwrap().as_str(), "first");
        }
    }
}
