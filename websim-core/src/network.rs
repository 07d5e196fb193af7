use std::collections::HashMap;

use crate::address::{Address, EntityKind};

/// The virtual network: an address-to-kind registry plus a transport-delay
/// table keyed by (source kind, destination kind).
///
/// Unregistered pairs default to zero delay, which only ever bites a
/// misconfigured run (every pair that actually occurs in a topology should
/// be given an explicit delay).
#[derive(Debug, Default)]
pub struct Fabric {
    kinds: HashMap<Address, EntityKind>,
    delays: HashMap<(EntityKind, EntityKind), f64>,
}

impl Fabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, addr: Address, kind: EntityKind) {
        self.kinds.insert(addr, kind);
    }

    pub fn kind_of(&self, addr: &Address) -> Option<EntityKind> {
        self.kinds.get(addr).copied()
    }

    pub fn set_delay(&mut self, src: EntityKind, dst: EntityKind, seconds: f64) {
        self.delays.insert((src, dst), seconds);
    }

    pub fn delay(&self, src: EntityKind, dst: EntityKind) -> f64 {
        self.delays.get(&(src, dst)).copied().unwrap_or(0.0)
    }
}
