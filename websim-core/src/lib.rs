//! Discrete-event simulation engine for a web-serving topology: clients,
//! a DNS server, an optional gateway load balancer, and a backend server
//! pool, connected by a virtual network with per-link transport delays.
//!
//! [`world::World`] is the entry point: build one from a [`config::SimConfig`]
//! and call [`world::World::run`] to drive it to its configured horizon.

pub mod actors;
pub mod address;
pub mod config;
pub mod distributions;
pub mod error;
pub mod message;
pub mod metrics;
pub mod network;
pub mod queue;
pub mod scheduler;
pub mod strategy;
pub mod time;
pub mod world;

pub use config::{LbTopology, SimConfig, TransportDelay};
pub use error::{SimError, SimResult};
pub use strategy::StrategyKind;
pub use world::World;
