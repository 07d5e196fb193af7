use thiserror::Error;

use crate::address::Address;

/// Everything that can go wrong while building or driving a [`crate::world::World`].
///
/// `Programming` variants indicate a contract violation (unregistered address,
/// negative delay) rather than a modeled network condition; modeled conditions
/// such as queue overflow are surfaced as [`crate::message::Message::DropServer`]
/// / [`crate::message::Message::DropDns`] messages, never as errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("address {0:?} was never registered with the network fabric")]
    UnregisteredAddress(Address),

    #[error("no actor is registered at address {0:?}")]
    UnknownActor(Address),

    #[error("attempted to schedule an event {dt} seconds in the past")]
    NegativeDelay { dt: f64 },

    #[error("least-connections/round-robin/random strategy has no servers registered")]
    EmptyServerPool,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
