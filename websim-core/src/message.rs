use crate::address::Address;
use crate::time::VirtualTime;

/// The reason a message was dropped, carried along so metrics and logs can
/// distinguish overflow sites without a separate error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    ServerQueueFull,
    LoadBalancerRequestQueueFull,
    LoadBalancerResponseQueueFull,
    DnsQueueFull,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::ServerQueueFull => "server queue full",
            DropReason::LoadBalancerRequestQueueFull => "load balancer request queue full",
            DropReason::LoadBalancerResponseQueueFull => "load balancer response queue full",
            DropReason::DnsQueueFull => "dns queue full",
        }
    }
}

/// Every message type that can travel across the network fabric.
///
/// Each variant carries its own copy of the fields it needs rather than
/// sharing a common envelope struct, matching the tagged dictionaries the
/// simulated protocol actually exchanges.
#[derive(Debug, Clone)]
pub enum Message {
    DnsRequest {
        client_id: u64,
        client_ip: Address,
        start_timestamp: VirtualTime,
    },
    DnsResponse {
        client_id: u64,
        resolved: Address,
        timestamp: VirtualTime,
    },
    Request {
        client_id: u64,
        client_ip: Address,
        start_timestamp: VirtualTime,
        through_lb: bool,
    },
    Response {
        client_id: u64,
        server_ip: Address,
        client_ip: Address,
        timestamp: VirtualTime,
    },
    DropServer {
        client_id: u64,
        reason: DropReason,
        timestamp: VirtualTime,
    },
    DropDns {
        client_id: u64,
        reason: DropReason,
        timestamp: VirtualTime,
    },
}

impl Message {
    pub fn client_id(&self) -> u64 {
        match self {
            Message::DnsRequest { client_id, .. }
            | Message::DnsResponse { client_id, .. }
            | Message::Request { client_id, .. }
            | Message::Response { client_id, .. }
            | Message::DropServer { client_id, .. }
            | Message::DropDns { client_id, .. } => *client_id,
        }
    }
}
