//! Static description of the remote method the client talks to.

use std::time::Duration;

use crate::codec::{ReplySchema, LIST_INSTANCES_SCHEMA};

/// Which message bus an endpoint lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusScope {
    /// The per-user session bus.
    Session,
}

/// Everything needed to call one method on one remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub bus: BusScope,
    pub service: &'static str,
    pub path: &'static str,
    pub interface: &'static str,
    pub reply: ReplySchema,
    pub timeout: Duration,
}

impl ServiceEndpoint {
    /// Method name, as carried by the reply schema.
    pub fn method(&self) -> &'static str {
        self.reply.method
    }
}

/// `ListInstancesWithDesktopEntries` on the bubblejail manager.
pub const MANAGER_LIST_INSTANCES: ServiceEndpoint = ServiceEndpoint {
    bus: BusScope::Session,
    service: "org.bubblejail.Manager",
    path: "/org/bubblejail/manager",
    interface: "org.bubblejail.Manager.Unstable",
    reply: LIST_INSTANCES_SCHEMA,
    timeout: Duration::from_millis(1000),
};
