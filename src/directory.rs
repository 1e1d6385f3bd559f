//! End-to-end "list instances" operation.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, InstanceRecord, SchemaMismatch};
use crate::endpoint::{ServiceEndpoint, MANAGER_LIST_INSTANCES};
use crate::manager::{CallError, Connect, ConnectionError, ManagerTransport};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Transport(#[from] CallError),
    #[error(transparent)]
    Protocol(#[from] SchemaMismatch),
}

/// Progress of the current (or last) fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Connecting,
    Calling,
    Decoding,
    Ready,
    Failed,
}

/// Client for the manager's instance list.
///
/// The connection is opened on the first fetch and kept afterwards. Every
/// fetch is a fresh round trip; results are never cached.
pub struct InstanceDirectory<C: Connect> {
    connector: C,
    endpoint: ServiceEndpoint,
    transport: Option<C::Transport>,
    state: FetchState,
}

impl<C: Connect> InstanceDirectory<C> {
    pub fn new(connector: C) -> Self {
        Self::with_endpoint(connector, MANAGER_LIST_INSTANCES)
    }

    pub fn with_endpoint(connector: C, endpoint: ServiceEndpoint) -> Self {
        Self {
            connector,
            endpoint,
            transport: None,
            state: FetchState::Idle,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Fetches the instance list, in the order the manager sent it.
    pub async fn fetch_instances(&mut self) -> Result<Vec<InstanceRecord>, DirectoryError> {
        transition(&mut self.state, FetchState::Idle);
        let result = self.run_fetch().await;
        match &result {
            Ok(records) => {
                transition(&mut self.state, FetchState::Ready);
                info!(count = records.len(), "Fetched instance list");
            }
            Err(err) => {
                transition(&mut self.state, FetchState::Failed);
                warn!(%err, "Fetching instance list failed");
            }
        }
        result
    }

    async fn run_fetch(&mut self) -> Result<Vec<InstanceRecord>, DirectoryError> {
        let transport = match self.transport {
            Some(ref transport) => transport,
            None => {
                transition(&mut self.state, FetchState::Connecting);
                let transport = self.connector.connect(self.endpoint).await?;
                self.transport.insert(transport)
            }
        };

        transition(&mut self.state, FetchState::Calling);
        let reply = transport.call_list_instances().await?;

        transition(&mut self.state, FetchState::Decoding);
        Ok(codec::decode_reply(&reply)?)
    }
}

fn transition(state: &mut FetchState, next: FetchState) {
    debug!(from = ?*state, to = ?next, "Directory state change");
    *state = next;
}
