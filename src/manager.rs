//! Session-bus connection to the bubblejail manager.
//!
//! The client never goes through a generated `#[proxy]` trait: the reply is
//! fetched as an untyped structure and handed to [`crate::codec`], so the
//! shape check does not depend on zbus' own typed deserialization.

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use zbus::zvariant::{Structure, Value};
use zbus::{Connection, DBusError, Message, Proxy};

use crate::codec::{RawReply, ReplySchema};
use crate::endpoint::{BusScope, ServiceEndpoint};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("session bus is unavailable: {0}")]
    BusUnavailable(#[source] zbus::Error),
    #[error("cannot reach {service} at {path}: {source}")]
    EndpointUnresolvable {
        service: &'static str,
        path: &'static str,
        #[source]
        source: zbus::Error,
    },
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("no reply from the manager before the call timed out")]
    Timeout,
    #[error("manager replied with {name}: {message}")]
    RemoteError { name: String, message: String },
    #[error("D-Bus transport error: {0}")]
    Bus(#[source] zbus::Error),
}

impl From<zbus::Error> for CallError {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, message, _) => CallError::RemoteError {
                name: name.to_string(),
                message: message.unwrap_or_default(),
            },
            zbus::Error::FDO(err) => CallError::RemoteError {
                name: err.name().to_string(),
                message: err.description().unwrap_or_default().to_string(),
            },
            other => CallError::Bus(other),
        }
    }
}

/// An established route to the manager's list method.
#[allow(async_fn_in_trait)]
pub trait ManagerTransport {
    fn endpoint(&self) -> &ServiceEndpoint;

    /// Sends the call and waits for the reply, without any deadline.
    async fn invoke(&self) -> Result<RawReply, CallError>;

    /// Sends the call, giving up after the endpoint's timeout.
    async fn call_list_instances(&self) -> Result<RawReply, CallError> {
        let deadline = self.endpoint().timeout;
        match timeout(deadline, self.invoke()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = deadline.as_millis(),
                    method = self.endpoint().method(),
                    "Manager call timed out"
                );
                Err(CallError::Timeout)
            }
        }
    }
}

/// Something that can open a [`ManagerTransport`] for an endpoint.
#[allow(async_fn_in_trait)]
pub trait Connect {
    type Transport: ManagerTransport;

    async fn connect(
        &mut self,
        endpoint: ServiceEndpoint,
    ) -> Result<Self::Transport, ConnectionError>;
}

/// Live connection to the manager service.
pub struct ManagerConnection {
    proxy: Proxy<'static>,
    endpoint: ServiceEndpoint,
}

impl ManagerConnection {
    /// Opens the endpoint's bus and builds a proxy for it.
    pub async fn connect(endpoint: ServiceEndpoint) -> Result<Self, ConnectionError> {
        let connection = match endpoint.bus {
            BusScope::Session => Connection::session()
                .await
                .map_err(ConnectionError::BusUnavailable)?,
        };
        Self::from_connection(connection, endpoint).await
    }

    /// Builds a proxy on an already open connection.
    pub async fn from_connection(
        connection: Connection,
        endpoint: ServiceEndpoint,
    ) -> Result<Self, ConnectionError> {
        let proxy = Proxy::new(
            &connection,
            endpoint.service,
            endpoint.path,
            endpoint.interface,
        )
        .await
        .map_err(|source| ConnectionError::EndpointUnresolvable {
            service: endpoint.service,
            path: endpoint.path,
            source,
        })?;

        info!(
            service = endpoint.service,
            path = endpoint.path,
            interface = endpoint.interface,
            "Connected to manager"
        );

        Ok(Self { proxy, endpoint })
    }
}

impl ManagerTransport for ManagerConnection {
    fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    async fn invoke(&self) -> Result<RawReply, CallError> {
        debug!(method = self.endpoint.method(), "Calling manager");
        let message = self
            .proxy
            .call_method(self.endpoint.method(), &())
            .await?;
        raw_reply(&message, &self.endpoint.reply)
    }
}

/// Reads a reply message into a [`RawReply`].
///
/// The body signature is kept as sent. Arguments are only read when that
/// signature is the expected one, so any other body is left to the decoder
/// to reject.
pub fn raw_reply(message: &Message, schema: &ReplySchema) -> Result<RawReply, CallError> {
    let body = message.body();
    let signature = body
        .signature()
        .map(|signature| signature.as_str().to_string())
        .unwrap_or_default();
    if signature != schema.body {
        debug!(%signature, expected = schema.body, "Unexpected reply body");
        return Ok(RawReply::with_signature(signature, None));
    }

    let fields: Structure<'_> = body.deserialize()?;
    let value = Value::from(fields).try_to_owned().map_err(zbus::Error::from)?;
    Ok(RawReply::with_signature(signature, Some(value)))
}

/// Opens manager connections on the session bus.
///
/// Holding a connection lets the caller share the one it already uses, e.g.
/// for owning the application's well-known name.
#[derive(Default)]
pub struct SessionBus {
    connection: Option<Connection>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self {
            connection: Some(connection),
        }
    }
}

impl Connect for SessionBus {
    type Transport = ManagerConnection;

    async fn connect(
        &mut self,
        endpoint: ServiceEndpoint,
    ) -> Result<ManagerConnection, ConnectionError> {
        match self.connection.clone() {
            Some(connection) => ManagerConnection::from_connection(connection, endpoint).await,
            None => ManagerConnection::connect(endpoint).await,
        }
    }
}
