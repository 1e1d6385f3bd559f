//! D-Bus service implementation for `org.bubblejail.Manager.Unstable`.

use tracing::{debug, error, info};
use zbus::{fdo, interface, Connection};

use crate::instances::InstanceStore;

/// Well-known name of the manager service.
pub const MANAGER_NAME: &str = "org.bubblejail.Manager";
/// Object path the manager interface is served at.
pub const MANAGER_PATH: &str = "/org/bubblejail/manager";

/// Read-only manager interface.
///
/// Implements `org.bubblejail.Manager.Unstable` at `/org/bubblejail/manager`.
pub struct ManagerInterface {
    store: InstanceStore,
}

impl ManagerInterface {
    pub fn new(store: InstanceStore) -> Self {
        Self { store }
    }
}

#[interface(name = "org.bubblejail.Manager.Unstable")]
impl ManagerInterface {
    /// Returns `(instance_name, desktop_entry_name)` for every instance.
    ///
    /// The desktop entry is an empty string when the instance has none.
    async fn list_instances_with_desktop_entries(&self) -> fdo::Result<Vec<(String, String)>> {
        debug!("ListInstancesWithDesktopEntries called");
        self.store.list_with_desktop_entries().map_err(|err| {
            error!(%err, "Failed to list instances");
            fdo::Error::Failed(err.to_string())
        })
    }
}

/// Serves the manager interface and claims [`MANAGER_NAME`] on `connection`.
pub async fn register_manager_interface(
    connection: &Connection,
    store: InstanceStore,
) -> zbus::Result<()> {
    connection
        .object_server()
        .at(MANAGER_PATH, ManagerInterface::new(store))
        .await?;

    connection.request_name(MANAGER_NAME).await?;

    info!("Manager D-Bus interface registered at {MANAGER_NAME}");

    Ok(())
}
