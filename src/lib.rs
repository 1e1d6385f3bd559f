//! Lists the sandboxed instances known to the bubblejail manager.
//!
//! The manager (`org.bubblejail.Manager` on the session bus) answers
//! `ListInstancesWithDesktopEntries` with `(instance_name, desktop_entry)`
//! pairs. [`directory::InstanceDirectory`] performs that call, [`codec`]
//! checks and decodes the reply and [`presenter::ListPresenter`] turns the
//! records into list view commands.

pub mod app;
pub mod codec;
pub mod config;
pub mod directory;
pub mod endpoint;
pub mod icons;
pub mod manager;
pub mod presenter;

pub use codec::{InstanceRecord, SchemaMismatch};
pub use directory::{DirectoryError, FetchState, InstanceDirectory};
pub use manager::{CallError, ConnectionError, ManagerConnection, SessionBus};
