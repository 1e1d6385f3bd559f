//! Application entry: owns the list view and drives one fetch per activation.

use std::io::Write;

use tracing::{error, info};

use crate::directory::InstanceDirectory;
use crate::icons::IconResolver;
use crate::manager::Connect;
use crate::presenter::{InstanceListView, ListCommand, ListItem, ListPresenter};

/// Application id, also claimed as a well-known name on the session bus.
pub const APPLICATION_ID: &str = "org.bubblejail.Config";

/// Plain-text list view: one `icon<TAB>name` row per item.
pub struct TextListView<W: Write> {
    out: W,
    items: Vec<ListItem>,
    error: Option<String>,
}

impl<W: Write> TextListView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            items: Vec::new(),
            error: None,
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Writes the current list, then the error banner if any.
    pub fn flush(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "Instances list:")?;
        for item in &self.items {
            writeln!(self.out, "{}\t{}", item.icon, item.display_name)?;
        }
        if let Some(error) = &self.error {
            writeln!(self.out, "error: {error}")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> InstanceListView for TextListView<W> {
    fn apply(&mut self, command: ListCommand) {
        match command {
            ListCommand::Clear => {
                self.items.clear();
                self.error = None;
            }
            ListCommand::Append(item) => self.items.push(item),
            ListCommand::ShowError(message) => self.error = Some(message),
        }
    }
}

/// Everything an activation needs, created once and passed by reference.
pub struct ConfigApp<C: Connect, R, V> {
    directory: InstanceDirectory<C>,
    presenter: ListPresenter<R>,
    view: V,
}

impl<C, R, V> ConfigApp<C, R, V>
where
    C: Connect,
    R: IconResolver,
    V: InstanceListView,
{
    pub fn new(directory: InstanceDirectory<C>, presenter: ListPresenter<R>, view: V) -> Self {
        Self {
            directory,
            presenter,
            view,
        }
    }

    /// Fetches the instance list and hands the outcome to the view.
    ///
    /// Errors end up in the view as a banner; they never abort the process.
    pub async fn activate(&mut self) {
        let result = self.directory.fetch_instances().await;
        match &result {
            Ok(records) => {
                info!(count = records.len(), "Showing instances");
                self.presenter.prepare(records);
            }
            Err(err) => error!(%err, "Showing instance list error"),
        }
        self.presenter.render_into(&result, &mut self.view);
    }

    pub fn directory(&self) -> &InstanceDirectory<C> {
        &self.directory
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
