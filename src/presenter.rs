//! Turns fetched instance records into list view commands.

use crate::codec::InstanceRecord;
use crate::directory::DirectoryError;
use crate::icons::{icon_from_entry_id, IconResolver, DEFAULT_ICON};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub display_name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    /// Drop every item currently shown.
    Clear,
    /// Append one item at the end of the list.
    Append(ListItem),
    /// Show an error banner; the items already shown stay as they are.
    ShowError(String),
}

/// The UI side of the instance list.
pub trait InstanceListView {
    fn apply(&mut self, command: ListCommand);
}

impl InstanceListView for Vec<ListCommand> {
    fn apply(&mut self, command: ListCommand) {
        self.push(command);
    }
}

pub struct ListPresenter<R> {
    resolver: R,
    fallback_icon: String,
}

impl<R: IconResolver> ListPresenter<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_fallback_icon(resolver, DEFAULT_ICON)
    }

    pub fn with_fallback_icon(resolver: R, fallback_icon: impl Into<String>) -> Self {
        Self {
            resolver,
            fallback_icon: fallback_icon.into(),
        }
    }

    /// Lets the resolver load the icons of these records' desktop entries.
    ///
    /// The presenting methods below only look icons up.
    pub fn prepare(&mut self, records: &[InstanceRecord]) {
        let desktop_entries: Vec<&str> = records
            .iter()
            .filter_map(|record| record.desktop_entry.as_deref())
            .collect();
        self.resolver.prepare(&desktop_entries);
    }

    /// Icon for one record.
    ///
    /// With a desktop entry the entry's own icon wins, then a name derived
    /// from the entry id. Without one the fallback icon is used.
    pub fn icon_for(&self, record: &InstanceRecord) -> String {
        record
            .desktop_entry
            .as_deref()
            .and_then(|entry| {
                self.resolver
                    .icon_for_entry(entry)
                    .or_else(|| icon_from_entry_id(entry))
            })
            .unwrap_or_else(|| self.fallback_icon.clone())
    }

    /// One `Append` per record, in record order.
    pub fn present(&self, records: &[InstanceRecord]) -> Vec<ListCommand> {
        records
            .iter()
            .map(|record| {
                ListCommand::Append(ListItem {
                    display_name: record.name.clone(),
                    icon: self.icon_for(record),
                })
            })
            .collect()
    }

    /// Commands for the outcome of a whole fetch.
    ///
    /// A successful fetch replaces the list; a failed one only adds a banner.
    pub fn render(
        &self,
        result: &Result<Vec<InstanceRecord>, DirectoryError>,
    ) -> Vec<ListCommand> {
        match result {
            Ok(records) => std::iter::once(ListCommand::Clear)
                .chain(self.present(records))
                .collect(),
            Err(err) => vec![ListCommand::ShowError(format!(
                "Could not list instances: {err}"
            ))],
        }
    }

    pub fn render_into(
        &self,
        result: &Result<Vec<InstanceRecord>, DirectoryError>,
        view: &mut impl InstanceListView,
    ) {
        for command in self.render(result) {
            view.apply(command);
        }
    }
}
