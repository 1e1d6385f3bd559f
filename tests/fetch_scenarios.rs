use std::future::pending;
use std::rc::Rc;
use std::time::Duration;

use bubblejail_config::app::{ConfigApp, TextListView};
use bubblejail_config::codec::RawReply;
use bubblejail_config::endpoint::ServiceEndpoint;
use bubblejail_config::icons::{IconResolver, DEFAULT_ICON};
use bubblejail_config::manager::{CallError, Connect, ConnectionError, ManagerTransport};
use bubblejail_config::presenter::{InstanceListView, ListCommand, ListItem, ListPresenter};
use bubblejail_config::{DirectoryError, FetchState, InstanceDirectory};
use zbus::zvariant::{OwnedValue, StructureBuilder, Value};

/// Manager stand-in answering every call with the same body.
#[derive(Clone)]
enum Manager {
    Answers(Rc<OwnedValue>),
    Silent,
}

struct Route {
    endpoint: ServiceEndpoint,
    manager: Manager,
}

impl ManagerTransport for Route {
    fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    async fn invoke(&self) -> Result<RawReply, CallError> {
        match &self.manager {
            Manager::Answers(body) => Ok(RawReply::new(Some(body.try_clone().unwrap()))),
            Manager::Silent => pending().await,
        }
    }
}

impl Connect for Manager {
    type Transport = Route;

    async fn connect(&mut self, endpoint: ServiceEndpoint) -> Result<Route, ConnectionError> {
        Ok(Route {
            endpoint,
            manager: self.clone(),
        })
    }
}

/// Knows the icon of `code.desktop`, once asked to load it.
#[derive(Default)]
struct EntryIcons {
    loaded: Vec<String>,
}

impl IconResolver for EntryIcons {
    fn prepare(&mut self, desktop_entries: &[&str]) {
        self.loaded = desktop_entries.iter().map(|entry| entry.to_string()).collect();
    }

    fn icon_for_entry(&self, desktop_entry: &str) -> Option<String> {
        (desktop_entry == "code.desktop" && self.loaded.iter().any(|entry| entry == desktop_entry))
            .then(|| "com.visualstudio.code".to_string())
    }
}

fn answers(value: Value<'_>) -> Manager {
    Manager::Answers(Rc::new(value.try_to_owned().unwrap()))
}

fn pairs(items: &[(&str, &str)]) -> Manager {
    let pairs: Vec<(String, String)> = items
        .iter()
        .map(|(name, entry)| (name.to_string(), entry.to_string()))
        .collect();
    answers(Value::from(StructureBuilder::new().add_field(pairs).build()))
}

fn config_app(manager: Manager) -> ConfigApp<Manager, EntryIcons, Vec<ListCommand>> {
    ConfigApp::new(
        InstanceDirectory::new(manager),
        ListPresenter::new(EntryIcons::default()),
        Vec::new(),
    )
}

fn appended(commands: &[ListCommand]) -> Vec<ListItem> {
    commands
        .iter()
        .filter_map(|command| match command {
            ListCommand::Append(item) => Some(item.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn two_instances_are_listed_in_order() {
    let mut app = config_app(pairs(&[("code", "code.desktop"), ("steam", "")]));

    app.activate().await;

    assert_eq!(
        appended(app.view()),
        vec![
            ListItem {
                display_name: "code".to_string(),
                icon: "com.visualstudio.code".to_string(),
            },
            ListItem {
                display_name: "steam".to_string(),
                icon: DEFAULT_ICON.to_string(),
            },
        ]
    );
    assert_eq!(app.directory().state(), FetchState::Ready);
}

#[tokio::test]
async fn empty_list_emits_no_items() {
    let mut app = config_app(pairs(&[]));

    app.activate().await;

    assert_eq!(app.view(), &vec![ListCommand::Clear]);
}

#[tokio::test]
async fn plain_strings_are_rejected_without_items() {
    let names = vec!["code".to_string(), "steam".to_string()];
    let manager = answers(Value::from(StructureBuilder::new().add_field(names).build()));
    let mut directory = InstanceDirectory::new(manager.clone());

    let err = directory.fetch_instances().await.unwrap_err();
    assert!(matches!(err, DirectoryError::Protocol(_)));

    let mut app = config_app(manager);
    app.activate().await;
    assert!(appended(app.view()).is_empty());
    assert!(matches!(app.view().as_slice(), [ListCommand::ShowError(_)]));
}

#[tokio::test(start_paused = true)]
async fn silent_manager_times_out_after_one_second() {
    let started = tokio::time::Instant::now();
    let mut directory = InstanceDirectory::new(Manager::Silent);

    let err = directory.fetch_instances().await.unwrap_err();

    assert!(matches!(err, DirectoryError::Transport(CallError::Timeout)));
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_the_previous_list() {
    let mut app = ConfigApp::new(
        InstanceDirectory::new(Manager::Silent),
        ListPresenter::new(EntryIcons::default()),
        TextListView::new(Vec::new()),
    );
    for command in [
        ListCommand::Clear,
        ListCommand::Append(ListItem {
            display_name: "code".to_string(),
            icon: "code".to_string(),
        }),
    ] {
        app.view_mut().apply(command);
    }

    app.activate().await;

    assert_eq!(app.view().items().len(), 1);
    assert!(app.view().error().is_some());
}
