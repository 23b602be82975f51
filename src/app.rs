// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::tui;
use crate::tui::events;
use crate::tui::label::LabelCache;
use crate::tui::search_bar::SearchBar;
use crate::tui::tree::{TreeMathHelper, TreeViewState};

use std::cell::{Cell, RefCell};
use std::io::Stdout;
use std::time::Duration;

use crate::config::Settings;
use crate::errors::NavigatorError;
use crate::jenkins::client::{JobInfo, ServerInfo};
use crate::jenkins::{JenkinsClient, RemoteLoader};
use crate::navigator::{Effect, LoadOutcome, Navigator, NodeId, Notification};

use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tokio::time;

use ratatui::crossterm::event::{self, Event as CrosstermEvent};
use ratatui::{backend::CrosstermBackend, Terminal};

use tracing::{event as tracing_event, Level};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Focus {
    #[default]
    Tree,
    Content,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ContentView {
    #[default]
    Home,
    Job {
        node: NodeId,
        name: String,
        url: String,
        info: Option<JobInfo>,
    },
}

#[derive(Debug)]
pub enum AppEvent {
    ServerInfo(Result<ServerInfo, NavigatorError>),
    JobInfo {
        url: String,
        result: Result<JobInfo, NavigatorError>,
    },
}

#[derive(Default)]
pub struct AppState {
    pub should_quit: bool,
    pub show_help: bool,
    pub system_error: Option<String>,

    pub focus: Focus,
    pub search: SearchBar,
    pub tree: TreeViewState,
    pub content: ContentView,
    pub server_info: Option<ServerInfo>,

    pub ui_needs_redraw: bool,
    /// Rows available to the tree at the last draw.
    pub tree_height: Cell<usize>,
    pub labels: RefCell<LabelCache>,
}

pub struct App<L = JenkinsClient> {
    pub app_state: AppState,
    pub settings: Settings,
    pub client: JenkinsClient,
    pub navigator: Navigator<L>,

    pub app_event_tx: mpsc::Sender<AppEvent>,
    pub app_event_rx: mpsc::Receiver<AppEvent>,
    pub tui_event_tx: mpsc::Sender<CrosstermEvent>,
    pub tui_event_rx: mpsc::Receiver<CrosstermEvent>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl App<JenkinsClient> {
    pub fn new(settings: Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let client = JenkinsClient::new(&settings)?;
        Ok(Self::with_loader(settings, client.clone(), client))
    }
}

impl<L: RemoteLoader> App<L> {
    pub fn with_loader(settings: Settings, client: JenkinsClient, loader: L) -> Self {
        let (app_event_tx, app_event_rx) = mpsc::channel::<AppEvent>(32);
        let (tui_event_tx, tui_event_rx) = mpsc::channel::<CrosstermEvent>(100);
        let (shutdown_tx, _) = broadcast::channel(1);

        let navigator = Navigator::new(loader, &settings);
        let app_state = AppState {
            ui_needs_redraw: true,
            ..Default::default()
        };

        Self {
            app_state,
            settings,
            client,
            navigator,
            app_event_tx,
            app_event_rx,
            tui_event_tx,
            tui_event_rx,
            shutdown_tx,
        }
    }

    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let tui_event_tx_clone = self.tui_event_tx.clone();
        let mut tui_shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tui_shutdown_rx.recv() => break,

                    result = tokio::task::spawn_blocking(event::read) => {
                        let event = match result {
                            Ok(Ok(e)) => e,
                            Ok(Err(e)) => {
                                tracing_event!(Level::ERROR, "Crossterm event read error: {}", e);
                                break;
                            }
                            Err(e) => {
                                tracing_event!(Level::ERROR, "Blocking TUI read task panicked: {}", e);
                                break;
                            }
                        };

                        if tui_event_tx_clone.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.fetch_server_info();
        let root = self.navigator.root();
        self.activate(root);

        let mut draw_interval = time::interval(Duration::from_millis(17));
        while !self.app_state.should_quit {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    self.app_state.should_quit = true;
                }

                Some(event) = self.tui_event_rx.recv() => {
                    events::handle_event(event, self);
                }

                Some(outcome) = self.navigator.next_load_outcome() => {
                    self.apply_load_outcome(outcome);
                }

                Some(app_event) = self.app_event_rx.recv() => {
                    self.handle_app_event(app_event);
                }

                _ = draw_interval.tick() => {
                    if self.app_state.ui_needs_redraw {
                        terminal.draw(|f| {
                            tui::draw(f, self);
                        })?;
                        self.app_state.ui_needs_redraw = false;
                    }
                }
            }
            self.process_notifications();
        }

        let _ = self.shutdown_tx.send(());
        tracing_event!(Level::INFO, "Shutting down");
        Ok(())
    }

    /// A click on `id`, from the tree or from a search hit.
    pub fn activate(&mut self, id: NodeId) {
        match self.navigator.activate(id) {
            Ok(effects) => self.apply_effects(effects),
            Err(e) => self.report_error(e),
        }
        self.app_state.ui_needs_redraw = true;
    }

    /// Looks up the search bar's value and, on a hit, reveals and activates the node.
    pub fn submit_search(&mut self) {
        let query = self.app_state.search.value.clone();
        tracing_event!(Level::DEBUG, "Searching for {:?}", query);

        let Some(id) = self.navigator.lookup(&query) else {
            self.app_state.system_error = Some(format!("No results found for \"{}\"", query));
            self.app_state.ui_needs_redraw = true;
            return;
        };

        match self.navigator.jump_to(id) {
            Ok(effects) => {
                self.app_state.search.close();
                let height = self.app_state.tree_height.get();
                TreeMathHelper::reveal(&mut self.app_state.tree, self.navigator.store(), id, height);
                self.app_state.focus = Focus::Tree;
                self.apply_effects(effects);
            }
            Err(e) => self.report_error(e),
        }
        self.app_state.ui_needs_redraw = true;
    }

    pub fn refresh(&mut self) {
        self.app_state.tree = TreeViewState::new();
        self.app_state.system_error = None;
        if let Err(e) = self.navigator.refresh() {
            self.report_error(e);
        }
        self.app_state.ui_needs_redraw = true;
    }

    pub fn apply_load_outcome(&mut self, outcome: LoadOutcome) {
        if let Err(e) = self.navigator.apply_load_outcome(outcome) {
            tracing_event!(Level::WARN, "Listing was not applied: {}", e);
        }
        self.app_state.ui_needs_redraw = true;
    }

    pub fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::ServerInfo(Ok(info)) => {
                tracing_event!(Level::INFO, "Connected to Jenkins {}", info.version);
                self.app_state.server_info = Some(info);
            }
            AppEvent::ServerInfo(Err(e)) => self.report_error(e),
            AppEvent::JobInfo { url, result } => {
                let is_open = matches!(
                    &self.app_state.content,
                    ContentView::Job { url: open_url, .. } if *open_url == url
                );
                if !is_open {
                    tracing_event!(Level::DEBUG, "Dropping details for {}, no longer open", url);
                    return;
                }
                match result {
                    Ok(job_info) => {
                        if let ContentView::Job { info, .. } = &mut self.app_state.content {
                            *info = Some(job_info);
                        }
                    }
                    Err(e) => self.report_error(e),
                }
            }
        }
        self.app_state.ui_needs_redraw = true;
    }

    pub fn process_notifications(&mut self) {
        for notification in self.navigator.drain_notifications() {
            match notification {
                Notification::LoadFailed(id, message) => {
                    let name = self
                        .navigator
                        .store()
                        .get(id)
                        .map(|node| node.label.clone())
                        .unwrap_or_else(|_| id.to_string());
                    self.app_state.system_error = Some(format!("Failed to load {}: {}", name, message));
                }
                Notification::NodeSetChanged
                | Notification::ExpansionChanged(_)
                | Notification::SelectionChanged(_)
                | Notification::LoadStarted(_) => {}
            }
            self.app_state.ui_needs_redraw = true;
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ShowHome => {
                    self.app_state.content = ContentView::Home;
                }
                Effect::OpenDetail { node, url, name } => {
                    self.fetch_job_info(&url);
                    self.app_state.content = ContentView::Job {
                        node,
                        name,
                        url,
                        info: None,
                    };
                }
                Effect::RefocusDetail { .. } => {
                    self.app_state.focus = Focus::Content;
                }
            }
        }
    }

    fn report_error(&mut self, e: NavigatorError) {
        tracing_event!(Level::ERROR, "{}", e);
        self.app_state.system_error = Some(e.to_string());
    }

    fn fetch_server_info(&self) {
        let client = self.client.clone();
        let app_event_tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            let result = client.server_info().await;
            let _ = app_event_tx.send(AppEvent::ServerInfo(result)).await;
        });
    }

    fn fetch_job_info(&self, url: &str) {
        let client = self.client.clone();
        let app_event_tx = self.app_event_tx.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let result = client.job_info(&url).await;
            let _ = app_event_tx.send(AppEvent::JobInfo { url, result }).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::testing::{folder, job, MockLoader};

    fn app(loader: &MockLoader) -> App<MockLoader> {
        let settings = Settings {
            url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let client = JenkinsClient::new(&settings).unwrap();
        App::with_loader(settings, client, loader.clone())
    }

    async fn loaded_app(loader: &MockLoader) -> App<MockLoader> {
        let mut app = app(loader);
        let root = app.navigator.root();
        app.navigator.ensure_loaded(root).await.unwrap();
        app.process_notifications();
        app
    }

    fn id(app: &App<MockLoader>, name: &str) -> NodeId {
        app.navigator.store().find_by_name(name).unwrap()
    }

    #[tokio::test]
    async fn test_opening_a_job_swaps_content() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("deploy-prod")]);
        let mut app = loaded_app(&loader).await;
        let deploy = id(&app, "deploy-prod");

        app.activate(deploy);

        assert!(matches!(
            &app.app_state.content,
            ContentView::Job { node, name, info: None, .. } if *node == deploy && name == "deploy-prod"
        ));
        assert_eq!(app.app_state.focus, Focus::Tree);

        app.activate(deploy);
        assert_eq!(app.app_state.focus, Focus::Content);

        app.activate(app.navigator.root());
        assert_eq!(app.app_state.content, ContentView::Home);
    }

    #[tokio::test]
    async fn test_job_info_for_a_closed_job_is_dropped() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a"), job("b")]);
        let mut app = loaded_app(&loader).await;
        app.activate(id(&app, "a"));
        app.activate(id(&app, "b"));

        app.handle_app_event(AppEvent::JobInfo {
            url: "https://ci/job/a/".to_string(),
            result: Ok(JobInfo {
                display_name: "a".to_string(),
                ..Default::default()
            }),
        });
        assert!(matches!(&app.app_state.content, ContentView::Job { info: None, .. }));

        app.handle_app_event(AppEvent::JobInfo {
            url: "https://ci/job/b/".to_string(),
            result: Ok(JobInfo {
                display_name: "b".to_string(),
                ..Default::default()
            }),
        });
        assert!(matches!(
            &app.app_state.content,
            ContentView::Job { info: Some(info), .. } if info.display_name == "b"
        ));
    }

    #[tokio::test]
    async fn test_search_miss_reports_query() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("deploy-prod")]);
        let mut app = loaded_app(&loader).await;
        app.app_state.search.value = "nothing-here".to_string();

        app.submit_search();

        assert_eq!(
            app.app_state.system_error.as_deref(),
            Some("No results found for \"nothing-here\"")
        );
    }

    #[tokio::test]
    async fn test_search_hit_reveals_and_opens() {
        let loader = MockLoader::new();
        loader.respond(
            None,
            vec![folder("teamA", vec![job("build-service")]), job("other")],
        );
        let mut app = loaded_app(&loader).await;
        app.app_state.tree_height.set(10);
        app.app_state.search.open();
        app.app_state.search.value = "TeamA/Build-Service".to_string();

        app.submit_search();

        let target = id(&app, "teamA/build-service");
        assert!(!app.app_state.search.active);
        assert_eq!(app.app_state.tree.cursor, Some(target));
        assert!(app.navigator.store().get(id(&app, "teamA")).unwrap().expanded);
        assert!(matches!(&app.app_state.content, ContentView::Job { node, .. } if *node == target));
    }

    #[tokio::test]
    async fn test_failed_load_is_shown_to_the_user() {
        let loader = MockLoader::new();
        loader.fail(None, NavigatorError::RemoteUnavailable("401 Unauthorized".to_string()));
        let mut app = app(&loader);
        let root = app.navigator.root();

        assert!(app.navigator.ensure_loaded(root).await.is_err());
        app.process_notifications();

        assert_eq!(
            app.app_state.system_error.as_deref(),
            Some("Failed to load home: The Jenkins server could not be reached: 401 Unauthorized")
        );
    }
}
