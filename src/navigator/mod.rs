// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod expander;
pub mod node;
pub mod router;
pub mod search;
pub mod store;
pub mod sync;

#[cfg(test)]
pub mod testing;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::oneshot::error::TryRecvError;
use tracing::{event, Level};

use crate::config::Settings;
use crate::errors::NavigatorError;
use crate::jenkins::RemoteLoader;

pub use expander::AncestorExpander;
pub use node::{Node, NodeId, NodeKind};
pub use router::{Route, SelectionRouter};
pub use search::SearchIndex;
pub use store::NodeStore;
pub use sync::{Applied, LoadOutcome, LoadStep, TreeSynchronizer};

/// Requests for the view-swap layer. The navigator never swaps content itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowHome,
    OpenDetail {
        node: NodeId,
        url: String,
        name: String,
    },
    RefocusDetail {
        node: NodeId,
    },
}

/// State changes the rendering layer redraws on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NodeSetChanged,
    ExpansionChanged(NodeId),
    SelectionChanged(NodeId),
    LoadStarted(NodeId),
    LoadFailed(NodeId, String),
}

/// The tree, its loader, the selection and the search index, kept consistent together.
pub struct Navigator<L> {
    store: NodeStore,
    sync: TreeSynchronizer<L>,
    router: SelectionRouter,
    index: SearchIndex,
    expand_on_load: HashSet<NodeId>,
    notifications: Vec<Notification>,
}

impl<L: RemoteLoader> Navigator<L> {
    pub fn new(loader: L, settings: &Settings) -> Self {
        Self {
            store: NodeStore::new(&settings.url),
            sync: TreeSynchronizer::new(Arc::new(loader), settings.folder_depth),
            router: SelectionRouter::new(),
            index: SearchIndex::new(settings.suggestion_limit, settings.max_typo_cost),
            expand_on_load: HashSet::new(),
            notifications: Vec::new(),
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn root(&self) -> NodeId {
        self.store.root()
    }

    #[cfg(test)]
    pub fn router(&self) -> &SelectionRouter {
        &self.router
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut SearchIndex {
        &mut self.index
    }

    pub fn is_loading(&self, id: NodeId) -> bool {
        self.sync.is_in_flight(id)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Handles a click on `id`: containers toggle, leaves open, the root goes home.
    pub fn activate(&mut self, id: NodeId) -> Result<Vec<Effect>, NavigatorError> {
        let node = self.store.get(id)?;
        let route = self.router.route(node);
        event!(
            Level::DEBUG,
            "Activating {} {} routed to {:?}",
            node.kind,
            node.qualified_name,
            route
        );

        let mut effects = Vec::new();
        match route {
            Route::ShowHome => {
                effects.push(Effect::ShowHome);
                self.notifications.push(Notification::SelectionChanged(id));
                self.request_root()?;
            }
            Route::AlreadyHome => {
                self.request_root()?;
            }
            Route::Open => {
                effects.push(Effect::OpenDetail {
                    node: id,
                    url: node.url.clone(),
                    name: node.label.clone(),
                });
                self.notifications.push(Notification::SelectionChanged(id));
            }
            Route::Refocus => effects.push(Effect::RefocusDetail { node: id }),
            Route::Expand => self.expand(id)?,
            Route::Collapse => {
                for changed in AncestorExpander::collapse_subtree(&mut self.store, id)? {
                    self.notifications.push(Notification::ExpansionChanged(changed));
                }
            }
        }
        Ok(effects)
    }

    /// Expands every ancestor of `id` and then activates it like a click.
    pub fn jump_to(&mut self, id: NodeId) -> Result<Vec<Effect>, NavigatorError> {
        for changed in AncestorExpander::expose_node(&mut self.store, id)? {
            self.notifications.push(Notification::ExpansionChanged(changed));
        }
        self.activate(id)
    }

    pub fn lookup(&self, text: &str) -> Option<NodeId> {
        self.index.lookup_exact(text)
    }

    pub async fn next_load_outcome(&mut self) -> Option<LoadOutcome> {
        self.sync.next_outcome().await
    }

    pub fn apply_load_outcome(&mut self, outcome: LoadOutcome) -> Result<Applied, NavigatorError> {
        let node = outcome.node;
        let applied = self.sync.apply(&mut self.store, outcome);
        let wants_expansion = self.expand_on_load.remove(&node);

        match &applied {
            Ok(Applied::Materialized { node, count }) => {
                event!(Level::INFO, "Loaded {} nodes below {}", count, node);
                self.index.rebuild(&self.store);
                self.notifications.push(Notification::NodeSetChanged);
                if wants_expansion {
                    self.expand_loaded(*node)?;
                }
            }
            Ok(Applied::AlreadyLoaded(node)) => {
                if wants_expansion {
                    self.expand_loaded(*node)?;
                }
            }
            Ok(Applied::Discarded(_)) => {}
            Err(e) => {
                self.notifications
                    .push(Notification::LoadFailed(node, e.to_string()));
            }
        }
        applied
    }

    /// Loads `id` and waits for it, applying any other listings that finish meanwhile.
    pub async fn ensure_loaded(&mut self, id: NodeId) -> Result<(), NavigatorError> {
        match self.request(id)? {
            LoadStep::Ready | LoadStep::Materialized(_) => return Ok(()),
            LoadStep::Started | LoadStep::InFlight => {}
        }
        let mut done = self
            .sync
            .subscribe(id)
            .ok_or(NavigatorError::NotFound(id))?;

        loop {
            let outcome = self.next_load_outcome().await.ok_or_else(|| {
                NavigatorError::RemoteUnavailable("listing channel closed".to_string())
            })?;
            // Failures are also queued as notifications for their own nodes.
            let _ = self.apply_load_outcome(outcome);
            match done.try_recv() {
                Ok(result) => return result,
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Closed) => return Err(NavigatorError::NotFound(id)),
            }
        }
    }

    /// Drops the whole tree and loads it again from the server.
    pub fn refresh(&mut self) -> Result<LoadStep, NavigatorError> {
        event!(Level::INFO, "Refreshing the job tree");
        self.sync.invalidate();
        self.expand_on_load.clear();

        let root = self.store.root();
        self.store.clear_children(root)?;
        let node = self.store.get_mut(root)?;
        node.loaded = false;
        node.expanded = false;
        node.pending_children.clear();

        self.index.rebuild(&self.store);
        self.notifications.push(Notification::NodeSetChanged);
        self.request(root)
    }

    fn request_root(&mut self) -> Result<LoadStep, NavigatorError> {
        let root = self.store.root();
        self.request(root)
    }

    fn request(&mut self, id: NodeId) -> Result<LoadStep, NavigatorError> {
        let step = self.sync.request(&mut self.store, id).inspect_err(|e| {
            self.notifications
                .push(Notification::LoadFailed(id, e.to_string()));
        })?;
        match step {
            LoadStep::Started => self.notifications.push(Notification::LoadStarted(id)),
            LoadStep::Materialized(_) => {
                self.index.rebuild(&self.store);
                self.notifications.push(Notification::NodeSetChanged);
            }
            LoadStep::Ready | LoadStep::InFlight => {}
        }
        Ok(step)
    }

    fn expand(&mut self, id: NodeId) -> Result<(), NavigatorError> {
        match self.request(id)? {
            LoadStep::Ready | LoadStep::Materialized(_) => self.expand_loaded(id),
            LoadStep::Started | LoadStep::InFlight => {
                self.expand_on_load.insert(id);
                Ok(())
            }
        }
    }

    /// Expands a loaded node, unless one of its ancestors was collapsed in the meantime.
    fn expand_loaded(&mut self, id: NodeId) -> Result<(), NavigatorError> {
        for ancestor in self.store.ancestors(id)? {
            if !self.store.get(ancestor)?.expanded {
                event!(Level::DEBUG, "Not expanding {}; an ancestor is collapsed", id);
                return Ok(());
            }
        }
        let node = self.store.get_mut(id)?;
        if !node.expanded {
            node.expanded = true;
            self.notifications.push(Notification::ExpansionChanged(id));
        }
        Ok(())
    }
}
