// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{event, Level};

use super::node::NodeId;
use super::store::NodeStore;
use crate::errors::NavigatorError;
use crate::jenkins::{ListingRequest, RawEntry, RemoteLoader};

const OUTCOME_CHANNEL_SIZE: usize = 64;

type Waiter = oneshot::Sender<Result<(), NavigatorError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// Already loaded, nothing happened.
    Ready,
    /// Children were buffered from an ancestor's response and are now in the store.
    Materialized(usize),
    /// A remote listing was started.
    Started,
    /// A remote listing for this node was already running; no new call was made.
    InFlight,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub node: NodeId,
    pub generation: u64,
    pub result: Result<Vec<RawEntry>, NavigatorError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Materialized { node: NodeId, count: usize },
    AlreadyLoaded(NodeId),
    /// The tree was refreshed (or the node removed) while the listing was running.
    Discarded(NodeId),
}

/// Drives lazy population of the `NodeStore` from a `RemoteLoader`.
///
/// Listings run on spawned tasks and come back as `LoadOutcome`s through a channel;
/// only `apply` writes their results into the store, so every store mutation happens
/// on the task that owns the synchronizer.
pub struct TreeSynchronizer<L> {
    loader: Arc<L>,
    folder_depth: usize,
    generation: u64,
    in_flight: HashMap<NodeId, Vec<Waiter>>,
    outcome_tx: mpsc::Sender<LoadOutcome>,
    outcome_rx: mpsc::Receiver<LoadOutcome>,
}

impl<L: RemoteLoader> TreeSynchronizer<L> {
    /// `folder_depth` is clamped to 1; a zero depth would ask for nameless records only.
    pub fn new(loader: Arc<L>, folder_depth: usize) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_SIZE);
        Self {
            loader,
            folder_depth: folder_depth.max(1),
            generation: 0,
            in_flight: HashMap::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn is_in_flight(&self, id: NodeId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Makes sure `id` is loaded or on its way to being loaded.
    pub fn request(&mut self, store: &mut NodeStore, id: NodeId) -> Result<LoadStep, NavigatorError> {
        let node = store.get(id)?;
        if node.loaded {
            return Ok(LoadStep::Ready);
        }
        if self.in_flight.contains_key(&id) {
            event!(Level::DEBUG, "Listing for {} already in flight", node.qualified_name);
            return Ok(LoadStep::InFlight);
        }

        if !node.pending_children.is_empty() {
            let buffered = std::mem::take(&mut store.get_mut(id)?.pending_children);
            return match self.materialize_into(store, id, &buffered) {
                Ok(count) => Ok(LoadStep::Materialized(count)),
                Err(e) => {
                    store.get_mut(id)?.pending_children = buffered;
                    Err(e)
                }
            };
        }

        let request = ListingRequest {
            path: (!node.is_root()).then(|| node.url.clone()),
            recursive: true,
            max_depth: self.folder_depth,
        };
        event!(
            Level::INFO,
            "Requesting listing for {:?}",
            request.path.as_deref().unwrap_or("<root>")
        );

        self.in_flight.insert(id, Vec::new());
        let loader = Arc::clone(&self.loader);
        let outcome_tx = self.outcome_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = loader.list_children(request).await;
            let _ = outcome_tx
                .send(LoadOutcome {
                    node: id,
                    generation,
                    result,
                })
                .await;
        });

        Ok(LoadStep::Started)
    }

    /// Registers interest in the completion of an in-flight listing.
    pub fn subscribe(&mut self, id: NodeId) -> Option<oneshot::Receiver<Result<(), NavigatorError>>> {
        let waiters = self.in_flight.get_mut(&id)?;
        let (tx, rx) = oneshot::channel();
        waiters.push(tx);
        Some(rx)
    }

    pub async fn next_outcome(&mut self) -> Option<LoadOutcome> {
        self.outcome_rx.recv().await
    }

    /// Writes a finished listing into the store and resolves everyone waiting on it.
    pub fn apply(&mut self, store: &mut NodeStore, outcome: LoadOutcome) -> Result<Applied, NavigatorError> {
        let LoadOutcome {
            node,
            generation,
            result,
        } = outcome;

        if generation != self.generation {
            event!(Level::DEBUG, "Discarding listing for {} from generation {}", node, generation);
            return Ok(Applied::Discarded(node));
        }

        let waiters = self.in_flight.remove(&node).unwrap_or_default();
        let applied = match store.get(node) {
            Err(_) => Ok(Applied::Discarded(node)),
            Ok(existing) if existing.loaded => Ok(Applied::AlreadyLoaded(node)),
            Ok(_) => result.and_then(|entries| {
                self.materialize_into(store, node, &entries)
                    .map(|count| Applied::Materialized { node, count })
            }),
        };

        if let Err(e) = &applied {
            event!(Level::WARN, "Loading {} failed: {}", node, e);
        }
        let shared = applied.as_ref().map(|_| ()).map_err(Clone::clone);
        for waiter in waiters {
            let _ = waiter.send(shared.clone());
        }
        applied
    }

    /// Forgets every running listing. Their results will be discarded when they arrive.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight.clear();
    }

    /// All-or-nothing: on failure every node created by this call is removed again.
    fn materialize_into(
        &self,
        store: &mut NodeStore,
        id: NodeId,
        entries: &[RawEntry],
    ) -> Result<usize, NavigatorError> {
        match self.materialize_level(store, id, entries, 0) {
            Ok(count) => {
                let node = store.get_mut(id)?;
                node.loaded = true;
                node.pending_children.clear();
                if node.is_root() {
                    node.expanded = true;
                }
                event!(Level::DEBUG, "Materialized {} nodes under {}", count, id);
                Ok(count)
            }
            Err(e) => {
                store.clear_children(id)?;
                Err(e)
            }
        }
    }

    fn materialize_level(
        &self,
        store: &mut NodeStore,
        parent: NodeId,
        entries: &[RawEntry],
        depth: usize,
    ) -> Result<usize, NavigatorError> {
        let mut count = 0;
        for entry in entries.iter().filter(|e| !e.is_stub()) {
            let child = store.create_node(parent, entry)?;
            count += 1;

            let Some(nested) = &entry.children else {
                continue;
            };
            if !store.get(child)?.kind.can_expand() {
                continue;
            }
            // Past the selector's depth: the child fetches its own listing when expanded.
            if nested.iter().any(RawEntry::is_stub) {
                continue;
            }
            if depth + 1 < self.folder_depth {
                count += self.materialize_level(store, child, nested, depth + 1)?;
                store.get_mut(child)?.loaded = true;
            } else {
                store.get_mut(child)?.pending_children = nested.clone();
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::testing::{folder, job, stub, MockLoader, FOLDER, PIPELINE};

    fn setup(loader: &MockLoader, depth: usize) -> (TreeSynchronizer<MockLoader>, NodeStore) {
        (
            TreeSynchronizer::new(Arc::new(loader.clone()), depth),
            NodeStore::new("https://ci"),
        )
    }

    /// Loads a single node, with no other listing running.
    async fn load(
        sync: &mut TreeSynchronizer<MockLoader>,
        store: &mut NodeStore,
        id: NodeId,
    ) -> Result<(), NavigatorError> {
        if let LoadStep::Ready | LoadStep::Materialized(_) = sync.request(store, id)? {
            return Ok(());
        }
        let outcome = sync.next_outcome().await.expect("listing channel open");
        sync.apply(store, outcome).map(|_| ())
    }

    fn labels(store: &NodeStore, id: NodeId) -> Vec<String> {
        store
            .children(id)
            .unwrap()
            .iter()
            .map(|n| n.label.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_root_load_materializes_nested_listing() {
        let loader = MockLoader::new();
        loader.respond(
            None,
            vec![
                folder("teamA", vec![job("build-service"), job("lint")]),
                job("deploy-prod"),
            ],
        );
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        load(&mut sync, &mut store, root).await.unwrap();

        assert_eq!(labels(&store, root), vec!["teamA", "deploy-prod"]);
        let team = store.find_by_name("teamA").unwrap();
        assert!(store.get(team).unwrap().loaded);
        assert_eq!(labels(&store, team), vec!["build-service", "lint"]);
        assert!(store.get(root).unwrap().expanded);
        assert_eq!(loader.calls(), 1);
        assert_eq!(loader.requests()[0].path, None);
        assert!(loader.requests()[0].recursive);
    }

    #[tokio::test]
    async fn test_second_load_makes_no_remote_call() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a")]);
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        load(&mut sync, &mut store, root).await.unwrap();
        load(&mut sync, &mut store, root).await.unwrap();

        assert_eq!(loader.calls(), 1);
        assert_eq!(labels(&store, root), vec!["a"]);
    }

    #[tokio::test]
    async fn test_listing_below_depth_is_buffered_then_materialized_without_fetch() {
        let loader = MockLoader::new();
        loader.respond(
            None,
            vec![folder("outer", vec![folder("inner", vec![job("deep")])])],
        );
        let (mut sync, mut store) = setup(&loader, 1);
        let root = store.root();
        load(&mut sync, &mut store, root).await.unwrap();

        let outer = store.find_by_name("outer").unwrap();
        assert!(!store.get(outer).unwrap().loaded);
        assert_eq!(store.get(outer).unwrap().pending_children.len(), 1);
        assert!(store.child_ids(outer).is_empty());

        assert_eq!(sync.request(&mut store, outer).unwrap(), LoadStep::Materialized(1));
        assert!(store.get(outer).unwrap().loaded);
        assert!(store.get(outer).unwrap().pending_children.is_empty());
        let inner = store.find_by_name("outer/inner").unwrap();
        assert_eq!(store.get(inner).unwrap().pending_children.len(), 1);
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_unfetched_container_asks_loader_for_its_own_listing() {
        let loader = MockLoader::new();
        loader.respond(None, vec![folder_unfetched("infra")]);
        loader.respond(Some("https://ci/job/infra/"), vec![job("terraform")]);
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();
        load(&mut sync, &mut store, root).await.unwrap();

        let infra = store.find_by_name("infra").unwrap();
        load(&mut sync, &mut store, infra).await.unwrap();

        assert_eq!(labels(&store, infra), vec!["terraform"]);
        assert_eq!(
            loader.requests()[1].path.as_deref(),
            Some("https://ci/job/infra/")
        );
    }

    fn folder_unfetched(name: &str) -> RawEntry {
        RawEntry::new(
            name,
            &format!("https://ci/job/{}/", name),
            "com.cloudbees.hudson.plugins.folder.Folder",
        )
    }

    #[tokio::test]
    async fn test_nameless_level_leaves_folder_to_fetch_its_own_listing() {
        let loader = MockLoader::new();
        loader.respond(
            None,
            vec![
                folder("teamA", vec![stub(PIPELINE), stub(FOLDER)]),
                job("deploy-prod"),
            ],
        );
        loader.respond(Some("https://ci/job/teamA/"), vec![job("build-service")]);
        let (mut sync, mut store) = setup(&loader, 1);
        let root = store.root();
        load(&mut sync, &mut store, root).await.unwrap();

        assert_eq!(labels(&store, root), vec!["teamA", "deploy-prod"]);
        let team = store.find_by_name("teamA").unwrap();
        assert!(!store.get(team).unwrap().loaded);
        assert!(store.get(team).unwrap().pending_children.is_empty());
        assert!(store.child_ids(team).is_empty());

        load(&mut sync, &mut store, team).await.unwrap();
        assert_eq!(labels(&store, team), vec!["build-service"]);
        assert_eq!(loader.calls(), 2);
        assert_eq!(
            loader.requests()[1].path.as_deref(),
            Some("https://ci/job/teamA/")
        );
    }

    #[tokio::test]
    async fn test_zero_depth_still_requests_named_entries() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a")]);
        let (mut sync, mut store) = setup(&loader, 0);
        let root = store.root();

        load(&mut sync, &mut store, root).await.unwrap();

        assert_eq!(loader.requests()[0].max_depth, 1);
        assert_eq!(labels(&store, root), vec!["a"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rolls_back_root_load() {
        let loader = MockLoader::new();
        loader.respond(
            None,
            vec![
                folder("teamA", vec![job("x")]),
                job("ok"),
                job("teamA"),
            ],
        );
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        let err = load(&mut sync, &mut store, root).await.unwrap_err();

        assert_eq!(err, NavigatorError::DuplicateName("teamA".to_string()));
        assert!(!store.get(root).unwrap().loaded);
        assert!(store.child_ids(root).is_empty());
        assert_eq!(store.len(), 1);
        assert!(!sync.is_in_flight(root));
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_node_unloaded_and_retryable() {
        let loader = MockLoader::new();
        loader.fail(None, NavigatorError::RemoteUnavailable("401".to_string()));
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        let err = load(&mut sync, &mut store, root).await.unwrap_err();
        assert!(matches!(err, NavigatorError::RemoteUnavailable(_)));
        assert!(!store.get(root).unwrap().loaded);

        loader.respond(None, vec![job("a")]);
        load(&mut sync, &mut store, root).await.unwrap();
        assert_eq!(loader.calls(), 2);
        assert_eq!(labels(&store, root), vec!["a"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_remote_call() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a")]);
        loader.hold();
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        assert_eq!(sync.request(&mut store, root).unwrap(), LoadStep::Started);
        assert_eq!(sync.request(&mut store, root).unwrap(), LoadStep::InFlight);
        let first = sync.subscribe(root).unwrap();
        let second = sync.subscribe(root).unwrap();

        loader.release(1);
        let outcome = sync.next_outcome().await.unwrap();
        sync.apply(&mut store, outcome).unwrap();

        assert_eq!(first.await.unwrap(), Ok(()));
        assert_eq!(second.await.unwrap(), Ok(()));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_result_after_invalidate_is_discarded() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("stale")]);
        loader.hold();
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();

        sync.request(&mut store, root).unwrap();
        sync.invalidate();
        loader.release(1);

        let outcome = sync.next_outcome().await.unwrap();
        assert_eq!(sync.apply(&mut store, outcome).unwrap(), Applied::Discarded(root));
        assert!(store.child_ids(root).is_empty());
        assert!(!store.get(root).unwrap().loaded);
    }

    #[tokio::test]
    async fn test_result_for_removed_node_is_discarded() {
        let loader = MockLoader::new();
        loader.respond(None, vec![folder_unfetched("infra")]);
        let (mut sync, mut store) = setup(&loader, 10);
        let root = store.root();
        load(&mut sync, &mut store, root).await.unwrap();
        let infra = store.find_by_name("infra").unwrap();

        loader.hold();
        sync.request(&mut store, infra).unwrap();
        store.clear_children(root).unwrap();
        loader.release(1);

        let outcome = sync.next_outcome().await.unwrap();
        assert_eq!(sync.apply(&mut store, outcome).unwrap(), Applied::Discarded(infra));
    }
}
