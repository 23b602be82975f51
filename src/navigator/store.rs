// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use super::node::{Node, NodeId, NodeKind};
use crate::errors::NavigatorError;
use crate::jenkins::RawEntry;

/// Owner of every node in the tree and of the parent/child edges between them.
#[derive(Debug)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<NodeId, Vec<NodeId>>,
    names: HashMap<String, NodeId>,
    root: NodeId,
    next_id: u64,
}

impl NodeStore {
    pub fn new(server_url: &str) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::root(root, server_url));

        Self {
            nodes,
            edges: HashMap::new(),
            names: HashMap::new(),
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, NavigatorError> {
        self.nodes.get(&id).ok_or(NavigatorError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, NavigatorError> {
        self.nodes.get_mut(&id).ok_or(NavigatorError::NotFound(id))
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_by_name(&self, qualified_name: &str) -> Option<NodeId> {
        self.names.get(qualified_name).copied()
    }

    /// Creates a node for `entry` under `parent`.
    ///
    /// The new node starts unloaded and collapsed unless it is a leaf, which has
    /// nothing to load.
    pub fn create_node(
        &mut self,
        parent: NodeId,
        entry: &RawEntry,
    ) -> Result<NodeId, NavigatorError> {
        let parent_name = self.get(parent)?.qualified_name.clone();
        let label = decode_name(&entry.name);
        let qualified_name = if parent_name.is_empty() {
            label.clone()
        } else {
            format!("{}/{}", parent_name, label)
        };

        if self.names.contains_key(&qualified_name) {
            return Err(NavigatorError::DuplicateName(qualified_name));
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let kind = NodeKind::from_classifier(&entry.class);
        let node = Node {
            id,
            label,
            qualified_name: qualified_name.clone(),
            url: entry.url.clone(),
            kind,
            status: entry.color.clone(),
            pending_children: Vec::new(),
            loaded: !kind.can_expand(),
            expanded: false,
            parent: Some(parent),
        };

        self.nodes.insert(id, node);
        self.names.insert(qualified_name, id);
        self.edges.entry(parent).or_default().push(id);
        Ok(id)
    }

    /// Children in listing order.
    pub fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<&Node>, NavigatorError> {
        self.get(id)?;
        Ok(self
            .child_ids(id)
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect())
    }

    /// Removes every descendant of `id`. Their identities become permanently invalid.
    pub fn clear_children(&mut self, id: NodeId) -> Result<usize, NavigatorError> {
        self.get(id)?;
        let mut removed = 0;
        let mut stack = self.edges.remove(&id).unwrap_or_default();
        while let Some(child) = stack.pop() {
            if let Some(grandchildren) = self.edges.remove(&child) {
                stack.extend(grandchildren);
            }
            if let Some(node) = self.nodes.remove(&child) {
                self.names.remove(&node.qualified_name);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Ancestors of `id`, nearest first, ending with the root.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, NavigatorError> {
        let mut out = Vec::new();
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.get(parent)?.parent;
        }
        Ok(out)
    }

    /// All non-root nodes in depth-first listing order.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = &Node> + '_ {
        let mut stack: Vec<NodeId> = self.child_ids(self.root).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.child_ids(id).iter().rev().copied());
            self.nodes.get(&id)
        })
    }
}

fn decode_name(name: &str) -> String {
    urlencoding::decode(name)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| name.to_string())
}
