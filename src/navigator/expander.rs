// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::node::NodeId;
use super::store::NodeStore;
use crate::errors::NavigatorError;

pub struct AncestorExpander;

impl AncestorExpander {
    /// Expands every collapsed ancestor of `id`, root first, and returns the ones it changed.
    ///
    /// An ancestor of an existing node is loaded by construction, so nothing is fetched.
    pub fn expose_node(store: &mut NodeStore, id: NodeId) -> Result<Vec<NodeId>, NavigatorError> {
        let mut ancestors = store.ancestors(id)?;
        ancestors.reverse();

        let mut changed = Vec::new();
        for ancestor in ancestors {
            let node = store.get_mut(ancestor)?;
            debug_assert!(node.loaded, "ancestor {} of {} is not loaded", ancestor, id);
            if !node.expanded {
                node.expanded = true;
                changed.push(ancestor);
            }
        }
        Ok(changed)
    }

    /// Collapses `id` together with every expanded descendant.
    pub fn collapse_subtree(store: &mut NodeStore, id: NodeId) -> Result<Vec<NodeId>, NavigatorError> {
        let mut changed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = store.get_mut(current)?;
            if !node.expanded {
                continue;
            }
            node.expanded = false;
            changed.push(current);
            stack.extend_from_slice(store.child_ids(current));
        }
        Ok(changed)
    }
}
