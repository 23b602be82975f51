// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::node::{Node, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ShowHome,
    AlreadyHome,
    Open,
    Refocus,
    Expand,
    Collapse,
}

/// Decides what an activation of a node means, remembering which node is open.
///
/// The open node is remembered by qualified name so the decision survives a refresh
/// that hands out new identities for the same jobs.
#[derive(Debug, Default)]
pub struct SelectionRouter {
    current: String,
}

impl SelectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified name of the open node; empty while home is shown.
    #[cfg(test)]
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_home(&self) -> bool {
        self.current.is_empty()
    }

    pub fn route(&mut self, node: &Node) -> Route {
        match node.kind {
            NodeKind::Root => {
                if self.is_home() {
                    Route::AlreadyHome
                } else {
                    self.current.clear();
                    Route::ShowHome
                }
            }
            kind if kind.can_open() => {
                if self.current == node.qualified_name {
                    Route::Refocus
                } else {
                    self.current = node.qualified_name.clone();
                    Route::Open
                }
            }
            _ => {
                if node.expanded {
                    Route::Collapse
                } else {
                    Route::Expand
                }
            }
        }
    }
}
