// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::navigator::{Node, NodeId, NodeStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeViewState {
    pub cursor: Option<NodeId>,
    pub top_most_offset: usize,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem<'a> {
    pub node: &'a Node,
    pub depth: usize,
    pub is_last: bool,
    pub is_cursor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeAction {
    Up,
    Down,
    Left,
    Right,
    Activate,
}

/// What the caller has to do after a key was applied to the tree view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeCommand {
    Nothing,
    Moved,
    /// The key means a click on this node; route it through the navigator.
    Activate(NodeId),
}

pub struct TreeMathHelper;

impl TreeMathHelper {
    pub fn get_visible_slice<'a>(
        store: &'a NodeStore,
        state: &TreeViewState,
        max_height: usize,
    ) -> Vec<RenderItem<'a>> {
        let full_list = Self::project(store, state);

        let start = state.top_most_offset.min(full_list.len());
        let end = (start + max_height).min(full_list.len());

        if start < end {
            full_list[start..end].to_vec()
        } else {
            Vec::new()
        }
    }

    pub fn apply_action(
        state: &mut TreeViewState,
        store: &NodeStore,
        action: TreeAction,
        max_height: usize,
    ) -> TreeCommand {
        let full_list = Self::project(store, state);
        Self::handle_action(state, &full_list, action, max_height)
    }

    /// Puts the cursor on `id` and scrolls it into view. `id` has to be visible already.
    pub fn reveal(state: &mut TreeViewState, store: &NodeStore, id: NodeId, max_height: usize) {
        let full_list = Self::project(store, state);
        if let Some(idx) = full_list.iter().position(|item| item.node.id == id) {
            state.cursor = Some(id);
            Self::scroll_to(state, idx, max_height);
        }
    }

    /// The root followed by the children of every expanded node, depth first.
    pub fn project<'a>(store: &'a NodeStore, state: &TreeViewState) -> Vec<RenderItem<'a>> {
        let mut output = Vec::new();
        if let Ok(root) = store.get(store.root()) {
            output.push(RenderItem {
                node: root,
                depth: 0,
                is_last: true,
                is_cursor: Self::is_cursor(state, root.id, true),
            });
            if root.expanded {
                Self::project_recursive(store, root.id, state, 1, &mut output);
            }
        }
        output
    }

    fn project_recursive<'a>(
        store: &'a NodeStore,
        parent: NodeId,
        state: &TreeViewState,
        depth: usize,
        output: &mut Vec<RenderItem<'a>>,
    ) {
        let children = store.child_ids(parent);
        let len = children.len();
        for (i, id) in children.iter().enumerate() {
            let Ok(node) = store.get(*id) else {
                continue;
            };
            output.push(RenderItem {
                node,
                depth,
                is_last: i == len - 1,
                is_cursor: Self::is_cursor(state, node.id, false),
            });

            if node.expanded {
                Self::project_recursive(store, node.id, state, depth + 1, output);
            }
        }
    }

    /// With no cursor yet, the root row carries it.
    fn is_cursor(state: &TreeViewState, id: NodeId, is_root: bool) -> bool {
        match state.cursor {
            Some(cursor) => cursor == id,
            None => is_root,
        }
    }

    fn handle_action(
        state: &mut TreeViewState,
        full_list: &[RenderItem<'_>],
        action: TreeAction,
        max_height: usize,
    ) -> TreeCommand {
        if full_list.is_empty() {
            return TreeCommand::Nothing;
        }

        let current_idx = state
            .cursor
            .and_then(|id| full_list.iter().position(|item| item.node.id == id))
            .unwrap_or(0);
        let item = &full_list[current_idx];

        let mut new_idx = current_idx;
        let mut command = TreeCommand::Moved;

        match action {
            TreeAction::Up => new_idx = current_idx.saturating_sub(1),
            TreeAction::Down => {
                if current_idx < full_list.len() - 1 {
                    new_idx = current_idx + 1;
                }
            }
            TreeAction::Activate => command = TreeCommand::Activate(item.node.id),
            TreeAction::Right => {
                if item.node.kind.can_expand() {
                    if !item.node.expanded {
                        command = TreeCommand::Activate(item.node.id);
                    } else if current_idx < full_list.len() - 1 {
                        let next_item = &full_list[current_idx + 1];
                        if next_item.depth > item.depth {
                            new_idx = current_idx + 1;
                        }
                    }
                }
            }
            TreeAction::Left => {
                if item.node.kind.can_expand() && item.node.expanded && !item.node.is_root() {
                    command = TreeCommand::Activate(item.node.id);
                } else if item.depth > 0 {
                    let parent = full_list[0..current_idx]
                        .iter()
                        .rposition(|x| x.depth == item.depth - 1);
                    if let Some(p) = parent {
                        new_idx = p;
                    }
                }
            }
        }

        state.cursor = Some(full_list[new_idx].node.id);
        Self::scroll_to(state, new_idx, max_height);
        command
    }

    fn scroll_to(state: &mut TreeViewState, idx: usize, max_height: usize) {
        let effective_height = max_height.max(1);
        if idx < state.top_most_offset {
            state.top_most_offset = idx;
        } else if idx >= state.top_most_offset + effective_height {
            state.top_most_offset = (idx + 1).saturating_sub(effective_height);
        }
    }
}
