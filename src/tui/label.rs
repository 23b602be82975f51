// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::num::NonZeroUsize;

use lru::LruCache;
use ratatui::prelude::*;

use crate::navigator::{Node, NodeKind};
use crate::theme;

const CACHE_CAPACITY: usize = 4096;

const STATUS_ICONS: &[(&str, &str)] = &[
    ("aborted", "❌"),
    ("aborted_anime", "❌"),
    ("blue", "🔵"),
    ("blue_anime", "🔄"),
    ("disabled", "⭕"),
    ("grey", "⚪"),
    ("notbuilt", "⏳"),
    ("notbuilt_anime", "⏳"),
    ("red", "🔴"),
    ("red_anime", "🔄"),
    ("yellow", "🟡"),
    ("none", "🟣"),
];

/// Everything a tree row depends on. Two equal snapshots always render the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSnapshot {
    pub kind: NodeKind,
    pub label: String,
    pub status: String,
    pub expanded: bool,
    pub loading: bool,
    pub is_cursor: bool,
    pub has_focus: bool,
}

impl LabelSnapshot {
    pub fn of(node: &Node, is_cursor: bool, has_focus: bool, loading: bool) -> Self {
        Self {
            kind: node.kind,
            label: node.label.clone(),
            status: node.status.clone(),
            expanded: node.expanded,
            loading,
            is_cursor,
            has_focus,
        }
    }
}

pub fn status_icon(status: &str) -> &'static str {
    STATUS_ICONS
        .iter()
        .find(|(color, _)| *color == status)
        .map(|(_, icon)| *icon)
        .unwrap_or("?")
}

fn kind_icon(snapshot: &LabelSnapshot) -> &'static str {
    match snapshot.kind {
        NodeKind::Root => "🏠",
        NodeKind::Container if snapshot.expanded => "📂",
        NodeKind::Container => "📁",
        NodeKind::MultiBranchContainer => "🌱",
        NodeKind::Leaf | NodeKind::LegacyLeaf => status_icon(&snapshot.status),
    }
}

pub fn render_label(snapshot: &LabelSnapshot) -> Line<'static> {
    let mut label_style = Style::default().fg(theme::SUBTEXT0);
    if snapshot.is_cursor {
        label_style = if snapshot.has_focus {
            label_style.add_modifier(Modifier::REVERSED)
        } else {
            label_style.bg(theme::SURFACE0)
        };
    }

    let mut spans = vec![
        Span::raw(format!("{} ", kind_icon(snapshot))),
        Span::styled(snapshot.label.clone(), label_style),
    ];
    if snapshot.loading {
        spans.push(Span::styled(
            " …",
            Style::default().fg(theme::YELLOW).add_modifier(Modifier::ITALIC),
        ));
    }
    Line::from(spans)
}

/// Bounded memo of rendered rows.
pub struct LabelCache {
    lines: LruCache<LabelSnapshot, Line<'static>>,
}

impl Default for LabelCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}

impl LabelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    pub fn line(&mut self, snapshot: LabelSnapshot) -> Line<'static> {
        if let Some(line) = self.lines.get(&snapshot) {
            return line.clone();
        }
        let line = render_label(&snapshot);
        self.lines.put(snapshot, line.clone());
        line
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
