// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use strum_macros::{Display, EnumIter};

use crate::jenkins::RawEntry;

/// Stable identity of a node. Never reused within a `NodeStore`, not even after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum NodeKind {
    Root,
    Container,
    MultiBranchContainer,
    Leaf,
    LegacyLeaf,
}

const CLASSIFIERS: &[(&str, NodeKind)] = &[
    (
        "org.jenkinsci.plugins.workflow.job.WorkflowJob",
        NodeKind::Leaf,
    ),
    ("hudson.model.FreeStyleProject", NodeKind::LegacyLeaf),
    ("hudson.matrix.MatrixProject", NodeKind::LegacyLeaf),
    (
        "com.cloudbees.hudson.plugins.folder.Folder",
        NodeKind::Container,
    ),
    ("jenkins.branch.OrganizationFolder", NodeKind::Container),
    (
        "org.jenkinsci.plugins.workflow.multibranch.WorkflowMultiBranchProject",
        NodeKind::MultiBranchContainer,
    ),
];

impl NodeKind {
    /// Maps a remote `_class` to a kind. Unknown plugin types are browsed as containers.
    pub fn from_classifier(class: &str) -> Self {
        CLASSIFIERS
            .iter()
            .find(|(name, _)| *name == class)
            .map(|(_, kind)| *kind)
            .unwrap_or(NodeKind::Container)
    }

    pub fn can_expand(self) -> bool {
        matches!(
            self,
            NodeKind::Root | NodeKind::Container | NodeKind::MultiBranchContainer
        )
    }

    pub fn can_open(self) -> bool {
        matches!(self, NodeKind::Leaf | NodeKind::LegacyLeaf)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Slash-joined path below the root. Empty for the root itself.
    pub qualified_name: String,
    pub url: String,
    pub kind: NodeKind,
    pub status: String,
    pub pending_children: Vec<RawEntry>,
    pub loaded: bool,
    pub expanded: bool,
    pub parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn root(id: NodeId, url: &str) -> Self {
        Self {
            id,
            label: "home".to_string(),
            qualified_name: String::new(),
            url: url.to_string(),
            kind: NodeKind::Root,
            status: String::new(),
            pending_children: Vec::new(),
            loaded: false,
            expanded: false,
            parent: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }
}
