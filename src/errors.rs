// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

use crate::navigator::NodeId;

/// Errors raised by the navigator core and the remote loader.
///
/// `Clone` is required because a single in-flight listing result is handed to
/// every caller that was waiting on the same node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigatorError {
    #[error("The Jenkins server could not be reached: {0}")]
    RemoteUnavailable(String),
    #[error("Two entries resolve to the same name: {0}")]
    DuplicateName(String),
    #[error("Node {0} does not exist in the current tree.")]
    NotFound(NodeId),
}

impl From<reqwest::Error> for NavigatorError {
    fn from(e: reqwest::Error) -> Self {
        NavigatorError::RemoteUnavailable(e.to_string())
    }
}
