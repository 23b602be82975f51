// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod client;

use std::future::Future;

use serde::Deserialize;

use crate::errors::NavigatorError;

pub use client::JenkinsClient;

/// One entry of a job listing as returned by the server.
///
/// The innermost level of a recursive listing only carries `_class`, so `name` and
/// `url` are empty there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "_class", default)]
    pub class: String,
    #[serde(default = "default_color", deserialize_with = "color_or_none")]
    pub color: String,
    /// Present only when the server nested the children into this response.
    #[serde(rename = "jobs", default)]
    pub children: Option<Vec<RawEntry>>,
}

impl RawEntry {
    /// True for the nameless records the server returns past the selector's depth.
    pub fn is_stub(&self) -> bool {
        self.name.is_empty()
    }
}

fn default_color() -> String {
    "none".to_string()
}

fn color_or_none<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_color))
}

#[cfg(test)]
impl RawEntry {
    pub fn new(name: &str, url: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            class: class.to_string(),
            color: default_color(),
            children: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn with_children(mut self, children: Vec<RawEntry>) -> Self {
        self.children = Some(children);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    /// Absolute URL of the node whose children are listed. `None` lists the server root.
    pub path: Option<String>,
    pub recursive: bool,
    pub max_depth: usize,
}

/// Source of job listings. The navigator only ever talks to the server through this.
pub trait RemoteLoader: Send + Sync + 'static {
    fn list_children(
        &self,
        request: ListingRequest,
    ) -> impl Future<Output = Result<Vec<RawEntry>, NavigatorError>> + Send;
}
