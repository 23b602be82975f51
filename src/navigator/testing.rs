// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::errors::NavigatorError;
use crate::jenkins::{ListingRequest, RawEntry, RemoteLoader};

pub const FOLDER: &str = "com.cloudbees.hudson.plugins.folder.Folder";
pub const PIPELINE: &str = "org.jenkinsci.plugins.workflow.job.WorkflowJob";

pub fn job(name: &str) -> RawEntry {
    RawEntry::new(name, &format!("https://ci/job/{}/", name), PIPELINE).with_color("blue")
}

pub fn folder(name: &str, children: Vec<RawEntry>) -> RawEntry {
    RawEntry::new(name, &format!("https://ci/job/{}/", name), FOLDER).with_children(children)
}

/// A record from past the selector's depth: only `_class` is filled in.
pub fn stub(class: &str) -> RawEntry {
    RawEntry::new("", "", class)
}

struct MockState {
    responses: Mutex<HashMap<Option<String>, Result<Vec<RawEntry>, NavigatorError>>>,
    requests: Mutex<Vec<ListingRequest>>,
    gated: AtomicBool,
    gate: Semaphore,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }
}

/// Scriptable loader. Responses are keyed by request path; unknown paths list nothing.
#[derive(Clone, Default)]
pub struct MockLoader {
    state: Arc<MockState>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: Option<&str>, entries: Vec<RawEntry>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.map(str::to_string), Ok(entries));
    }

    pub fn fail(&self, path: Option<&str>, error: NavigatorError) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.map(str::to_string), Err(error));
    }

    /// Every following call blocks until `release` hands it a permit.
    pub fn hold(&self) {
        self.state.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, calls: usize) {
        self.state.gate.add_permits(calls);
    }

    pub fn calls(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ListingRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl RemoteLoader for MockLoader {
    fn list_children(
        &self,
        request: ListingRequest,
    ) -> impl Future<Output = Result<Vec<RawEntry>, NavigatorError>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state.requests.lock().unwrap().push(request.clone());
            if state.gated.load(Ordering::SeqCst) {
                if let Ok(permit) = state.gate.acquire().await {
                    permit.forget();
                }
            }
            let response = state.responses.lock().unwrap().get(&request.path).cloned();
            response.unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
