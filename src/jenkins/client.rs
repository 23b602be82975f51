// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::future::Future;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{event, Level};

use super::{ListingRequest, RawEntry, RemoteLoader};
use crate::config::Settings;
use crate::errors::NavigatorError;

const VERSION_HEADER: &str = "X-Jenkins";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerInfo {
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobInfo {
    pub display_name: String,
    pub description: Option<String>,
    pub health_report: Vec<HealthReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub description: String,
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<RawEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RootResponse {
    description: Option<String>,
}

/// Basic-auth HTTP client for the Jenkins JSON API.
///
/// Cheap to clone; every clone shares the same connection pool.
#[derive(Clone, Debug)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl JenkinsClient {
    pub fn new(settings: &Settings) -> Result<Self, NavigatorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            credentials: settings
                .has_credentials()
                .then(|| (settings.username.clone(), settings.password.clone())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the server version and description from the root endpoint.
    pub async fn server_info(&self) -> Result<ServerInfo, NavigatorError> {
        let url = format!("{}/api/json", self.base_url);
        let response = self.get(&url).await?;
        let version = version_from_headers(response.headers())?;
        let body: RootResponse = response.json().await?;

        Ok(ServerInfo {
            version,
            description: body.description.unwrap_or_default(),
        })
    }

    /// Fetches the top level information shown in a job's detail view.
    pub async fn job_info(&self, job_url: &str) -> Result<JobInfo, NavigatorError> {
        let url = format!(
            "{}api/json?tree=displayName,description,healthReport[description]",
            with_trailing_slash(job_url)
        );
        let response = self.get(&url).await?;
        Ok(response.json().await?)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, NavigatorError> {
        event!(Level::DEBUG, "GET {}", url);
        let mut request = self.http.get(url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            event!(Level::WARN, "Jenkins answered {} for {}", status, url);
            return Err(NavigatorError::RemoteUnavailable(format!(
                "{} returned {}",
                url, status
            )));
        }
        Ok(response)
    }

    fn listing_url(&self, request: &ListingRequest) -> String {
        let base = match &request.path {
            Some(path) => with_trailing_slash(path),
            None => format!("{}/", self.base_url),
        };
        format!(
            "{}api/json?tree={}",
            base,
            jobs_tree_query(request.recursive, request.max_depth)
        )
    }
}

impl RemoteLoader for JenkinsClient {
    fn list_children(
        &self,
        request: ListingRequest,
    ) -> impl Future<Output = Result<Vec<RawEntry>, NavigatorError>> + Send {
        let url = self.listing_url(&request);
        let client = self.clone();
        async move {
            let response = client.get(&url).await?;
            let body: JobsResponse = response.json().await?;
            event!(
                Level::DEBUG,
                "Listing {:?} returned {} top level entries",
                request.path,
                body.jobs.len()
            );
            Ok(body.jobs)
        }
    }
}

/// Builds the `tree=` selector. A recursive selector nests `jobs[...]` once per level.
pub fn jobs_tree_query(recursive: bool, max_depth: usize) -> String {
    if !recursive {
        return "jobs[url,color,name]".to_string();
    }
    let mut query = "jobs".to_string();
    for _ in 0..max_depth {
        query = format!("jobs[url,color,name,{}]", query);
    }
    query
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn version_from_headers(headers: &HeaderMap) -> Result<String, NavigatorError> {
    headers
        .get(VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            NavigatorError::RemoteUnavailable(format!(
                "response is missing the {} header; is this a Jenkins server?",
                VERSION_HEADER
            ))
        })
}
