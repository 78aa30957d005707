use crate::engine::{MilestoneSource, PER_PAGE};
use crate::github::milestones::{self, Milestone, MilestoneState, StateFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "milestone-closer";
const ACCEPT: &str = "application/vnd.github+json";

/// `<owner>/<repo>` pair the client operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parses `<owner>/<repo>`. Both parts must be non-empty.
    pub fn parse(value: &str) -> Option<Repository> {
        let (owner, name) = value.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Repository {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Serialize)]
struct UpdateStateRequest<'a> {
    state: &'a str,
}

/// Milestone listing/update adapter over the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repository: Repository,
    state_filter: StateFilter,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        token: &str,
        repository: Repository,
        state_filter: StateFilter,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(GitHubClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            repository,
            state_filter,
        })
    }

    fn milestones_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/milestones",
            self.api_url, self.repository.owner, self.repository.name
        )
    }
}

#[async_trait]
impl MilestoneSource for GitHubClient {
    async fn list_milestones(&self, page: u32) -> Result<Vec<Milestone>> {
        let url = self.milestones_url();
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("state", self.state_filter.as_str().to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to fetch milestones page {page}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch milestones page {} of {}: HTTP {}",
                page,
                self.repository,
                response.status()
            ));
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read milestones page {page}"))?;
        milestones::parse_milestones(&body)
    }

    async fn update_milestone_state(&self, number: u64, state: MilestoneState) -> Result<()> {
        let url = format!("{}/{}", self.milestones_url(), number);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .json(&UpdateStateRequest {
                state: state.as_str(),
            })
            .send()
            .await
            .with_context(|| format!("Failed to update milestone #{number}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to set milestone #{} of {} to {}: HTTP {}",
                number,
                self.repository,
                state.as_str(),
                response.status()
            ));
        }
        Ok(())
    }
}
