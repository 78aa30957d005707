use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub open_issues: u64,
    pub closed_issues: u64,
    pub state: MilestoneState,
}

impl Milestone {
    pub fn total_issues(&self) -> u64 {
        self.open_issues.saturating_add(self.closed_issues)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    Open,
    Closed,
}

impl MilestoneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneState::Open => "open",
            MilestoneState::Closed => "closed",
        }
    }
}

/// Listing filter for the milestones endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<StateFilter> {
        match value {
            "open" => Some(StateFilter::Open),
            "closed" => Some(StateFilter::Closed),
            "all" => Some(StateFilter::All),
            _ => None,
        }
    }
}

/// Parses one page of the `GET /repos/{owner}/{repo}/milestones` response.
///
/// A record that does not match the milestone shape fails the whole page.
pub fn parse_milestones(body: &[u8]) -> Result<Vec<Milestone>> {
    serde_json::from_slice(body).context("Failed to parse milestones response")
}
