use crate::github::milestones::{Milestone, MilestoneState};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Maximum number of page fetches in one run.
pub const OPERATION_BUDGET: u32 = 100;
/// Milestones requested per page.
pub const PER_PAGE: u32 = 100;

/// Listing and update capability the engine runs against.
#[async_trait]
pub trait MilestoneSource: Send + Sync {
    /// Fetch one page of milestones. An empty page ends the run.
    async fn list_milestones(&self, page: u32) -> Result<Vec<Milestone>>;
    /// Set the state of the milestone with the given number.
    async fn update_milestone_state(&self, number: u64, state: MilestoneState) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub min_issues: u64,
    pub reopen_active: bool,
    pub debug_only: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        ProcessingOptions {
            min_issues: 1,
            reopen_active: false,
            debug_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunResult {
    pub closed: Vec<Milestone>,
    pub reopened: Vec<Milestone>,
    pub remaining_operations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewIssues,
    StillActive,
    ReopenDisabled,
    AlreadyClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Close,
    Reopen,
}

/// Decides what to do with a single milestone. First matching rule wins.
pub fn classify(milestone: &Milestone, options: &ProcessingOptions) -> Decision {
    if milestone.total_issues() < options.min_issues {
        return Decision::Skip(SkipReason::TooFewIssues);
    }

    match (milestone.open_issues > 0, milestone.state) {
        (true, MilestoneState::Open) => Decision::Skip(SkipReason::StillActive),
        (true, MilestoneState::Closed) if options.reopen_active => Decision::Reopen,
        (true, MilestoneState::Closed) => Decision::Skip(SkipReason::ReopenDisabled),
        (false, MilestoneState::Open) => Decision::Close,
        // A closed milestone without open issues stays closed.
        (false, MilestoneState::Closed) => Decision::Skip(SkipReason::AlreadyClosed),
    }
}

pub struct MilestoneDecisionEngine<S> {
    source: S,
    options: ProcessingOptions,
    budget: u32,
}

impl<S: MilestoneSource> MilestoneDecisionEngine<S> {
    pub fn new(source: S, options: ProcessingOptions) -> Self {
        Self::with_budget(source, options, OPERATION_BUDGET)
    }

    pub fn with_budget(source: S, options: ProcessingOptions, budget: u32) -> Self {
        MilestoneDecisionEngine {
            source,
            options,
            budget,
        }
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }

    /// Walks the pages starting at `start_page` until an empty page comes
    /// back or the operation budget runs out.
    ///
    /// Any failed fetch or update aborts the run; actions already applied
    /// are not rolled back.
    pub async fn run(&self, start_page: u32) -> Result<RunResult> {
        let mut result = RunResult {
            remaining_operations: self.budget,
            ..RunResult::default()
        };
        let mut page = start_page;

        loop {
            if result.remaining_operations == 0 {
                tracing::warn!(page, "operation budget exhausted, stopping");
                return Ok(result);
            }
            result.remaining_operations -= 1;

            let milestones = self.source.list_milestones(page).await?;
            tracing::info!(
                page,
                count = milestones.len(),
                remaining = result.remaining_operations,
                "fetched milestones"
            );
            if milestones.is_empty() {
                return Ok(result);
            }

            for milestone in milestones {
                self.process(milestone, &mut result).await?;
            }
            page = page
                .checked_add(1)
                .with_context(|| format!("Page number overflow after page {page}"))?;
        }
    }

    async fn process(&self, milestone: Milestone, result: &mut RunResult) -> Result<()> {
        let target = match classify(&milestone, &self.options) {
            Decision::Skip(reason) => {
                tracing::debug!(number = milestone.number, ?reason, "skipping milestone");
                return Ok(());
            }
            Decision::Close => MilestoneState::Closed,
            Decision::Reopen => MilestoneState::Open,
        };

        tracing::info!(
            number = milestone.number,
            title = %milestone.title,
            state = target.as_str(),
            debug_only = self.options.debug_only,
            "changing milestone state"
        );

        let number = milestone.number;
        match target {
            MilestoneState::Closed => result.closed.push(milestone),
            MilestoneState::Open => result.reopened.push(milestone),
        }

        if !self.options.debug_only {
            self.source.update_milestone_state(number, target).await?;
        }
        Ok(())
    }
}
