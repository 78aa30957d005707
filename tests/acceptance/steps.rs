use crate::MilestoneWorld;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cucumber::{given, then, when};
use milestone_closer::engine::{MilestoneDecisionEngine, MilestoneSource, ProcessingOptions};
use milestone_closer::github::milestones::{Milestone, MilestoneState};
use std::collections::HashMap;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory source serving the pages set up by the scenario.
struct ScenarioSource {
    pages: Vec<Vec<Milestone>>,
    endless: bool,
}

#[async_trait]
impl MilestoneSource for ScenarioSource {
    async fn list_milestones(&self, page: u32) -> anyhow::Result<Vec<Milestone>> {
        if self.endless {
            return Ok(vec![milestone(u64::from(page), "busy", 1, 0, "open")]);
        }
        Ok(self
            .pages
            .get((page as usize).saturating_sub(1))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_milestone_state(
        &self,
        _number: u64,
        _state: MilestoneState,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

fn milestone(number: u64, title: &str, open: u64, closed: u64, state: &str) -> Milestone {
    Milestone {
        id: 5000 + number,
        number,
        title: title.to_string(),
        description: None,
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        open_issues: open,
        closed_issues: closed,
        state: match state {
            "open" => MilestoneState::Open,
            "closed" => MilestoneState::Closed,
            other => panic!("Unknown milestone state {other}"),
        },
    }
}

fn milestone_json(m: &Milestone) -> serde_json::Value {
    serde_json::json!({
        "id": m.id,
        "number": m.number,
        "title": m.title,
        "description": m.description,
        "open_issues": m.open_issues,
        "closed_issues": m.closed_issues,
        "state": m.state.as_str(),
        "updated_at": m.updated_at.to_rfc3339(),
    })
}

fn options(world: &MilestoneWorld) -> ProcessingOptions {
    ProcessingOptions {
        min_issues: world.min_issues,
        reopen_active: world.reopen_active,
        debug_only: world.debug_only,
    }
}

fn result(world: &MilestoneWorld) -> &milestone_closer::engine::RunResult {
    world
        .result
        .as_ref()
        .expect("The engine has not been run in this scenario")
}

#[given(regex = r"^the minimum issue count is (\d+)$")]
async fn given_min_issues(world: &mut MilestoneWorld, min_issues: u64) {
    world.min_issues = min_issues;
}

#[given("reopening active milestones is enabled")]
async fn given_reopen_active(world: &mut MilestoneWorld) {
    world.reopen_active = true;
}

#[given("debug-only mode is enabled")]
async fn given_debug_only(world: &mut MilestoneWorld) {
    world.debug_only = true;
}

#[given(
    regex = r#"^page (\d+) has milestone #(\d+) "([^"]*)" with (\d+) open and (\d+) closed issues in state (open|closed)$"#
)]
async fn given_milestone_on_page(
    world: &mut MilestoneWorld,
    page: usize,
    number: u64,
    title: String,
    open: u64,
    closed: u64,
    state: String,
) {
    assert!(page >= 1, "Pages start at 1");
    if world.pages.len() < page {
        world.pages.resize(page, Vec::new());
    }
    world.pages[page - 1].push(milestone(number, &title, open, closed, &state));
}

#[given("the repository has no milestones")]
async fn given_no_milestones(world: &mut MilestoneWorld) {
    world.pages.clear();
}

#[given("the repository returns a non-empty page for every page number")]
async fn given_endless_pages(world: &mut MilestoneWorld) {
    world.endless = true;
}

#[given(regex = r"^the operation budget is (\d+)$")]
async fn given_budget(world: &mut MilestoneWorld, budget: u32) {
    world.budget = Some(budget);
}

#[when("the engine runs from page 1")]
async fn when_engine_runs(world: &mut MilestoneWorld) {
    let source = ScenarioSource {
        pages: world.pages.clone(),
        endless: world.endless,
    };
    let engine = match world.budget {
        Some(budget) => MilestoneDecisionEngine::with_budget(source, options(world), budget),
        None => MilestoneDecisionEngine::new(source, options(world)),
    };
    world.result = Some(engine.run(1).await.expect("Engine run should succeed"));
}

#[when(regex = r"^I run `milestone-closer (.*)` against a mock GitHub API$")]
async fn when_run_against_mock(world: &mut MilestoneWorld, command_line: String) {
    let server = MockServer::start().await;
    for (index, page) in world.pages.iter().enumerate() {
        let body: Vec<serde_json::Value> = page.iter().map(milestone_json).collect();
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/milestones"))
            .and(query_param("page", (index + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/milestones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let env = HashMap::from([
        ("GITHUB_TOKEN".to_string(), "test-token".to_string()),
        ("GITHUB_API_URL".to_string(), server.uri()),
    ]);
    let work_dir = std::env::temp_dir().join("milestone-closer-acceptance");
    let args: Vec<String> = std::iter::once("milestone-closer".to_string())
        .chain(command_line.split_whitespace().map(str::to_string))
        .collect();

    let mut buffer: Vec<u8> = Vec::new();
    let writer_option: Option<&mut dyn std::io::Write> = Some(&mut buffer);
    let outcome = milestone_closer::run::run(args, writer_option, &env, &work_dir).await;

    world.captured_output = buffer;
    world.run_error = outcome.err().map(|e| format!("{e:#}"));
    world.update_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .count();
}

#[then(regex = r"^(\d+) milestones? (?:is|are) closed$")]
async fn then_closed_count(world: &mut MilestoneWorld, count: usize) {
    let closed = &result(world).closed;
    assert_eq!(closed.len(), count, "Closed milestones: {closed:?}");
}

#[then(regex = r"^(\d+) milestones? (?:is|are) reopened$")]
async fn then_reopened_count(world: &mut MilestoneWorld, count: usize) {
    let reopened = &result(world).reopened;
    assert_eq!(reopened.len(), count, "Reopened milestones: {reopened:?}");
}

#[then(regex = r"^milestone #(\d+) is in the (closed|reopened) list$")]
async fn then_milestone_in_list(world: &mut MilestoneWorld, number: u64, list: String) {
    let run = result(world);
    let milestones = if list == "closed" {
        &run.closed
    } else {
        &run.reopened
    };
    assert!(
        milestones.iter().any(|m| m.number == number),
        "Milestone #{number} not found in {list} list: {milestones:?}"
    );
}

#[then(regex = r"^the remaining operations are (\d+)$")]
async fn then_remaining(world: &mut MilestoneWorld, remaining: u32) {
    assert_eq!(result(world).remaining_operations, remaining);
}

#[then(regex = r#"^the output should contain "(.*)"$"#)]
async fn then_output_contains(world: &mut MilestoneWorld, expected: String) {
    assert!(
        world.run_error.is_none(),
        "Run failed: {:?}",
        world.run_error
    );
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert!(
        output.contains(&expected),
        "Expected '{}' in output:\n---\n{}\n---",
        expected,
        output
    );
}

#[then(regex = r"^the output should list milestone numbers (.*)$")]
async fn then_output_lists_numbers(world: &mut MilestoneWorld, numbers: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    let re = regex::Regex::new(r"(?m)^  #(\d+) ").unwrap();
    let listed: Vec<String> = re
        .captures_iter(&output)
        .map(|c| c[1].to_string())
        .collect();
    let expected: Vec<String> = numbers.split(", ").map(str::to_string).collect();
    assert_eq!(listed, expected, "Output was:\n{output}");
}

#[then(regex = r"^(\d+) milestone updates? should have been sent$")]
async fn then_update_requests(world: &mut MilestoneWorld, count: usize) {
    assert_eq!(world.update_requests, count);
}
