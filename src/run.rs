use crate::cli;
use crate::config::{self, ConfigKey};
use crate::engine::MilestoneDecisionEngine;
use crate::github::client::{DEFAULT_API_URL, GitHubClient, Repository};
use crate::output;
use crate::storage::{self, EnvTokenStorage, FileTokenStorage, TokenStorage};
use anyhow::Context;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

const API_URL_VAR: &str = "GITHUB_API_URL";

/// Entry point shared by the binary and the acceptance tests.
///
/// `env` replaces the process environment and `work_dir` is where the
/// project config file is looked up.
pub async fn run(
    args: Vec<String>,
    mut stdout_additional: Option<&mut dyn std::io::Write>,
    env: &HashMap<String, String>,
    work_dir: &Path,
) -> anyhow::Result<()> {
    match cli::parser::parse_args(&args) {
        cli::parser::Command::Help => {
            output::println(cli::parser::USAGE, &mut stdout_additional)?;
        }
        cli::parser::Command::Run(run_args) => {
            let file_config = config::load_project_config(work_dir)?;
            let merged = config::update_config(&file_config, &config::env_config(env));
            let merged = config::update_config(&merged, &cli_overrides(&run_args));
            let settings = config::resolve(&merged)?;

            let repository = settings
                .repository
                .as_deref()
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "No repository configured. Pass <owner>/<repo> or set GITHUB_REPOSITORY."
                    )
                })
                .and_then(|repo| {
                    Repository::parse(repo).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid repository format: {repo}. Please use <owner>/<repo>."
                        )
                    })
                })?;

            let token = load_token(env)?.ok_or_else(|| {
                anyhow::anyhow!(
                    "No token found. Set GITHUB_TOKEN or write ~/.milestone-closer/token."
                )
            })?;
            let api_url = env
                .get(API_URL_VAR)
                .map(String::as_str)
                .unwrap_or(DEFAULT_API_URL);

            tracing::info!(
                repository = %repository,
                min_issues = settings.options.min_issues,
                reopen_active = settings.options.reopen_active,
                debug_only = settings.options.debug_only,
                state = settings.state.as_str(),
                "starting milestone run"
            );

            let client = GitHubClient::new(api_url, &token, repository.clone(), settings.state)?;
            let engine = MilestoneDecisionEngine::new(client, settings.options);
            let result = engine
                .run(run_args.start_page)
                .await
                .with_context(|| format!("Milestone run for {repository} failed"))?;

            output::println(
                &output::format_report(&result, settings.options.debug_only),
                &mut stdout_additional,
            )?;
        }
        cli::parser::Command::Unknown(message) => {
            return Err(anyhow::anyhow!("{message}\n{}", cli::parser::USAGE));
        }
    }
    Ok(())
}

fn load_token(env: &HashMap<String, String>) -> anyhow::Result<Option<String>> {
    let env_storage = EnvTokenStorage::new(env);
    match env.get("HOME") {
        Some(home) => {
            let file_storage = FileTokenStorage::new(Path::new(home));
            let storages: [&dyn TokenStorage; 2] = [&env_storage, &file_storage];
            storage::load_token(&storages)
        }
        None => env_storage.load(),
    }
}

fn cli_overrides(run_args: &cli::parser::RunArgs) -> HashMap<ConfigKey, Value> {
    let mut overrides = HashMap::new();
    if let Some(repo) = &run_args.repository {
        overrides.insert(ConfigKey::Repository, Value::String(repo.clone()));
    }
    if let Some(min_issues) = run_args.min_issues {
        overrides.insert(ConfigKey::MinIssues, Value::from(min_issues));
    }
    if let Some(reopen_active) = run_args.reopen_active {
        overrides.insert(ConfigKey::ReopenActive, Value::Bool(reopen_active));
    }
    if let Some(debug_only) = run_args.debug_only {
        overrides.insert(ConfigKey::DebugOnly, Value::Bool(debug_only));
    }
    if let Some(state) = run_args.state {
        overrides.insert(ConfigKey::State, Value::String(state.as_str().to_string()));
    }
    overrides
}
