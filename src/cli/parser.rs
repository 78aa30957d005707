use crate::github::client::Repository;
use crate::github::milestones::StateFilter;

/// Enum representing CLI commands
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(RunArgs),
    Help,
    Unknown(String),
}

/// Arguments of the `run` command. `None` leaves the configured value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub repository: Option<String>,
    pub min_issues: Option<u64>,
    pub reopen_active: Option<bool>,
    pub debug_only: Option<bool>,
    pub state: Option<StateFilter>,
    pub start_page: u32,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            repository: None,
            min_issues: None,
            reopen_active: None,
            debug_only: None,
            state: None,
            start_page: 1,
        }
    }
}

pub const USAGE: &str = "Usage: milestone-closer run [<owner>/<repo>] [--min-issues N] [--[no-]reopen-active] [--[no-]debug-only] [--state open|closed|all] [--start-page N]";

/// Parse command line arguments and return a Command
///
/// # Arguments
/// * `args` - Command line arguments (including program name)
///
/// # Returns
/// * `Command` - The parsed command
pub fn parse_args(args: &[String]) -> Command {
    match args.get(1).map(String::as_str) {
        None | Some("help") | Some("--help") | Some("-h") => Command::Help,
        Some("run") => match parse_run_args(&args[2..]) {
            Ok(run_args) => Command::Run(run_args),
            Err(message) => Command::Unknown(message),
        },
        Some(cmd) => Command::Unknown(cmd.to_string()),
    }
}

fn parse_run_args(args: &[String]) -> Result<RunArgs, String> {
    let mut run_args = RunArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--reopen-active" => run_args.reopen_active = Some(true),
            "--no-reopen-active" => run_args.reopen_active = Some(false),
            "--debug-only" => run_args.debug_only = Some(true),
            "--no-debug-only" => run_args.debug_only = Some(false),
            "--min-issues" => {
                let value = flag_value(&mut iter, arg)?;
                let min_issues = value
                    .parse()
                    .map_err(|_| format!("Invalid value for --min-issues: {value}"))?;
                run_args.min_issues = Some(min_issues);
            }
            "--start-page" => {
                let value = flag_value(&mut iter, arg)?;
                let start_page = value
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| format!("Invalid value for --start-page: {value}"))?;
                run_args.start_page = start_page;
            }
            "--state" => {
                let value = flag_value(&mut iter, arg)?;
                let state = StateFilter::parse(value)
                    .ok_or_else(|| format!("Invalid value for --state: {value}"))?;
                run_args.state = Some(state);
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option {flag}")),
            repo => {
                if run_args.repository.is_some() {
                    return Err(format!("Unexpected argument {repo}"));
                }
                if Repository::parse(repo).is_none() {
                    return Err("Invalid repository format. Please use <owner>/<repo>.".to_string());
                }
                run_args.repository = Some(repo.to_string());
            }
        }
    }

    Ok(run_args)
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {flag}. {USAGE}"))
}
