use crate::engine::RunResult;
use crate::github::milestones::Milestone;
use std::io::{self, Write};

pub fn println(message: &str, writer: &mut Option<&mut dyn Write>) -> io::Result<()> {
    if let Err(e) = writeln!(io::stdout(), "{message}") {
        eprintln!("Failed to write to stdout: {e}");
    }

    if let Some(w) = writer {
        writeln!(w, "{message}")?;
    }

    Ok(())
}

/// Renders the summary printed after a run.
pub fn format_report(result: &RunResult, debug_only: bool) -> String {
    let marker = if debug_only { " (dry run)" } else { "" };
    let mut lines = Vec::new();

    push_section(&mut lines, "Closed", marker, &result.closed);
    push_section(&mut lines, "Reopened", marker, &result.reopened);
    lines.push(format!(
        "Remaining operations: {}",
        result.remaining_operations
    ));

    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, verb: &str, marker: &str, milestones: &[Milestone]) {
    lines.push(format!("{verb} {} milestone(s){marker}", milestones.len()));
    lines.extend(
        milestones
            .iter()
            .map(|m| format!("  #{} {}", m.number, m.title)),
    );
}
