use anyhow::Result;
use git_sweep::{DeletionResult, Plan};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};

/// Single JSON document for a run that went on to delete
#[derive(Serialize)]
struct SweepReport<'a> {
    plan: &'a Plan,
    result: &'a DeletionResult,
}

pub fn render_plan(out: &mut impl Write, plan: &Plan, unmerged: &[String]) -> io::Result<()> {
    writeln!(out, "📂 {}", plan.repo_root)?;
    writeln!(out, "🌿 On branch {}", plan.current_branch)?;
    if plan.current_upstream.is_empty() {
        writeln!(out, "   (no upstream configured)")?;
    } else {
        writeln!(out, "   tracking {}", plan.current_upstream)?;
    }
    writeln!(out)?;

    if plan.candidates.is_empty() {
        writeln!(out, "✨ Nothing to sweep: no local branch has a gone upstream on {}", plan.remote)?;
        return Ok(());
    }

    writeln!(out, "🧹 Branches whose upstream is gone on {}:", plan.remote)?;
    for branch in &plan.candidates {
        let upstream = if branch.upstream.is_empty() {
            String::new()
        } else {
            format!(" (was {})", branch.upstream)
        };
        let marker = if unmerged.contains(&branch.name) {
            "  ⚠️  not merged, needs --force"
        } else {
            ""
        };
        writeln!(out, "   - {}{}{}", branch.name, upstream, marker)?;
    }
    writeln!(out)?;
    writeln!(out, "{} branch(es) to delete", plan.candidates.len())?;
    Ok(())
}

pub fn render_deletion_result(out: &mut impl Write, result: &DeletionResult) -> io::Result<()> {
    if !result.deleted.is_empty() {
        writeln!(out, "✅ Deleted {} branch(es):", result.deleted.len())?;
        for name in &result.deleted {
            writeln!(out, "   - {}", name)?;
        }
    }
    if !result.failed.is_empty() {
        writeln!(out, "❌ Failed to delete {} branch(es):", result.failed.len())?;
        for (name, error) in &result.failed {
            writeln!(out, "   - {}: {}", name, error)?;
        }
    }
    Ok(())
}

pub fn print_plan(plan: &Plan, unmerged: &[String], json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(plan)?)?;
    } else {
        render_plan(&mut stdout, plan, unmerged)?;
    }
    Ok(())
}

pub fn print_report(plan: &Plan, result: &DeletionResult) -> Result<()> {
    let report = SweepReport { plan, result };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn print_deletion_result(result: &DeletionResult) -> Result<()> {
    let mut stdout = io::stdout().lock();
    render_deletion_result(&mut stdout, result)?;
    Ok(())
}

/// Ask before deleting. Without an interactive stdin the answer is no.
pub fn confirm_deletion(count: usize) -> Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        eprintln!("stdin is not a terminal; re-run with --yes to delete");
        return Ok(false);
    }

    print!("Delete {} branch(es)? [y/N] ", count);
    io::stdout().flush()?;

    let mut input = String::new();
    stdin.lock().read_line(&mut input)?;
    Ok(is_affirmative(&input))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
