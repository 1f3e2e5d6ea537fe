use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

mod cli;

use cli::{output, Cli};
use git_sweep::{
    build_plan, create_sweep_span, execute_deletions, generate_correlation_id, init_telemetry, unmerged_candidates,
    ExecuteOptions, GitClient, PlanOptions, ProcessCommandExecutor, RunContext, SweepConfig,
};

/// Every attempted deletion failed
const EXIT_ALL_FAILED: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    SweepConfig::load_env_file()?;
    let mut config = SweepConfig::load()?;
    cli.apply_to(&mut config);

    init_telemetry(&config.observability.log_level, config.observability.json_logs)?;

    let ctx = match config.timeout() {
        Some(timeout) => RunContext::with_timeout(timeout),
        None => RunContext::new(),
    };

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding git commands");
            interrupt.cancel();
        }
    });

    let correlation_id = generate_correlation_id();
    let span = create_sweep_span("sweep", &config.remote, &correlation_id);
    sweep(&cli, &config, &ctx).instrument(span).await
}

async fn sweep(cli: &Cli, config: &SweepConfig, ctx: &RunContext) -> Result<ExitCode> {
    let git = GitClient::new(Arc::new(ProcessCommandExecutor::git()));

    let version = git.version(ctx).await.context("git is not available on PATH")?;
    debug!(%version, "Using git");

    let plan_opts = PlanOptions {
        remote: config.remote.clone(),
        include_pattern: cli.include.clone(),
        exclude_pattern: cli.exclude.clone(),
        extra_protected: config.extra_protected.clone(),
        protect_upstream: config.protect_upstream,
    };
    let plan = build_plan(&git, ctx, &plan_opts).await?;
    info!(candidates = plan.candidates.len(), "Plan ready");

    let will_delete = !cli.dry_run && !plan.candidates.is_empty() && cli.yes;

    if cli.json {
        if !will_delete {
            output::print_plan(&plan, &[], true)?;
            return Ok(ExitCode::SUCCESS);
        }
    } else {
        let unmerged = if cli.force || plan.candidates.is_empty() {
            Vec::new()
        } else {
            unmerged_candidates(&git, ctx, &plan).await.unwrap_or_else(|e| {
                debug!(error = %e, "Merge check failed, not marking unmerged branches");
                Vec::new()
            })
        };
        output::print_plan(&plan, &unmerged, false)?;

        if cli.dry_run || plan.candidates.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }
        if !cli.yes && !output::confirm_deletion(plan.candidates.len())? {
            println!("Nothing deleted.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let exec_opts = ExecuteOptions {
        max_parallel: config.max_parallel.unwrap_or(0),
        force_delete: cli.force,
    };
    let result = execute_deletions(&git, ctx, &plan, exec_opts).await?;

    if cli.json {
        output::print_report(&plan, &result)?;
    } else {
        output::print_deletion_result(&result)?;
    }

    if result.all_failed() {
        return Ok(ExitCode::from(EXIT_ALL_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}
