//! Environment-wide commands.

use anyhow::Result;

use crate::output::{print_single, print_success, print_warning, OutputFormat};

use super::CommandContext;

/// Tear down every simulated instrument and wait for convergence.
pub async fn reset(ctx: CommandContext) -> Result<()> {
    let harness = ctx.harness()?;
    let report = harness.reset_environment().await?;

    match ctx.format {
        OutputFormat::Json => print_single(&report),
        OutputFormat::Table if report.is_noop() => {
            print_success("Environment already clean");
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Deleted {} instrument(s), released {}, suppressed {}",
                report.deleted, report.released, report.suppressed
            ));
            if report.failures() > 0 {
                print_warning(&format!(
                    "{} item(s) failed and were left for the next reset",
                    report.failures()
                ));
            }
        }
    }
    Ok(())
}

/// Cancel running lab requests and release their instruments.
pub async fn cancel_runs(ctx: CommandContext) -> Result<()> {
    let harness = ctx.harness()?;
    let report = harness.cancel_running_lab_requests().await?;

    match ctx.format {
        OutputFormat::Json => print_single(&report),
        OutputFormat::Table if report.runs == 0 => print_success("No running lab requests"),
        OutputFormat::Table => {
            print_success(&format!(
                "Cancelled {} of {} run(s), released {} instrument(s)",
                report.cancelled, report.runs, report.released
            ));
            if report.cancel_failures + report.release_failures > 0 {
                print_warning(&format!(
                    "{} cancel and {} release call(s) failed",
                    report.cancel_failures, report.release_failures
                ));
            }
        }
    }
    Ok(())
}
