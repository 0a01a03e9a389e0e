//! Validate command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{
    CliOutput, Invocation, error_json, format_error_output, format_error_text, json_output,
};
use embed_preflight_app::ValidationOutcome;
use embed_preflight_infra::{block_on, run_preflight_with_env};
use embed_preflight_shared::RequestContext;

/// Run every preflight check against the process environment.
pub fn run_validate(invocation: &Invocation) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_run();
    let outcome = block_on(run_preflight_with_env(
        &ctx,
        &invocation.env,
        invocation.config_path.as_deref(),
        Some(invocation.logger()),
    ));
    match outcome {
        Ok(outcome) => format_outcome(invocation.mode, &outcome),
        Err(error) => Ok(format_error_output(invocation.mode, &error)),
    }
}

fn format_outcome(mode: OutputMode, outcome: &ValidationOutcome) -> Result<CliOutput, CliError> {
    let exit_code = outcome
        .error
        .as_ref()
        .map_or(ExitCode::Ok, ExitCode::for_error);
    let stdout = if mode.is_json() {
        format_outcome_json(outcome)?
    } else {
        format_outcome_text(outcome)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    })
}

fn format_outcome_json(outcome: &ValidationOutcome) -> Result<String, CliError> {
    let checks: Vec<_> = outcome
        .checks
        .iter()
        .map(|result| {
            serde_json::json!({
                "check": result.check.as_str(),
                "passed": result.passed,
                "message": result.message,
            })
        })
        .collect();
    let payload = serde_json::json!({
        "status": if outcome.is_success() { "ok" } else { "error" },
        "checks": checks,
        "error": outcome.error.as_ref().map(error_json),
    });
    json_output(&payload)
}

fn format_outcome_text(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();
    for result in &outcome.checks {
        out.push_str(if result.passed { "pass " } else { "fail " });
        out.push_str(result.check.as_str());
        out.push_str(": ");
        out.push_str(&result.message);
        out.push('\n');
    }
    match &outcome.error {
        Some(error) => out.push_str(&format_error_text(error)),
        None => out.push_str("status: ok\n"),
    }
    out
}
