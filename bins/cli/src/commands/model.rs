//! Model command handlers.

use crate::error::{CliError, ExitCode};
use crate::{CliOutput, Invocation, format_error_output, json_output};
use embed_preflight_infra::{block_on, run_model_check as check_model};
use embed_preflight_ports::ModelDescriptor;
use embed_preflight_shared::RequestContext;
use std::fmt::Write as _;

/// Look up the configured embedding model.
pub fn run_model_check(invocation: &Invocation) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_run();
    let model = match block_on(check_model(
        &ctx,
        &invocation.env,
        invocation.config_path.as_deref(),
    )) {
        Ok(model) => model,
        Err(error) => return Ok(format_error_output(invocation.mode, &error)),
    };

    let stdout = if invocation.mode.is_json() {
        json_output(&serde_json::json!({
            "status": "ok",
            "model": {
                "modelId": model.model_id,
                "modelArn": model.model_arn,
                "providerName": model.provider_name,
                "outputModalities": model.output_modalities,
            },
        }))?
    } else {
        format_model_text(&model)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_model_text(model: &ModelDescriptor) -> String {
    let mut out = format!("status: ok\nmodelId: {}\n", model.model_id);
    if let Some(arn) = &model.model_arn {
        let _ = writeln!(out, "modelArn: {arn}");
    }
    if let Some(provider) = &model.provider_name {
        let _ = writeln!(out, "provider: {provider}");
    }
    if !model.output_modalities.is_empty() {
        let _ = writeln!(out, "outputModalities: {}", model.output_modalities.join(","));
    }
    out
}
