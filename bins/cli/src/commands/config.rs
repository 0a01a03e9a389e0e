//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::{CliOutput, Invocation, format_error_output, json_output};
use embed_preflight_infra::load_effective_config_json;

/// Print the effective config with secrets redacted.
pub fn run_config_show(invocation: &Invocation) -> Result<CliOutput, CliError> {
    let path = invocation.config_path.as_deref();
    let config_json = match load_effective_config_json(&invocation.env, path) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(invocation.mode, &error)),
    };

    let stdout = if invocation.mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(config_json.trim())?;
        json_output(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        }))?
    } else {
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&config_json);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
