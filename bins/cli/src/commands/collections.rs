//! Collections command handlers.

use crate::error::{CliError, ExitCode};
use crate::{CliOutput, Invocation, format_error_output, json_output};
use embed_preflight_infra::{block_on, run_get_collection, run_list_collections};
use embed_preflight_ports::CollectionRecord;
use embed_preflight_shared::RequestContext;
use std::fmt::Write as _;

/// List every collection at the configured endpoint.
pub fn run_collections_list(invocation: &Invocation) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_run();
    let names = match block_on(run_list_collections(
        &ctx,
        &invocation.env,
        invocation.config_path.as_deref(),
        Some(invocation.logger()),
    )) {
        Ok(names) => names,
        Err(error) => return Ok(format_error_output(invocation.mode, &error)),
    };

    let stdout = if invocation.mode.is_json() {
        json_output(&serde_json::json!({
            "status": "ok",
            "collections": names,
        }))?
    } else {
        let mut out = String::from("status: ok\ncollections:\n");
        for name in &names {
            let _ = writeln!(out, "  - {name}");
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

/// Fetch the first page of documents in a collection.
pub fn run_collections_get(
    invocation: &Invocation,
    name: Option<&str>,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_run();
    let records = match block_on(run_get_collection(
        &ctx,
        &invocation.env,
        invocation.config_path.as_deref(),
        name,
        Some(invocation.logger()),
    )) {
        Ok(records) => records,
        Err(error) => return Ok(format_error_output(invocation.mode, &error)),
    };

    let stdout = if invocation.mode.is_json() {
        let documents: Vec<_> = records.iter().map(record_json).collect();
        json_output(&serde_json::json!({
            "status": "ok",
            "count": records.len(),
            "documents": documents,
        }))?
    } else {
        let mut out = format!("status: ok\ncount: {}\n", records.len());
        for record in &records {
            let _ = writeln!(out, "  - {} ({})", record.id, record.index);
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn record_json(record: &CollectionRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id,
        "index": record.index,
        "source": record.source,
    })
}
