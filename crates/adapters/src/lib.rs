//! # embed-preflight-adapters
//!
//! Adapter implementations for ports (model registry, search service,
//! filesystem probe, logging) plus fixed in-memory doubles.
//! This crate depends on `ports`, `shared`, and `config`.

/// Bedrock foundation model registry over HTTP.
#[cfg(feature = "bedrock")]
pub mod bedrock;
/// OpenSearch-compatible search service over HTTP.
#[cfg(feature = "opensearch")]
pub mod opensearch;

pub mod fixed;
pub mod fs;
#[cfg(any(feature = "bedrock", feature = "opensearch"))]
mod http;
pub mod log_sink;
pub mod logger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_preflight_ports::ports_crate_version;
    use embed_preflight_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("embed-preflight-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let deps = workspace_deps();
        let forbidden = ["embed-preflight-app", "embed-preflight-infra"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_crate_compiles() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
