use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use device_registry::DeviceRegistryConfig;
use device_registry_sdk::{
    DeviceIdentity, PersistedDevice, Service, ServiceCandidate, resolve_service,
};
use serde::de::DeserializeOwned;

use crate::config::AgentConfig;

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Print the API view of a persisted record. The token never reaches stdout.
pub fn render(path: &Path, json: bool) -> anyhow::Result<ExitCode> {
    let record: PersistedDevice = read_json(path)?;
    let device = DeviceIdentity::from_persisted(&record);
    tracing::info!(device_id = %record.id, "Rendering device record");

    if json {
        println!("{}", serde_json::to_string_pretty(&device)?);
    } else {
        println!("{device}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the matching descriptor as JSON; exits with failure when none
/// matches.
pub fn resolve(
    config: &DeviceRegistryConfig,
    path: &Path,
    candidate: &ServiceCandidate,
    counterparty: bool,
) -> anyhow::Result<ExitCode> {
    let services: Vec<Service> = read_json(path)?;
    let synonyms = config.arch_table();

    let Some(found) = resolve_service(&services, candidate, &synonyms)? else {
        tracing::info!(
            org = %candidate.org,
            url = %candidate.url,
            arch = %candidate.arch,
            version = %candidate.version,
            "No matching service configuration"
        );
        eprintln!("no service configuration matches");
        return Ok(ExitCode::FAILURE);
    };

    let out = if counterparty {
        found.for_counterparty()
    } else {
        found.clone()
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(ExitCode::SUCCESS)
}

/// Validate every descriptor and report each problem.
pub fn validate(path: &Path) -> anyhow::Result<ExitCode> {
    let services: Vec<Service> = read_json(path)?;

    let mut failures = 0usize;
    for (i, service) in services.iter().enumerate() {
        if let Err(e) = service.validate() {
            failures += 1;
            eprintln!("service #{i}: {e}");
        }
    }

    if failures == 0 {
        println!("{} service configuration(s) valid", services.len());
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(failures, total = services.len(), "Invalid service configuration");
        Ok(ExitCode::FAILURE)
    }
}

/// Print the effective configuration.
pub fn check(config: &AgentConfig) -> anyhow::Result<ExitCode> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(ExitCode::SUCCESS)
}
