//! Probe command implementation.

use anyhow::Result;
use clap::Args;
use mirrorgate_registry::{
    AvailabilityGate, DockerConfigProbe, HttpProbe, MirrorAvailability, MirrorConfig,
};
use serde::Serialize;
use tracing::info;

use super::OutputFormat;

/// Arguments for the probe command.
#[derive(Args)]
pub struct ProbeArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Only check the docker config, without contacting the registry
    #[arg(long)]
    pub skip_http: bool,
}

/// Result of probing the mirror registry.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub host: String,
    pub configured: bool,
    pub available: bool,
    pub probes: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_error: Option<String>,
}

/// Runs the probe command.
pub fn run(args: &ProbeArgs) -> Result<()> {
    let config = MirrorConfig::from_env();
    info!(host = %config.host, skip_http = args.skip_http, "Probing mirror registry");

    let mut probes = Vec::new();
    let gate = match DockerConfigProbe::from_env() {
        Ok(docker) => {
            probes.push("docker_config");
            let gate = AvailabilityGate::new(config).with_probe(docker);
            if args.skip_http {
                gate
            } else {
                probes.push("http");
                gate.with_probe(HttpProbe::new())
            }
        }
        Err(e) => AvailabilityGate::forced_unavailable(config, e.to_string()),
    };

    let report = probe_report(&gate, probes);
    match args.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.available {
        anyhow::bail!("Mirror registry is unavailable");
    }
    Ok(())
}

/// Queries the gate once and summarizes the result.
pub fn probe_report(gate: &AvailabilityGate, probes: Vec<&'static str>) -> ProbeReport {
    ProbeReport {
        host: gate.registry_host().to_string(),
        configured: gate.config().is_configured(),
        available: gate.is_available(),
        probes,
        setup_error: gate.setup_error().map(|e| e.to_string()),
    }
}

fn print_text(report: &ProbeReport) {
    let host = if report.configured {
        report.host.as_str()
    } else {
        "(not configured)"
    };
    println!("Mirror registry: {host}");
    if !report.probes.is_empty() {
        println!("Probes: {}", report.probes.join(", "));
    }

    if report.available {
        println!("✓ Available");
    } else {
        println!("✗ Unavailable");
    }
    if let Some(error) = &report.setup_error {
        println!("  Error: {error}");
    }
}
