//! Resolve command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use mirrorgate_audit::{
    parse_allow_list, AuditLogger, ImageCollector, TracingBackend, VerificationReport,
};
use mirrorgate_core::{ImageReference, ResolutionOutcome};
use mirrorgate_registry::AvailabilityGate;
use mirrorgate_resolver::{HostMode, MirrorPolicy, ResolveContext, Resolver};
use serde::Serialize;
use tracing::info;

use super::OutputFormat;

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Image references to resolve
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Route through the mirror even if it is unavailable (tests only)
    #[arg(long)]
    pub mock: bool,

    /// Keep original references unless a safety rule applies
    #[arg(long)]
    pub force_external: bool,

    /// Treat the container host as remote
    #[arg(long)]
    pub remote: bool,

    /// YAML file overriding the naming policy
    #[arg(long, env = "MIRRORGATE_POLICY")]
    pub policy: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Allow list of images; resolved images missing from it fail the run
    #[arg(long)]
    pub expected: Option<PathBuf>,
}

/// An image that could not be resolved.
#[derive(Debug, Serialize)]
pub struct ImageFailure {
    pub image: String,
    pub error: String,
}

/// Everything the resolve command reports.
#[derive(Debug, Default, Serialize)]
pub struct ResolveReport {
    pub outcomes: Vec<ResolutionOutcome>,
    pub failures: Vec<ImageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
}

impl ResolveReport {
    fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self
                .verification
                .as_ref()
                .map_or(true, VerificationReport::is_clean)
    }
}

/// Runs the resolve command.
pub fn run(args: &ResolveArgs) -> Result<()> {
    let context = build_context(args, ResolveContext::from_env());
    let policy = match &args.policy {
        Some(path) => MirrorPolicy::from_yaml_file(path)
            .with_context(|| format!("Failed to load policy {}", path.display()))?,
        None => MirrorPolicy::default(),
    };
    let expected = args.expected.as_deref().map(read_allow_list).transpose()?;

    info!(
        images = args.images.len(),
        host_mode = ?context.host_mode,
        force_external = context.force_external,
        mock_mirror = context.mock_mirror,
        "Resolving images"
    );

    let collector = Arc::new(
        ImageCollector::new().with_logger(
            AuditLogger::builder()
                .with_backend(Arc::new(TracingBackend::new()))
                .build(),
        ),
    );
    let resolver = Resolver::new(Arc::new(AvailabilityGate::from_env()))
        .with_policy(policy)
        .with_audit(collector.clone());

    let mut report = resolve_all(&resolver, &context, &args.images);
    if let Some(expected) = &expected {
        report.verification = Some(collector.verify(expected));
    }

    match args.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} image(s) failed to resolve, {} unexpected image(s)",
            report.failures.len(),
            report
                .verification
                .as_ref()
                .map_or(0, |v| v.unexpected.len())
        );
    }
    Ok(())
}

/// Applies the command-line overrides on top of the environment.
fn build_context(args: &ResolveArgs, mut context: ResolveContext) -> ResolveContext {
    if args.remote {
        context.host_mode = HostMode::Remote;
    }
    context.force_external |= args.force_external;
    context.mock_mirror |= args.mock;
    context
}

fn read_allow_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read allow list {}", path.display()))?;
    Ok(parse_allow_list(&content))
}

/// Resolves every image, collecting failures instead of stopping at the first.
pub fn resolve_all(resolver: &Resolver, context: &ResolveContext, images: &[String]) -> ResolveReport {
    let mut report = ResolveReport::default();

    for raw in images {
        let result = raw
            .parse::<ImageReference>()
            .map_err(anyhow::Error::from)
            .and_then(|image| resolver.resolve(&image, context).map_err(anyhow::Error::from));

        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => report.failures.push(ImageFailure {
                image: raw.clone(),
                error: e.to_string(),
            }),
        }
    }

    report
}

fn print_text(report: &ResolveReport) {
    for outcome in &report.outcomes {
        if outcome.is_swapped() {
            println!("✓ {} --> {}", outcome.original, outcome.resolved);
        } else {
            println!("✓ {} (unchanged)", outcome.original);
        }
        println!("  Rule: {}", outcome.rule);
        println!("  Reason: {}", outcome.reason);
    }

    for failure in &report.failures {
        println!("✗ {}", failure.image);
        println!("  Error: {}", failure.error);
    }

    if let Some(verification) = &report.verification {
        println!();
        if verification.is_clean() {
            println!(
                "All {} collected image(s) are on the allow list",
                verification.collected
            );
        } else {
            println!("Images missing from the allow list:");
            for image in &verification.unexpected {
                println!("  - {image}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorgate_test::{StaticAvailability, MIRROR_HOST};

    fn args() -> ResolveArgs {
        ResolveArgs {
            images: Vec::new(),
            mock: false,
            force_external: false,
            remote: false,
            policy: None,
            format: OutputFormat::Text,
            expected: None,
        }
    }

    fn images(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_flags_override_environment() {
        let args = ResolveArgs {
            mock: true,
            remote: true,
            ..args()
        };
        let context = build_context(&args, ResolveContext::new(HostMode::Local).with_force_external(true));

        assert_eq!(context.host_mode, HostMode::Remote);
        assert!(context.mock_mirror);
        assert!(context.force_external);
    }

    #[test]
    fn test_resolve_all_collects_failures() {
        let resolver = Resolver::new(Arc::new(StaticAvailability::available(MIRROR_HOST)));
        let report = resolve_all(
            &resolver,
            &ResolveContext::new(HostMode::Local),
            &images(&["foo/bar:1.0", "Not Valid", "artifactory.swg-devops.com/foo:1.0"]),
        );

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].image, "Not Valid");
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_json() {
        let resolver = Resolver::new(Arc::new(StaticAvailability::unavailable(MIRROR_HOST, "offline")));
        let report = resolve_all(
            &resolver,
            &ResolveContext::new(HostMode::Local),
            &images(&["redis:7"]),
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""used_mirror":false"#));
        assert!(json.contains(r#""rule":"default""#));
        assert!(!json.contains("verification"));
        assert!(report.is_success());
    }

    #[test]
    fn test_unexpected_images_fail_report() {
        let collector = Arc::new(ImageCollector::new());
        let resolver = Resolver::new(Arc::new(StaticAvailability::available(MIRROR_HOST)))
            .with_audit(collector.clone());
        let mut report = resolve_all(
            &resolver,
            &ResolveContext::new(HostMode::Local),
            &images(&["postgres:16", "redis:7"]),
        );
        report.verification = Some(collector.verify(&["postgres:16"]));

        assert!(!report.is_success());
        assert_eq!(
            report.verification.unwrap().unexpected,
            vec!["redis:7".to_string()]
        );
    }

    #[test]
    fn test_read_allow_list() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("expected-images.txt");
        std::fs::write(&path, "# expected\npostgres:16\n").unwrap();

        assert_eq!(read_allow_list(&path).unwrap(), vec!["postgres:16"]);
        assert!(read_allow_list(&temp_dir.path().join("missing.txt")).is_err());
    }
}
