use std::fmt::Write;
use std::path::Path;

use skyshim_orchestrator::DeployReport;

use super::OutputFormat;

pub async fn deploy(config_path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let (_, orchestrator) = super::load(config_path)?;
    let outcomes = orchestrator.deploy_all().await;
    let report = DeployReport::from_outcomes(&outcomes);

    match format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Text => print!("{}", format_deploy(&report)),
    }

    // Partial success is still a failed run for scripting purposes.
    if report.failed_count() > 0 {
        anyhow::bail!("{} of {} provider(s) failed to deploy", report.failed_count(), outcomes.len());
    }
    Ok(())
}

pub fn format_deploy(report: &DeployReport) -> String {
    let mut out = String::new();
    for (provider, entry) in report.iter() {
        match (&entry.deployment, &entry.error) {
            (_, Some(err)) => {
                let _ = writeln!(out, "{provider:<6} ✗ {:?}: {}", err.kind, err.message);
            }
            (Some(deployed), None) => {
                let _ = writeln!(out, "{provider:<6} ✓ {} → {}", deployed.app_name, deployed.provider_ref);
            }
            (None, None) => {
                let _ = writeln!(out, "{provider:<6} ? no result");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CONFIG: &str = r#"
cloud_providers = ["aws", "azure"]

[infrastructure.aws]
app_name = "web"
image_ref = "nginx:1.27"
cpu_units = 256
memory_mib = 512
container_port = 80

[infrastructure.azure]
app_name = "web"
image_ref = "nginx:1.27"
cpu_units = 0
memory_mib = 512
container_port = 80
"#;

    #[tokio::test]
    async fn partial_failure_is_reported_per_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skyshim.toml");
        fs::write(&path, CONFIG).unwrap();

        let (_, orchestrator) = crate::commands::load(&path).unwrap();
        let report = DeployReport::from_outcomes(&orchestrator.deploy_all().await);
        let text = format_deploy(&report);
        assert!(text.contains("aws    ✓ web → sandbox://aws/web:1"));
        assert!(text.contains("azure  ✗ Validation"));

        assert!(deploy(&path, OutputFormat::Json).await.is_err());
    }
}
