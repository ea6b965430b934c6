use std::path::Path;

use skyshim_core::{MetricsSample, ProviderName};

pub async fn scale(
    config_path: &Path,
    provider: &str,
    cpu: f64,
    memory: f64,
    disk: f64,
    threshold: Option<f64>,
) -> anyhow::Result<()> {
    let provider: ProviderName = provider.parse()?;
    let (config, orchestrator) = super::load(config_path)?;
    let threshold = match threshold {
        Some(t) => t,
        None => config.cpu_threshold()?,
    };

    let sample = MetricsSample::new(cpu, memory, disk);
    let decision = orchestrator.apply_scaling(provider, sample, threshold).await?;

    println!(
        "{provider}: {} (cpu {cpu:.1}% vs threshold {threshold:.1}%)",
        decision.label()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
cloud_providers = ["aws"]

[infrastructure.aws]
app_name = "web"
image_ref = "nginx:1.27"
cpu_units = 256
memory_mib = 512
container_port = 80

[providers.aws]
sandbox_instances = "1"
"#;

    #[tokio::test]
    async fn scale_checks_provider_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skyshim.toml");
        std::fs::write(&path, CONFIG).unwrap();

        scale(&path, "aws", 95.0, 10.0, 10.0, None).await.unwrap();
        scale(&path, "aws", 10.0, 10.0, 10.0, Some(50.0)).await.unwrap();

        let unconfigured = scale(&path, "azure", 95.0, 0.0, 0.0, None).await.unwrap_err();
        assert!(unconfigured.to_string().contains("not configured"));

        let unknown = scale(&path, "oracle", 95.0, 0.0, 0.0, None).await.unwrap_err();
        assert!(unknown.to_string().contains("unknown cloud provider"));
    }
}
