use std::fmt::Write;
use std::path::Path;

use skyshim_orchestrator::AggregatedStatus;

use super::OutputFormat;

pub async fn status(config_path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let (_, orchestrator) = super::load(config_path)?;
    let status = orchestrator.status().await;

    match format {
        OutputFormat::Json => println!("{}", status.to_json_pretty()?),
        OutputFormat::Text => print!("{}", format_status(&status)),
    }

    Ok(())
}

pub fn format_status(status: &AggregatedStatus) -> String {
    let mut out = String::new();
    for (provider, entry) in status.iter() {
        match &entry.error {
            Some(err) => {
                let _ = writeln!(out, "{provider:<6} ✗ {:?}: {}", err.kind, err.message);
            }
            None => {
                let _ = writeln!(out, "{provider:<6} {} instance(s)", entry.instance_count);
                for inst in &entry.instances {
                    let tags: Vec<String> =
                        inst.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    let _ = writeln!(
                        out,
                        "  {:<24} {:<16} {:<10} {}",
                        inst.id,
                        inst.instance_type,
                        inst.state.label(),
                        tags.join(",")
                    );
                }
            }
        }
    }
    let _ = writeln!(
        out,
        "{} provider(s), {} failed, {} instance(s)",
        status.len(),
        status.failed_count(),
        status.total_instances()
    );
    out
}
