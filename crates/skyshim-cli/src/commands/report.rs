use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use skyshim_core::epoch_secs;
use skyshim_state::{status_report_key, ReportStore};

const STORE_FILE: &str = "reports.redb";

fn open_store(data_dir: &Path) -> anyhow::Result<ReportStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    Ok(ReportStore::open(&data_dir.join(STORE_FILE))?)
}

/// Run one status fan-out and store it as JSON under `status-<epoch>`.
pub async fn snapshot(config_path: &Path, data_dir: &Path) -> anyhow::Result<()> {
    let (_, orchestrator) = super::load(config_path)?;
    let store = open_store(data_dir)?;

    let status = orchestrator.status().await;
    let key = status_report_key(epoch_secs());
    store.put_json(&key, &status)?;

    info!(%key, providers = status.len(), failed = status.failed_count(), "status snapshot stored");
    println!("✓ Stored {key}");
    Ok(())
}

/// Write a stored report to stdout byte-for-byte, or list keys when none
/// is given.
pub fn show(data_dir: &Path, key: Option<&str>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    show_to(data_dir, key, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn show_to(data_dir: &Path, key: Option<&str>, out: &mut impl Write) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;

    match key {
        Some(key) => {
            let bytes = store
                .get_report(key)?
                .with_context(|| format!("no report stored under {key}"))?;
            out.write_all(&bytes)?;
        }
        None => {
            for key in store.list_report_keys()? {
                writeln!(out, "{key}")?;
            }
        }
    }
    Ok(())
}
