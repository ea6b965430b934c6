use std::path::Path;

use anyhow::Context;
use skyshim_core::SkyshimConfig;
use skyshim_orchestrator::Orchestrator;
use skyshim_provider::SandboxFactory;

pub mod deploy;
pub mod init;
pub mod report;
pub mod scale;
pub mod status;

/// Output format for report-printing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// Pretty-printed JSON for scripting
    Json,
}

/// Load the config and build an orchestrator over sandbox clients.
pub(crate) fn load(config_path: &Path) -> anyhow::Result<(SkyshimConfig, Orchestrator)> {
    let config = SkyshimConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let orchestrator = Orchestrator::from_config(&config, &SandboxFactory)?;
    Ok((config, orchestrator))
}
