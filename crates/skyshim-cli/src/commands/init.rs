use std::path::Path;

use skyshim_core::SkyshimConfig;

pub fn init(path: &Path, app: &str, image: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = SkyshimConfig::scaffold(app, image);
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}
