use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::CadenceConfig;

pub fn run() -> Result<()> {
    let config_path = CadenceConfig::config_path()?;
    let config = CadenceConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!();
    println!("{}", "Settings".bold());
    println!("  Time zone:  {}", config.timezone()?.name());
    println!("  Week start: {}", config.week_start);
    println!("  View:       {:?}", config.default_view);

    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let config_path = CadenceConfig::config_path()?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}\n\nUse --force to overwrite it.",
            config_path.display()
        );
    }

    CadenceConfig::create_default_config(&config_path)?;
    println!("Wrote {}", config_path.display().green());

    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let config_path = CadenceConfig::config_path()?;
    let mut config = CadenceConfig::load()?;

    config.set(key, value)?;
    config.save_to(&config_path)?;

    println!("{} = {}", key, value.green());

    Ok(())
}
