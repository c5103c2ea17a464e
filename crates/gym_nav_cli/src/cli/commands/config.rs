use anyhow::{Result, bail};
use std::path::Path;

use gym_nav_core::config::{API_KEY_ENV, NavConfig};

use crate::cli::args::ConfigCmd;
use crate::ui::{info, success};

pub fn run(path: &Path, cmd: &ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCmd::Show => show(path),
        ConfigCmd::Init { force } => init(path, *force),
    }
}

fn show(path: &Path) -> Result<()> {
    let config = NavConfig::load_or_default(path)?.with_env_overrides();

    if path.exists() {
        info(format!("Config file: {}", path.display()));
    } else {
        info(format!(
            "No config file at {} (showing defaults)",
            path.display()
        ));
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&masked(config))?);
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    NavConfig::default().save(path)?;
    success(format!("Config written to {}", path.display()));
    info(format!(
        "Set directions.api_key there, or export {API_KEY_ENV}."
    ));
    Ok(())
}

fn masked(mut config: NavConfig) -> NavConfig {
    if let Some(key) = config.directions.api_key.as_mut() {
        *key = mask_secret(key);
    }
    config
}

/// Keeps the last four characters.
fn mask_secret(secret: &str) -> String {
    let n = secret.chars().count();
    if n <= 4 {
        return "*".repeat(n);
    }
    let tail: String = secret.chars().skip(n - 4).collect();
    format!("{}{tail}", "*".repeat(n - 4))
}
