use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{NavError, Result};

pub fn default_config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("", "", "gym_nav").ok_or_else(|| {
        NavError::Config("Unable to determine OS app data directory".to_string())
    })?;

    Ok(proj.config_dir().join("config.json"))
}

pub fn resolve_config_path(arg: Option<&Path>) -> Result<PathBuf> {
    match arg {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            NavError::Config(format!(
                "Unable to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}
