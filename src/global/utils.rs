use std::path::PathBuf;
use anyhow::{anyhow, Result};
use directories::ProjectDirs;

/// Overrides both the config and the data directory when set.
pub const PVM_HOME_ENV: &str = "PVM_HOME";

pub fn get_global_config_dir() -> Result<PathBuf> {
    let (config_dir, _) = get_global_dirs()?;
    Ok(config_dir)
}

pub fn get_global_data_dir() -> Result<PathBuf> {
    let (_, data_dir) = get_global_dirs()?;
    Ok(data_dir)
}

/// Path to `config.toml` inside the config directory.
pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_global_config_dir()?.join("config.toml"))
}

/// The well-known path of the active-version alias.
pub fn get_alias_path() -> Result<PathBuf> {
    Ok(get_global_data_dir()?.join("php"))
}

pub fn get_global_dirs() -> Result<(PathBuf, PathBuf)> {
    if let Some(home) = std::env::var_os(PVM_HOME_ENV).filter(|h| !h.is_empty()) {
        let home = PathBuf::from(home);
        return Ok((home.clone(), home));
    }
    let proj_dirs = ProjectDirs::from("org", "pvm", "pvm")
        .ok_or_else(|| anyhow!("Could not get project directories"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    let data_dir = proj_dirs.data_dir().to_path_buf();

    Ok((config_dir, data_dir))
}
