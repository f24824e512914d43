use std::path::Path;
use tracing::{info, warn};
use crate::alias::AliasManager;
use crate::catalog::{InstalledCatalog, InstalledVersion};
use crate::error::{reason, PvmError, PvmResult};

/// Whether the alias currently points at `path`.
pub fn alias_points_at(alias: &dyn AliasManager, path: &Path) -> bool {
    match alias.resolve() {
        Some(target) if target == path => true,
        Some(target) => match (target.canonicalize(), path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        None => false,
    }
}

/// Deletes an installed version and drops it from `catalog`.
///
/// If the alias points at the version it is removed first so no dangling
/// alias is left behind. An interrupted delete is reported, not retried.
pub fn remove_version(
    alias: &dyn AliasManager,
    catalog: &mut InstalledCatalog,
    identifier: &str,
) -> PvmResult<InstalledVersion> {
    let version = catalog
        .get(identifier)
        .cloned()
        .ok_or_else(|| PvmError::VersionNotFound(identifier.to_string()))?;
    let failed = |reason: String| PvmError::RemovalFailed {
        path: version.path.clone(),
        reason,
    };

    if alias_points_at(alias, &version.path) {
        info!("{} is active, removing alias", version.identifier);
        alias.remove().map_err(|e| failed(reason(&e)))?;
    }

    if version.path.exists() {
        std::fs::remove_dir_all(&version.path).map_err(|e| failed(e.to_string()))?;
    } else {
        warn!("{} is already gone", version.path.display());
    }
    catalog.forget(identifier);
    info!("removed PHP {}", version.identifier);
    Ok(version)
}
