use std::path::PathBuf;
use tracing::{info, warn};
use crate::alias::AliasManager;
use crate::catalog::InstalledVersion;
use crate::error::{reason, PvmError, PvmResult};
use crate::host_config::{set_if_changed, HostConfigStore, PHP_SECTION, VERSION_KEY};
use crate::process::{with_host_stopped, ProcessSupervisor};
use crate::search_path::SearchPath;

/// What an activation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub target: PathBuf,
    /// The search path gained the alias directory.
    pub path_updated: bool,
    /// The host config held a different version and was rewritten.
    pub config_changed: bool,
    /// The host was running and has been restarted.
    pub host_restarted: bool,
}

/// Switches the active PHP version.
///
/// Holds every collaborator the activation touches so the sequence can be
/// driven against fakes in tests.
pub struct Activator<'a> {
    pub alias: &'a dyn AliasManager,
    pub search_path: &'a dyn SearchPath,
    pub supervisor: &'a dyn ProcessSupervisor,
    pub host_config: &'a mut dyn HostConfigStore,
}

impl Activator<'_> {
    /// Points the alias at `version` and syncs the host to it.
    ///
    /// If the alias cannot be created nothing else happens: the host keeps
    /// running and its config is left as it was. The previous alias is not
    /// restored in that case.
    pub fn activate(&mut self, version: &InstalledVersion) -> PvmResult<Activation> {
        let denied = |reason: String| PvmError::ActivationDenied {
            alias: self.alias.path().to_path_buf(),
            target: version.path.clone(),
            reason,
        };

        self.alias.remove().map_err(|e| denied(reason(&e)))?;
        self.alias.create(&version.path).map_err(|e| denied(reason(&e)))?;
        info!("{} -> {}", self.alias.path().display(), version.path.display());

        let path_updated = match self.search_path.ensure_contains(self.alias.path()) {
            Ok(updated) => updated,
            Err(e) => {
                warn!("could not add {} to the search path: {:#}", self.alias.path().display(), e);
                false
            }
        };

        let folder = version.folder_name();
        let host_config = &mut *self.host_config;
        let (config_changed, host_restarted) = with_host_stopped(self.supervisor, || {
            set_if_changed(host_config, PHP_SECTION, VERSION_KEY, &folder)
                .map_err(|e| PvmError::HostConfigFailed(reason(&e)))
        })?;

        Ok(Activation {
            target: version.path.clone(),
            path_updated,
            config_changed,
            host_restarted,
        })
    }
}
