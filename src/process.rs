use std::path::PathBuf;
use std::process::{Command, Stdio};
use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use crate::error::{reason, PvmError, PvmResult};

/// Lifecycle control of the host application's process.
pub trait ProcessSupervisor {
    fn is_running(&self) -> Result<bool>;
    /// Terminates every instance. The host has no graceful shutdown protocol.
    fn stop(&self) -> Result<()>;
    fn start(&self) -> Result<()>;
}

/// The host application found by image name and relaunched from its executable.
#[derive(Debug, Clone)]
pub struct HostProcess {
    name: String,
    exe: PathBuf,
}

impl HostProcess {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, exe: P) -> Self {
        Self { name: name.into(), exe: exe.into() }
    }
}

impl ProcessSupervisor for HostProcess {
    #[cfg(windows)]
    fn is_running(&self) -> Result<bool> {
        let image = format!("{}.exe", self.name);
        let output = Command::new("tasklist")
            .args(["/FI", &format!("IMAGENAME eq {image}"), "/NH", "/FO", "CSV"])
            .output()
            .context("Could not run tasklist")?;
        let listing = String::from_utf8_lossy(&output.stdout).to_lowercase();
        Ok(listing.contains(&format!("\"{}\"", image.to_lowercase())))
    }

    #[cfg(not(windows))]
    fn is_running(&self) -> Result<bool> {
        let status = Command::new("pgrep")
            .args(["-x", &self.name])
            .stdout(Stdio::null())
            .status()
            .context("Could not run pgrep")?;
        Ok(status.success())
    }

    #[cfg(windows)]
    fn stop(&self) -> Result<()> {
        let status = Command::new("taskkill")
            .args(["/F", "/IM", &format!("{}.exe", self.name)])
            .stdout(Stdio::null())
            .status()
            .context("Could not run taskkill")?;
        if !status.success() {
            bail!("taskkill exited with {}", status);
        }
        Ok(())
    }

    #[cfg(not(windows))]
    fn stop(&self) -> Result<()> {
        let status = Command::new("pkill")
            .args(["-KILL", "-x", &self.name])
            .status()
            .context("Could not run pkill")?;
        if !status.success() {
            bail!("pkill exited with {}", status);
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        let mut command = Command::new(&self.exe);
        if let Some(dir) = self.exe.parent() {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Could not start {}", self.exe.display()))?;
        Ok(())
    }
}

/// Runs `update` while the host is guaranteed not to be running.
///
/// The host is checked first, stopped if it was running, `update` runs, and the
/// host is started again only if it was running before. The restart happens
/// even when `update` fails. Returns the update's value and whether the host
/// was restarted.
pub fn with_host_stopped<T>(
    supervisor: &dyn ProcessSupervisor,
    update: impl FnOnce() -> PvmResult<T>,
) -> PvmResult<(T, bool)> {
    let was_running = supervisor
        .is_running()
        .map_err(|e| PvmError::ProcessControlFailed(reason(&e)))?;
    if was_running {
        info!("stopping host application");
        supervisor
            .stop()
            .map_err(|e| PvmError::ProcessControlFailed(reason(&e)))?;
    }

    let result = update();

    if was_running {
        info!("starting host application");
        if let Err(e) = supervisor.start() {
            if result.is_err() {
                warn!("could not restart host application: {:#}", e);
            } else {
                return Err(PvmError::ProcessControlFailed(reason(&e)));
            }
        }
    }
    result.map(|value| (value, was_running))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;

    /// Records every call so tests can assert on ordering.
    #[derive(Default)]
    pub struct FakeSupervisor {
        pub running: RefCell<bool>,
        pub fail_start: bool,
        pub events: RefCell<Vec<&'static str>>,
    }

    impl FakeSupervisor {
        pub fn running() -> Self {
            Self { running: RefCell::new(true), ..Default::default() }
        }
    }

    impl ProcessSupervisor for FakeSupervisor {
        fn is_running(&self) -> Result<bool> {
            self.events.borrow_mut().push("is_running");
            Ok(*self.running.borrow())
        }

        fn stop(&self) -> Result<()> {
            self.events.borrow_mut().push("stop");
            *self.running.borrow_mut() = false;
            Ok(())
        }

        fn start(&self) -> Result<()> {
            self.events.borrow_mut().push("start");
            if self.fail_start {
                bail!("executable missing");
            }
            *self.running.borrow_mut() = true;
            Ok(())
        }
    }
}
