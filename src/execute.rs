use std::io::Write;
use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use pvm::apache::{find_apache, fix_apache, list_apache, use_apache, FIX_ARCHIVE_URL};
use pvm::global::config::ManagerConfig;
use pvm::global::utils::{get_alias_path, get_config_file};
use pvm::{
    alias_points_at, fetch_remote_index, remove_version, resolve, Activator, AliasManager,
    HostLayout, HostProcess, HttpDownloader, IniFile, InstalledCatalog, Installer, PvmError,
    SymlinkAlias, UserSearchPath, ZipExtractor, HOST_PROCESS_NAME,
};
use crate::cli::{ApacheCommand, PvmCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    match cli.command {
        PvmCommand::Install { version } => {
            execute_install(&host_layout()?, &version)
        }
        PvmCommand::Use { version } => {
            execute_use(&host_layout()?, &version)
        }
        PvmCommand::List => {
            execute_list(&host_layout()?)
        }
        PvmCommand::ListRemote => {
            execute_list_remote()
        }
        PvmCommand::Remove { version } => {
            execute_remove(&host_layout()?, &version)
        }
        PvmCommand::Which => {
            execute_which()
        }
        PvmCommand::Apache { command } => {
            execute_apache(&host_layout()?, command)
        }
    }
}

/// Loads the host root from `config.toml`, asking for it once if it was never set.
/// The root is made absolute before it is saved or used.
fn host_layout() -> Result<HostLayout> {
    let config_path = get_config_file()?;
    let mut config = ManagerConfig::load_or_default(&config_path)?;
    let root = match config.host_root.clone() {
        Some(root) => std::path::absolute(&root)
            .with_context(|| format!("Invalid Laragon path: {}", root.display()))?,
        None => {
            let root = prompt_host_root()?;
            let root = std::path::absolute(&root)
                .with_context(|| format!("Invalid Laragon path: {}", root.display()))?;
            config.host_root = Some(root.clone());
            config.save(&config_path)?;
            root
        }
    };
    if !root.is_dir() {
        bail!("Laragon path not found: {}", root.display());
    }
    Ok(HostLayout::new(root))
}

fn prompt_host_root() -> Result<PathBuf> {
    print!("Enter Laragon path: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Could not read the Laragon path")?;
    let line = line.trim();
    if line.is_empty() {
        bail!("No Laragon path given");
    }
    Ok(PathBuf::from(line))
}

fn alias() -> Result<SymlinkAlias> {
    Ok(SymlinkAlias::new(get_alias_path()?))
}

pub fn execute_install(layout: &HostLayout, query: &str) -> Result<()> {
    let catalog = fetch_remote_index()?;
    let downloader = HttpDownloader::new()?;
    let installer = Installer::new(&downloader, &ZipExtractor);
    println!("Installing PHP {}..", query);
    match installer.install(query, &catalog, &layout.php_dir()) {
        Ok(version) => {
            println!("{} PHP {} installed to {}", "ok".green().bold(), version.identifier, version.path.display());
            Ok(())
        }
        Err(e @ PvmError::ConfigurationIncomplete { .. }) => {
            println!("{} {}", "warning:".yellow().bold(), e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn execute_use(layout: &HostLayout, query: &str) -> Result<()> {
    let catalog = InstalledCatalog::scan(layout.php_dir())?;
    let identifier = resolve(query, catalog.identifiers())
        .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))?;
    let version = catalog
        .get(&identifier)
        .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))?;

    let alias = alias()?;
    let search_path = UserSearchPath::new()?;
    let supervisor = HostProcess::new(HOST_PROCESS_NAME, layout.host_exe());
    let mut host_config = IniFile::new(layout.host_ini());
    let activation = Activator {
        alias: &alias,
        search_path: &search_path,
        supervisor: &supervisor,
        host_config: &mut host_config,
    }
    .activate(version)?;

    if activation.path_updated {
        println!("Path updated, open a new terminal to pick it up");
    }
    if activation.host_restarted {
        println!("Laragon restarted");
    }
    println!("{} PHP version set to {}", "ok".green().bold(), version.folder_name());
    Ok(())
}

pub fn execute_list(layout: &HostLayout) -> Result<()> {
    let catalog = InstalledCatalog::scan(layout.php_dir())?;
    if catalog.is_empty() {
        println!("No versions installed");
        return Ok(());
    }
    let alias = alias()?;

    println!("Installed versions:");
    for version in catalog.newest_first() {
        let mut row = version.identifier.clone();
        if catalog.count(&version.identifier) > 1 {
            row = format!("{} ({})", row, version.folder_name());
        }
        match alias_points_at(&alias, &version.path) {
            true => println!("  * {} {}", row.green(), "(active)".dimmed()),
            false => println!("    {}", row),
        }
    }
    Ok(())
}

pub fn execute_list_remote() -> Result<()> {
    let catalog = fetch_remote_index()?;
    let mut releases = catalog.releases().to_vec();
    releases.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    println!("Available versions:");
    for release in releases {
        let latest = release.latest.as_deref().unwrap_or("-");
        match release.is_installable() {
            true => println!("  {:<8} {}", release.identifier, latest),
            false => println!("  {:<8} {} {}", release.identifier, latest, "(no thread-safe x64 build)".dimmed()),
        }
    }
    Ok(())
}

pub fn execute_remove(layout: &HostLayout, query: &str) -> Result<()> {
    let mut catalog = InstalledCatalog::scan(layout.php_dir())?;
    let identifier = resolve(query, catalog.identifiers())
        .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))?;
    let alias = alias()?;
    println!("Removing {}", identifier);
    let removed = remove_version(&alias, &mut catalog, &identifier)?;
    println!("{} Removed {}", "ok".green().bold(), removed.identifier);

    if catalog.is_empty() {
        println!("No versions installed");
        return Ok(());
    }
    println!("Installed versions:");
    for version in catalog.versions() {
        println!("    {}", version.identifier);
    }
    if alias.resolve().is_none() {
        println!("Run `pvm use <version>` to activate a version.");
    }
    Ok(())
}

pub fn execute_which() -> Result<()> {
    let alias = alias()?;
    match alias.resolve() {
        Some(target) if target.exists() => {
            println!("{} -> {}", alias.path().display(), target.display());
        }
        Some(target) => {
            println!("{} -> {} {}", alias.path().display(), target.display(), "(missing)".red());
        }
        None => {
            println!("No active version");
        }
    }
    Ok(())
}

pub fn execute_apache(layout: &HostLayout, command: ApacheCommand) -> Result<()> {
    let apache_root = layout.apache_dir();
    let supervisor = HostProcess::new(HOST_PROCESS_NAME, layout.host_exe());
    let mut host_config = IniFile::new(layout.host_ini());
    match command {
        ApacheCommand::List => {
            let names = list_apache(&apache_root)?;
            if names.is_empty() {
                println!("No versions installed");
                return Ok(());
            }
            println!("Installed versions:");
            for name in names {
                println!("    {}", name);
            }
        }
        ApacheCommand::Use { version } => {
            let folder = find_apache(&apache_root, &version)?;
            use_apache(&folder, &supervisor, &mut host_config)?;
            println!("{} Apache version set to {}", "ok".green().bold(), folder);
        }
        ApacheCommand::Fix => {
            let downloader = HttpDownloader::new()?;
            let dest = fix_apache(
                &apache_root,
                FIX_ARCHIVE_URL,
                &downloader,
                &ZipExtractor,
                &supervisor,
                &mut host_config,
            )?;
            println!("{} Apache installed to {}", "ok".green().bold(), dest.display());
        }
    }
    Ok(())
}
