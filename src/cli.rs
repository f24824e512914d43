use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// More log output (-v info, -vv debug). `PVM_LOG` takes precedence
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: PvmCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum PvmCommand {
    /// Installs the first release matching the prefix from windows.php.net
    Install {
        /// Version prefix, e.g. `8.3` or `8`
        version: String,
    },
    /// Makes the first installed version matching the prefix active
    Use {
        version: String,
    },
    /// Lists installed versions
    List,
    /// Lists versions available on windows.php.net
    ListRemote,
    /// Deletes the first installed version matching the prefix
    Remove {
        version: String,
    },
    /// Shows where the active-version alias points
    Which,
    /// Manages the host's Apache builds
    Apache {
        #[command(subcommand)]
        command: ApacheCommand,
    },
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum ApacheCommand {
    /// Lists installed Apache builds
    List,
    /// Makes the first Apache build containing the text active
    Use {
        version: String,
    },
    /// Downloads and activates a known-good Apache build
    Fix,
}
