//! # PVM Core Library
//!
//! This crate contains the core logic of `pvm` – a PHP version manager that lives next to a
//! Laragon-style development bundle.
//!
//! `pvm` discovers the PHP builds unpacked in the host's `bin/php` directory, resolves version
//! prefixes against them or against the official Windows release index, installs new builds and
//! switches the active one by redirecting a stable directory alias while keeping the host's own
//! `laragon.ini` in sync.
//!
//! This library is built for the `pvm` CLI, but every side effect goes through a small trait
//! (downloads, extraction, the alias, the search path, the host process and its config file), so
//! the pipelines can be driven from other front ends or tests.
//!
//! ## Modules Overview
//! - [`catalog`] – Installed versions and the remote release index
//! - [`resolver`] – Picking one version from a typed prefix
//! - [`installer`] – Fetch, extract and configure pipeline
//! - [`activation`] – Alias redirection and host synchronisation
//! - [`removal`] – Deleting installed versions
//! - [`apache`] – The secondary Apache component
//! - [`alias`], [`search_path`], [`process`], [`host_config`], [`transfer`] – Side-effect capabilities
//! - [`global`] – Manager directories and `config.toml`

pub mod activation;
pub mod alias;
pub mod apache;
pub mod catalog;
pub mod error;
pub mod global;
pub mod host_config;
pub mod installer;
pub mod layout;
pub mod php_ini;
pub mod process;
pub mod removal;
pub mod resolver;
pub mod search_path;
pub mod transfer;
pub mod util;

pub use activation::*;
pub use alias::*;
pub use catalog::*;
pub use error::*;
pub use global::config::*;
pub use host_config::{HostConfigStore, IniFile};
pub use installer::*;
pub use layout::*;
pub use process::*;
pub use removal::*;
pub use resolver::*;
pub use search_path::*;
pub use transfer::*;
