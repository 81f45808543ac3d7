//! Command-line flags and the resolved server configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use fsgraph_kernel::Scope;

use crate::constants::{DEFAULT_ADDRESS, FALLBACK_HOSTNAME};

/// Serve a directory tree as a typed file graph over JSON lines.
#[derive(Parser, Debug, Clone)]
#[command(name = "fsgraph-server")]
#[command(about = "Serve a directory tree as a typed file graph")]
pub struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Directory to serve (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Keep writes in a temporary overlay instead of the real tree
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub protected: bool,

    /// Seed for file IDs (default: hostname:root)
    #[arg(long)]
    pub scope: Option<String>,
}

/// Flags resolved against the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    /// Canonical served root.
    pub root: PathBuf,
    pub protected: bool,
    /// Human-readable seed the scope is hashed from.
    pub scope_seed: String,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let given = match args.root {
            Some(root) => root,
            None => std::env::current_dir().context("unable to read current directory")?,
        };
        anyhow::ensure!(!given.as_os_str().is_empty(), "root expected");
        let root = dunce::canonicalize(&given)
            .with_context(|| format!("unable to resolve root {}", given.display()))?;
        anyhow::ensure!(root.is_dir(), "root {} is not a directory", root.display());

        // The seed uses the root as given, so `--root .` and `--root /srv` differ.
        let scope_seed = args
            .scope
            .filter(|scope| !scope.is_empty())
            .unwrap_or_else(|| default_scope_seed(&given));
        Ok(Self {
            address: args.address,
            root,
            protected: args.protected,
            scope_seed,
        })
    }

    pub fn scope(&self) -> Scope {
        Scope::from_seed(&self.scope_seed)
    }
}

/// `hostname:root`.
fn default_scope_seed(root: &std::path::Path) -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unable to read hostname");
            FALLBACK_HOSTNAME.to_string()
        });
    format!("{host}:{}", root.display())
}
