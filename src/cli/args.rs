// file: src/cli/args.rs
// version: 2.0.0
// guid: f6g7h8i9-j0k1-2345-6789-012345fghijk

//! Command line argument definitions

use crate::config::GhInstallMethod;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pages-agent")]
#[command(about = "Build, deploy and revise single-page apps on GitHub Pages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "PAGES_AGENT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install manifest dependencies, then the GitHub CLI
    Provision {
        /// Dependency manifest (requirements.txt, package.json, ...)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        #[arg(long, value_enum)]
        gh_method: Option<GhMethodArg>,

        #[arg(long, help = "GitHub CLI release to install, e.g. 2.62.0")]
        gh_version: Option<String>,

        #[arg(long, help = "Directory the gh binary is installed into")]
        install_dir: Option<String>,

        #[arg(long, help = "Do not verify the release archive checksum")]
        skip_checksum: bool,
    },

    /// Run the HTTP service that accepts build tasks
    Serve {
        #[arg(short, long, help = "Address to listen on, e.g. 0.0.0.0:8000")]
        bind: Option<String>,

        #[arg(long, help = "Emit logs as JSON")]
        json_logs: bool,
    },

    /// Run one build task from a JSON file
    RunTask {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check system prerequisites
    CheckPrereqs,
}

/// GitHub CLI install method argument
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum GhMethodArg {
    Binary,
    Package,
}

impl From<GhMethodArg> for GhInstallMethod {
    fn from(method: GhMethodArg) -> Self {
        match method {
            GhMethodArg::Binary => GhInstallMethod::Binary,
            GhMethodArg::Package => GhInstallMethod::Package,
        }
    }
}
