// file: src/utils/system.rs
// version: 2.0.0
// guid: w3x4y5z6-a7b8-9012-3456-789012wxyzab

//! System utility functions

use crate::config::Architecture;
use crate::Result;
use std::path::PathBuf;
use tracing::{debug, warn};

/// System utility functions
pub struct SystemUtils;

impl SystemUtils {
    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }

    /// Resolve a command to its full path
    pub fn find_command(command: &str) -> Option<PathBuf> {
        which::which(command).ok()
    }

    /// Get system architecture as used by release archives
    pub fn get_system_arch() -> Result<Architecture> {
        std::env::consts::ARCH.parse().map_err(|_| {
            crate::error::AgentError::SystemError(format!(
                "No GitHub CLI release for architecture {}",
                std::env::consts::ARCH
            ))
        })
    }

    /// Check if running as root
    pub fn is_root() -> bool {
        #[cfg(unix)]
        {
            unsafe { libc::getuid() == 0 }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Check the host tools the build agent shells out to
    pub fn check_prerequisites() -> Vec<String> {
        let required_commands = ["git", "gh"];

        let missing: Vec<String> = required_commands
            .iter()
            .filter(|cmd| !Self::command_exists(cmd))
            .map(|cmd| cmd.to_string())
            .collect();

        if !Self::command_exists("tar") {
            warn!("tar not found - binary installs of the GitHub CLI will fail");
        }

        debug!("Missing prerequisites: {:?}", missing);
        missing
    }

    /// Whether `dir` appears in the current PATH
    pub fn is_on_path(dir: &std::path::Path) -> bool {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|entry| entry == dir))
            .unwrap_or(false)
    }
}
