// file: src/deploy/workspace.rs
// version: 1.1.0
// guid: a94e27c0-6f5b-4d83-9e1a-2c7b0d58f361

//! Local working copies of generated repositories

use crate::error::AgentError;
use crate::security::ValidationUtils;
use crate::Result;
use chrono::Datelike;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PAGE_FILE: &str = "index.html";
pub const README_FILE: &str = "README.md";
pub const LICENSE_FILE: &str = "LICENSE";

/// MIT license text for a given year and holder
pub fn mit_license(year: i32, holder: &str) -> String {
    format!(
        "MIT License\n\
         \n\
         Copyright (c) {} {}\n\
         \n\
         Permission is hereby granted, free of charge, to any person obtaining a copy\n\
         of this software and associated documentation files (the \"Software\"), to deal\n\
         in the Software without restriction, including without limitation the rights\n\
         to use, copy, modify, merge, publish, distribute, sublicense, and/or sell\n\
         copies of the Software, and to permit persons to whom the Software is\n\
         furnished to do so, subject to the following conditions:\n\
         \n\
         The above copyright notice and this permission notice shall be included in all\n\
         copies or substantial portions of the Software.\n\
         \n\
         THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR\n\
         IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,\n\
         FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE\n\
         AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER\n\
         LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,\n\
         OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE\n\
         SOFTWARE.\n",
        year, holder
    )
}

/// Directory holding one working copy per task
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the working copy for a repository
    pub fn repo_dir(&self, repo_name: &str) -> Result<PathBuf> {
        ValidationUtils::validate_repo_name(repo_name)?;
        Ok(self.root.join(repo_name))
    }

    /// Remove any previous working copy; returns the (now absent) path
    pub async fn reset(&self, repo_name: &str) -> Result<PathBuf> {
        let dir = self.repo_dir(repo_name)?;
        if tokio::fs::metadata(&dir).await.is_ok() {
            debug!("Removing previous working copy {}", dir.display());
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(dir)
    }

    /// Fresh working copy with the page, README and LICENSE
    pub async fn prepare(
        &self,
        repo_name: &str,
        html: &str,
        readme: &str,
        license_holder: &str,
    ) -> Result<PathBuf> {
        let dir = self.reset(repo_name).await?;
        tokio::fs::create_dir_all(&dir).await?;

        write_page(&dir, html).await?;
        write_readme(&dir, readme).await?;
        let year = chrono::Utc::now().year();
        tokio::fs::write(dir.join(LICENSE_FILE), mit_license(year, license_holder)).await?;

        info!(
            "Code, README and LICENSE saved in local directory: {}",
            dir.display()
        );
        Ok(dir)
    }
}

pub async fn write_page(dir: &Path, html: &str) -> Result<()> {
    tokio::fs::write(dir.join(PAGE_FILE), html).await?;
    Ok(())
}

pub async fn write_readme(dir: &Path, readme: &str) -> Result<()> {
    tokio::fs::write(dir.join(README_FILE), readme).await?;
    Ok(())
}

/// Current `index.html` of a working copy
pub async fn read_page(dir: &Path) -> Result<String> {
    tokio::fs::read_to_string(dir.join(PAGE_FILE))
        .await
        .map_err(|e| {
            AgentError::deploy(format!(
                "Could not read {} in {}: {}",
                PAGE_FILE,
                dir.display(),
                e
            ))
        })
}
