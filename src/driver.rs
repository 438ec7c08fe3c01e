//! Invocation of the external un-crosstab utility.
//!
//! The utility is opaque: it is run synchronously with the config artifact,
//! the augmented table and a destination path, and its exit status and
//! output are captured for logging only.

use crate::config::PivotToolConfig;
use crate::error::{Result, UnxtabError};
use crate::models::ArtifactPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Arguments of one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotInvocation {
    pub config_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl From<&ArtifactPaths> for PivotInvocation {
    fn from(paths: &ArtifactPaths) -> Self {
        Self {
            config_path: paths.config.clone(),
            input_path: paths.augmented.clone(),
            output_path: paths.untabbed.clone(),
        }
    }
}

/// Captured result of a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Long-format conversion utility
pub trait PivotTool: Send + Sync {
    fn run(&self, invocation: &PivotInvocation) -> Result<ToolOutput>;
}

/// The `un-xtab` command line utility
#[derive(Debug, Clone)]
pub struct UnxtabCommand {
    program: PathBuf,
    mode_flag: String,
}

impl UnxtabCommand {
    pub fn new(program: impl Into<PathBuf>, mode_flag: impl Into<String>) -> Self {
        Self {
            program: expand_home(&program.into()),
            mode_flag: mode_flag.into(),
        }
    }

    pub fn from_config(config: &PivotToolConfig) -> Self {
        Self::new(config.program.clone(), config.mode_flag.clone())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument vector, program first
    pub fn command_line(&self, invocation: &PivotInvocation) -> Vec<String> {
        vec![
            self.program.to_string_lossy().into_owned(),
            self.mode_flag.clone(),
            invocation.config_path.to_string_lossy().into_owned(),
            invocation.input_path.to_string_lossy().into_owned(),
            invocation.output_path.to_string_lossy().into_owned(),
        ]
    }

    fn command(&self, invocation: &PivotInvocation) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(&self.mode_flag)
            .arg(&invocation.config_path)
            .arg(&invocation.input_path)
            .arg(&invocation.output_path);
        command
    }
}

impl PivotTool for UnxtabCommand {
    fn run(&self, invocation: &PivotInvocation) -> Result<ToolOutput> {
        debug!("Running {}", self.command_line(invocation).join(" "));

        let output = self
            .command(invocation)
            .output()
            .map_err(|source| UnxtabError::ToolLaunch {
                program: self.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Expand a leading `~/` against the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
