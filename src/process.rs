//! Invocation of the Neo4j control binary.
//!
//! The server ships a `bin/neo4j` control script whose `start`/`stop`/
//! `restart`/`status` subcommands block until the underlying daemon action
//! completes. This module runs those subcommands, detached into their own
//! process group so the daemon outlives us, and turns the captured output
//! and exit status into typed results.

use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the helper binary that reattaches spawned daemons to the user
/// environment on platforms that detach them (notably macOS under tmux).
const REATTACH_HELPER: &str = "reattach-to-user-namespace";

/// Lifecycle subcommands understood by the control binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Start,
    Stop,
    Restart,
    Status,
}

impl Subcommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "status",
        }
    }
}

/// Locate the reattachment helper on `PATH`, if present.
///
/// Detection failure is never an error: absence simply means the control
/// binary is invoked directly. Called once per handle construction so the
/// probe is not repeated on every invocation.
pub fn detect_helper() -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(REATTACH_HELPER))
        .find(|candidate| candidate.is_file())
}

/// Runs control-binary subcommands and interprets their output.
#[derive(Debug, Clone)]
pub struct ProcessController {
    binary: PathBuf,
    helper: Option<PathBuf>,
}

impl ProcessController {
    /// Bind a controller to the control binary, optionally prefixing
    /// every invocation through a reattachment helper.
    pub fn new(binary: impl Into<PathBuf>, helper: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            helper,
        }
    }

    /// Run one subcommand to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] when the binary cannot be executed and
    /// [`Error::ProcessExit`] on a nonzero exit, carrying stderr (or
    /// stdout when stderr was empty).
    pub async fn run(&self, sub: Subcommand) -> Result<String> {
        let mut cmd = match &self.helper {
            Some(helper) => {
                let mut cmd = Command::new(helper);
                cmd.arg(&self.binary);
                cmd
            }
            None => Command::new(&self.binary),
        };
        cmd.arg(sub.as_str())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        #[cfg(unix)]
        cmd.process_group(0);

        let command_line = format!("{} {}", self.binary.display(), sub.as_str());
        debug!(command = %command_line, "Running control binary");

        let output = cmd
            .output()
            .await
            .map_err(|err| Error::spawn(&command_line, err))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let message = if stderr.trim().is_empty() { stdout } else { stderr };
        Err(Error::process_exit(command_line, message.trim()))
    }

    /// Whether the server daemon is currently running.
    ///
    /// A `status` failure whose message says the server is not running is
    /// a successful `false`, not an error; any other failure propagates.
    pub async fn running(&self) -> Result<bool> {
        match self.run(Subcommand::Status).await {
            Ok(status) => Ok(extract_pid(&status).is_some()),
            Err(Error::ProcessExit { ref message, .. }) if message.contains("not running") => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// The daemon's pid, or `None` when `status` reports no pid.
    pub async fn pid(&self) -> Result<Option<u32>> {
        let status = self.run(Subcommand::Status).await?;
        Ok(extract_pid(&status))
    }
}

/// Extract the integer following a `pid` token from status output.
fn extract_pid(output: &str) -> Option<u32> {
    let mut tokens = output.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "pid" {
            // Tolerate trailing punctuation, as in "at pid 1234."
            let digits = tokens
                .next()?
                .trim_end_matches(|c: char| !c.is_ascii_digit());
            if let Ok(pid) = digits.parse() {
                return Some(pid);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pid_from_status_output() {
        assert_eq!(
            extract_pid("Neo4j Server is running at pid 12345"),
            Some(12345)
        );
        assert_eq!(extract_pid("running at pid 7."), Some(7));
    }

    #[test]
    fn no_pid_token_means_none() {
        assert_eq!(extract_pid("Neo4j Server is not running"), None);
        assert_eq!(extract_pid(""), None);
        assert_eq!(extract_pid("pid"), None);
        assert_eq!(extract_pid("pid soon"), None);
    }

    #[test]
    fn subcommand_names_match_binary_contract() {
        assert_eq!(Subcommand::Start.as_str(), "start");
        assert_eq!(Subcommand::Stop.as_str(), "stop");
        assert_eq!(Subcommand::Restart.as_str(), "restart");
        assert_eq!(Subcommand::Status.as_str(), "status");
    }
}
