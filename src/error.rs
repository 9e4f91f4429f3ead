// Bctl
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io;
use thiserror::Error;

/// Main error type for bctl operations
#[derive(Debug, Error)]
pub enum BctlError {
    /// Blueprint validation errors, caller-fixable and never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested version is older than what is running on the cluster
    #[error("downgrade version detected - cannot downgrade provider versions (installed {installed}, requested {requested})")]
    Downgrade { installed: String, requested: String },

    /// Malformed version strings, local or remote
    #[error("Version error: {0}")]
    Version(String),

    /// An external tool ran and exited non-zero
    #[error("command `{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external tool could not be started at all
    #[error("failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// SSH connection, authentication or channel errors
    #[error("SSH error: {0}")]
    Ssh(String),

    /// A command ran over SSH and exited non-zero
    #[error("remote command `{command}` failed on {host} (exit code {code:?}): {stderr}")]
    RemoteCommand {
        host: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Candidate k0s binary rejected the node configuration
    #[error("validation of new provider version failed on host {host}: {stderr}")]
    UpgradeValidation { host: String, stderr: String },

    /// Backoff wrapper gave up
    #[error("task failed after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: String },

    /// A bounded wait elapsed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Kubeconfig read/merge/write errors
    #[error("Kubeconfig error: {0}")]
    KubeConfig(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// API server liveness probe errors
    #[error("Probe error: {0}")]
    Probe(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl BctlError {
    pub fn validation(message: impl Into<String>) -> Self {
        BctlError::Validation(message.into())
    }

    /// Errors that may clear on their own and are eligible for
    /// [`crate::retry::retry_with_backoff`] when the caller opts in.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BctlError::CommandFailed { .. }
                | BctlError::RemoteCommand { .. }
                | BctlError::Ssh(_)
                | BctlError::Timeout(_)
        )
    }
}

impl From<String> for BctlError {
    fn from(err: String) -> Self {
        BctlError::Other(err)
    }
}

impl From<&str> for BctlError {
    fn from(err: &str) -> Self {
        BctlError::Other(err.to_string())
    }
}

/// Result type alias for bctl operations
pub type Result<T> = std::result::Result<T, BctlError>;

/// Helper trait to attach context to foreign errors
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> Result<T>;
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| BctlError::Other(format!("{}: {}", context, e)))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BctlError::Other(format!("{}: {}", f(), e)))
    }
}
