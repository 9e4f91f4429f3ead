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

//! Pre-flight checks for k0s version upgrades.
//!
//! The installed version is read from the first controller. A newer declared
//! version is staged next to the running one on every controller and asked to
//! validate the node's persisted configuration before anything is mutated.

use crate::blueprint::{Blueprint, Host};
use crate::connection::{RemoteExecutor, SshTarget};
use crate::error::{BctlError, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, error, info, warn};

pub const VERSION_COMMAND: &str = "sudo k0s version";
pub const STAGED_BINARY: &str = "/tmp/k0s";
pub const NODE_CONFIG: &str = "/etc/k0s/k0s.yaml";

/// Parse a version as printed by k0s or written in a blueprint (`v` prefix optional)
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| BctlError::Version(format!("unable to parse version {:?}: {}", raw, e)))
}

// semver precedence: build metadata (+k0s.0) does not take part
fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeDecision {
    UpToDate,
    Upgrade { from: Version, to: Version },
}

impl UpgradeDecision {
    pub fn needs_upgrade(&self) -> bool {
        matches!(self, UpgradeDecision::Upgrade { .. })
    }
}

impl fmt::Display for UpgradeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeDecision::UpToDate => write!(f, "no upgrade needed"),
            UpgradeDecision::Upgrade { from, to } => write!(f, "upgrade from v{} to v{}", from, to),
        }
    }
}

/// Decide what a declared version means against the installed one.
/// Asking for an older version is a [`BctlError::Downgrade`].
pub fn compare(installed: &Version, declared: &Version) -> Result<UpgradeDecision> {
    match precedence(declared, installed) {
        Ordering::Greater => Ok(UpgradeDecision::Upgrade { from: installed.clone(), to: declared.clone() }),
        Ordering::Equal => Ok(UpgradeDecision::UpToDate),
        Ordering::Less => Err(BctlError::Downgrade {
            installed: installed.to_string(),
            requested: declared.to_string(),
        }),
    }
}

/// Staging command: the k0s install script, redirected to install into /tmp
pub fn stage_command(version: &Version) -> String {
    format!(
        "curl -sSLf https://get.k0s.sh | sed -e 's;k0sInstallPath=/usr/local/bin;k0sInstallPath={};' | sudo K0S_VERSION=v{} sh",
        STAGED_BINARY.trim_end_matches("/k0s"),
        version
    )
}

pub fn validate_command() -> String {
    format!("sudo {} config validate --config {}", STAGED_BINARY, NODE_CONFIG)
}

pub fn cleanup_command() -> String {
    format!("sudo rm -f {}", STAGED_BINARY)
}

/// Records every host a candidate binary was staged on and removes it from
/// all of them when dropped. Removal failures are logged, never returned.
pub struct StagedArtifacts<'a> {
    executor: &'a dyn RemoteExecutor,
    touched: Vec<SshTarget>,
}

impl<'a> StagedArtifacts<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor) -> Self {
        Self { executor, touched: Vec::new() }
    }

    pub fn touch(&mut self, target: &SshTarget) {
        self.touched.push(target.clone());
    }

    pub fn hosts(&self) -> Vec<&str> {
        self.touched.iter().map(|t| t.address.as_str()).collect()
    }
}

impl Drop for StagedArtifacts<'_> {
    fn drop(&mut self) {
        let command = cleanup_command();
        for target in self.touched.iter() {
            match self.executor.remote_command(target, &command) {
                Ok(_) => debug!(host = %target.address, "removed staged k0s binary"),
                Err(e) => warn!(host = %target.address, error = %e, "failed to clean up temp k0s binary"),
            }
        }
    }
}

fn ssh_target(host: &Host) -> Result<SshTarget> {
    match &host.ssh {
        Some(ssh) => SshTarget::from_host(ssh),
        None => Err(BctlError::validation(format!(
            "controller host with role {} has no ssh block; remote version checks need ssh",
            host.role
        ))),
    }
}

pub struct UpgradeValidator<'a> {
    executor: &'a dyn RemoteExecutor,
}

impl<'a> UpgradeValidator<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor) -> Self {
        Self { executor }
    }

    fn controllers<'b>(&self, blueprint: &'b Blueprint) -> Result<Vec<&'b Host>> {
        let controllers = blueprint
            .spec
            .kubernetes
            .as_ref()
            .map(|k| k.controllers())
            .unwrap_or_default();
        if controllers.is_empty() {
            return Err(BctlError::validation("no controller hosts found in blueprint"));
        }
        Ok(controllers)
    }

    /// Version of k0s running on the first controller
    pub fn installed_version(&self, blueprint: &Blueprint) -> Result<Version> {
        let controllers = self.controllers(blueprint)?;
        let target = ssh_target(controllers[0])?;
        let (stdout, _) = self.executor.remote_command(&target, VERSION_COMMAND)?;
        debug!(host = %target.address, version = %stdout, "installed k0s version");
        parse_version(&stdout)
    }

    /// Compare the installed version with the blueprint's. No node is modified.
    pub fn check(&self, blueprint: &Blueprint) -> Result<UpgradeDecision> {
        let declared = match blueprint.declared_version() {
            Some(v) => parse_version(v)?,
            None => {
                debug!("no kubernetes version declared, skipping upgrade check");
                return Ok(UpgradeDecision::UpToDate);
            }
        };
        let installed = self.installed_version(blueprint)?;
        compare(&installed, &declared)
    }

    /// [`UpgradeValidator::check`], then for an upgrade stage and validate the
    /// candidate on every controller.
    pub fn validate(&self, blueprint: &Blueprint) -> Result<UpgradeDecision> {
        let decision = self.check(blueprint)?;
        if let UpgradeDecision::Upgrade { to, .. } = &decision {
            self.validate_controllers(&self.controllers(blueprint)?, to)?;
        }
        Ok(decision)
    }

    /// Controllers are visited in order; the first failure aborts the run.
    /// Staged binaries are removed from every visited controller either way.
    pub fn validate_controllers(&self, controllers: &[&Host], version: &Version) -> Result<()> {
        let mut staged = StagedArtifacts::new(self.executor);

        for host in controllers.iter() {
            let target = ssh_target(host)?;

            info!(host = %target.address, version = %version, "downloading new version of k0s binary");
            staged.touch(&target);
            if let Err(e) = self.executor.remote_command(&target, &stage_command(version)) {
                error!(host = %target.address, error = %e, "failed to install new version of k0s binary");
                return Err(e);
            }

            info!(host = %target.address, "validating existing config with new version of k0s binary");
            match self.executor.remote_command(&target, &validate_command()) {
                Ok(_) => {}
                Err(BctlError::RemoteCommand { stderr, .. }) => {
                    error!(host = %target.address, stderr = %stderr, "validation of new provider version failed");
                    return Err(BctlError::UpgradeValidation { host: target.address.clone(), stderr });
                }
                Err(e) => return Err(e),
            }
        }

        info!(hosts = ?staged.hosts(), "new provider version successfully validated");
        Ok(())
    }
}
