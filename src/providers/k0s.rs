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

//! k0s clusters driven through k0sctl.

use crate::blueprint::Blueprint;
use crate::connection::command::display_command;
use crate::context::RunContext;
use crate::error::{BctlError, ErrorContext, Result};
use crate::k0sctl::convert_to_k0s;
use crate::k8s::KubeConfigFile;
use crate::providers::{Provider, ProviderKind};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::upgrade::UpgradeValidator;
use crate::util::io::path_as_string;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const K0SCTL: &str = "k0sctl";

// the control plane may still be starting right after `apply --no-wait`
const KUBECONFIG_ATTEMPTS: u32 = 5;

/// How `k0sctl kubeconfig` exit codes are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum K0sctlExit {
    Found,
    NotFound,
    Failed(Option<i32>),
}

impl K0sctlExit {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => K0sctlExit::Found,
            Some(1) => K0sctlExit::NotFound,
            other => K0sctlExit::Failed(other),
        }
    }
}

pub struct K0sProvider {
    name: String,
    ctx: RunContext,
    // consumed by k0sctl on every call, removed when the provider is dropped
    config_file: NamedTempFile,
}

impl K0sProvider {
    pub fn new(blueprint: &Blueprint, ctx: &RunContext) -> Result<Self> {
        let cluster = convert_to_k0s(blueprint)?;
        let mut config_file = tempfile::Builder::new()
            .prefix("k0sctl-")
            .suffix(".yaml")
            .tempfile()
            .context("unable to create k0sctl config file")?;
        config_file.write_all(cluster.to_yaml()?.as_bytes())?;
        config_file.flush()?;
        debug!(path = %config_file.path().display(), "wrote k0sctl config");
        Ok(Self {
            name: blueprint.metadata.name.clone(),
            ctx: ctx.clone(),
            config_file,
        })
    }

    pub fn config_path(&self) -> String {
        path_as_string(self.config_file.path())
    }

    fn k0sctl(&self, subcommand: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec![subcommand.to_string(), String::from("--config"), self.config_path()];
        args.extend(extra.iter().map(|a| a.to_string()));
        args
    }

    fn apply(&self) -> Result<()> {
        self.ctx.runner.run_checked(K0SCTL, &self.k0sctl("apply", &["--no-wait"]))?;
        Ok(())
    }

    fn write_kubeconfig(&self) -> Result<()> {
        let output = self.ctx.runner.run_checked(K0SCTL, &self.k0sctl("kubeconfig", &[]))?;
        let mut incoming = KubeConfigFile::parse(&output.stdout)?;
        incoming.rename_current_context(&self.name);
        self.ctx.kubeconfig.merge_config(&incoming)
    }
}

impl Provider for K0sProvider {
    fn run_context(&self) -> &RunContext {
        &self.ctx
    }

    fn install(&self) -> Result<()> {
        info!(cluster = %self.name, kubeconfig = %self.ctx.kubeconfig.path().display(), "creating k0s cluster");
        self.apply()?;
        retry_with_backoff(&RetryConfig::new(KUBECONFIG_ATTEMPTS), "write k0s kubeconfig", || self.write_kubeconfig())
    }

    fn update(&self) -> Result<()> {
        info!(cluster = %self.name, "updating k0s cluster");
        self.apply()
    }

    fn exists(&self) -> Result<bool> {
        let args = self.k0sctl("kubeconfig", &[]);
        let output = self.ctx.runner.run(K0SCTL, &args)?;
        match K0sctlExit::from_code(output.code) {
            K0sctlExit::Found => Ok(true),
            K0sctlExit::NotFound => {
                debug!(cluster = %self.name, "k0s cluster not found");
                Ok(false)
            }
            K0sctlExit::Failed(code) => Err(BctlError::CommandFailed {
                command: display_command(K0SCTL, &args),
                code,
                stderr: output.stderr,
            }),
        }
    }

    fn reset(&self) -> Result<()> {
        info!(cluster = %self.name, "resetting k0s cluster");
        self.ctx.runner.run_checked(K0SCTL, &self.k0sctl("reset", &["--force"]))?;
        self.ctx.kubeconfig.delete_context(&self.name)
    }

    fn needs_upgrade(&self, blueprint: &Blueprint) -> Result<bool> {
        let decision = UpgradeValidator::new(self.ctx.executor.as_ref()).check(blueprint)?;
        info!(cluster = %self.name, decision = %decision, "k0s version check");
        Ok(decision.needs_upgrade())
    }

    fn validate_provider_upgrade(&self, blueprint: &Blueprint) -> Result<()> {
        UpgradeValidator::new(self.ctx.executor.as_ref()).validate(blueprint)?;
        Ok(())
    }

    fn provider_type(&self) -> ProviderKind {
        ProviderKind::K0s
    }

    fn kubeconfig_context(&self) -> String {
        self.name.clone()
    }

    fn export_kubeconfig(&self) -> Result<()> {
        self.write_kubeconfig()
    }
}
