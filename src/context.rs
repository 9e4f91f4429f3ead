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

//! Per-invocation state handed by reference to every component.

use crate::config::BctlConfig;
use crate::connection::{CommandRunner, LocalRunner, RemoteExecutor, SshExecutor};
use crate::k8s::KubeConfig;
use crate::providers::existing::{HealthProbe, ReqwestProbe};
use std::sync::Arc;

#[derive(Clone)]
pub struct RunContext {
    pub config: BctlConfig,
    pub kubeconfig: KubeConfig,
    pub runner: Arc<dyn CommandRunner>,
    pub executor: Arc<dyn RemoteExecutor>,
    pub probe: Arc<dyn HealthProbe>,
}

impl RunContext {
    /// Context wired to real processes, SSH and HTTP
    pub fn new(config: BctlConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(LocalRunner::new()),
            Arc::new(SshExecutor::new()),
            Arc::new(ReqwestProbe::new()),
        )
    }

    pub fn with_collaborators(
        config: BctlConfig,
        runner: Arc<dyn CommandRunner>,
        executor: Arc<dyn RemoteExecutor>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let kubeconfig = KubeConfig::new(config.kubeconfig_path.clone());
        Self { config, kubeconfig, runner, executor, probe }
    }
}
