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

//! Cluster providers: the backends that own a cluster's lifecycle.
//!
//! A blueprint's `spec.kubernetes.provider` picks one:
//!
//! ```yaml
//! spec:
//!   kubernetes:
//!     provider: kind        # or k0s; leave kubernetes out for an existing cluster
//! ```

pub mod existing;
pub mod k0s;
pub mod kind;

use crate::blueprint::Blueprint;
use crate::components::NAMESPACE_BLUEPRINT;
use crate::context::RunContext;
use crate::error::Result;
use crate::k8s::{KubeConfig, Kubectl};
use tracing::info;

pub use crate::blueprint::ProviderKind;
pub use existing::ExistingProvider;
pub use k0s::K0sProvider;
pub use kind::KindProvider;

/// Lifecycle operations every provider offers
pub trait Provider {
    fn run_context(&self) -> &RunContext;

    /// Bring the cluster into existence. May return before it has converged.
    fn install(&self) -> Result<()>;

    /// Re-apply the blueprint-derived configuration
    fn update(&self) -> Result<()>;

    fn exists(&self) -> Result<bool>;

    /// Tear down whatever this provider created
    fn reset(&self) -> Result<()>;

    /// True when the declared version is newer than the installed one.
    /// An older declared version is an error.
    fn needs_upgrade(&self, blueprint: &Blueprint) -> Result<bool>;

    fn validate_provider_upgrade(&self, blueprint: &Blueprint) -> Result<()>;

    fn provider_type(&self) -> ProviderKind;

    /// Context name in the managed kubeconfig; empty means the current context
    fn kubeconfig_context(&self) -> String;

    /// Write or refresh the cluster's entries in the managed kubeconfig
    fn export_kubeconfig(&self) -> Result<()>;

    fn kubeconfig(&self) -> &KubeConfig {
        &self.run_context().kubeconfig
    }

    /// Client for this cluster. Does not wait for anything.
    fn client(&self) -> Kubectl {
        let ctx = self.run_context();
        Kubectl::new(ctx.runner.clone(), ctx.kubeconfig.path(), Some(self.kubeconfig_context()))
    }

    /// Build the client and block until every node is ready.
    fn setup_client(&self) -> Result<Kubectl> {
        self.wait_for_nodes()?;
        Ok(self.client())
    }

    fn wait_for_nodes(&self) -> Result<()> {
        let config = &self.run_context().config;
        self.client().wait_for_nodes(config.node_wait_timeout, config.poll_interval)
    }

    fn wait_for_pods(&self) -> Result<()> {
        let config = &self.run_context().config;
        self.client()
            .wait_for_pods(NAMESPACE_BLUEPRINT, config.pod_wait_timeout, config.poll_interval)
    }
}

/// Select the provider for a blueprint
pub fn get_provider(blueprint: &Blueprint, ctx: &RunContext) -> Result<Box<dyn Provider>> {
    let kind = blueprint.provider_kind()?;
    info!(provider = %kind, cluster = %blueprint.metadata.name, "selected provider");
    match kind {
        ProviderKind::K0s => Ok(Box::new(K0sProvider::new(blueprint, ctx)?)),
        ProviderKind::Kind => Ok(Box::new(KindProvider::new(blueprint, ctx)?)),
        ProviderKind::Existing => Ok(Box::new(ExistingProvider::new(blueprint, ctx))),
    }
}
