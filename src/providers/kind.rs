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

//! Local clusters running in containers, managed by the `kind` CLI.

use crate::blueprint::Blueprint;
use crate::connection::local::args;
use crate::context::RunContext;
use crate::error::{ErrorContext, Result};
use crate::providers::{Provider, ProviderKind};
use crate::util::io::{expand_path, path_as_string};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const KIND: &str = "kind";

/// Where the `--config` passed to `kind create cluster` comes from
enum KindConfig {
    None,
    Path(PathBuf),
    // rendered from the inline blueprint config
    Rendered(NamedTempFile),
}

impl KindConfig {
    fn path(&self) -> Option<String> {
        match self {
            KindConfig::None => None,
            KindConfig::Path(p) => Some(path_as_string(p)),
            KindConfig::Rendered(file) => Some(path_as_string(file.path())),
        }
    }
}

pub struct KindProvider {
    name: String,
    ctx: RunContext,
    config: KindConfig,
}

impl KindProvider {
    pub fn new(blueprint: &Blueprint, ctx: &RunContext) -> Result<Self> {
        let kubernetes = blueprint.spec.kubernetes.as_ref();
        let config = match (
            kubernetes.and_then(|k| k.config_path.as_deref()),
            kubernetes.and_then(|k| k.config.as_ref()),
        ) {
            (Some(path), _) => KindConfig::Path(expand_path(path)),
            (None, Some(inline)) => {
                let mut file = tempfile::Builder::new()
                    .prefix("kind-")
                    .suffix(".yaml")
                    .tempfile()
                    .context("unable to create kind config file")?;
                file.write_all(serde_yaml::to_string(inline)?.as_bytes())?;
                file.flush()?;
                KindConfig::Rendered(file)
            }
            (None, None) => KindConfig::None,
        };
        Ok(Self {
            name: blueprint.metadata.name.clone(),
            ctx: ctx.clone(),
            config,
        })
    }

    fn kubeconfig_path(&self) -> String {
        path_as_string(self.ctx.kubeconfig.path())
    }

    fn kind(&self, arguments: &[&str]) -> Result<String> {
        Ok(self.ctx.runner.run_checked(KIND, &args(arguments.iter().copied()))?.stdout)
    }
}

impl Provider for KindProvider {
    fn run_context(&self) -> &RunContext {
        &self.ctx
    }

    fn install(&self) -> Result<()> {
        info!(cluster = %self.name, "creating kind cluster");
        let kubeconfig = self.kubeconfig_path();
        let mut arguments = vec!["create", "cluster", "-n", self.name.as_str(), "--kubeconfig", kubeconfig.as_str()];
        let config = self.config.path();
        if let Some(config) = config.as_deref() {
            arguments.extend_from_slice(&["--config", config]);
        }
        self.kind(&arguments)?;
        Ok(())
    }

    fn update(&self) -> Result<()> {
        debug!(cluster = %self.name, "kind clusters are not updated in place");
        Ok(())
    }

    fn exists(&self) -> Result<bool> {
        let clusters = self.kind(&["get", "clusters"])?;
        Ok(clusters.lines().any(|line| line.trim() == self.name))
    }

    fn reset(&self) -> Result<()> {
        info!(cluster = %self.name, "deleting kind cluster");
        let kubeconfig = self.kubeconfig_path();
        self.kind(&["delete", "clusters", self.name.as_str(), "--kubeconfig", kubeconfig.as_str()])?;
        Ok(())
    }

    fn needs_upgrade(&self, _blueprint: &Blueprint) -> Result<bool> {
        debug!(cluster = %self.name, "kind clusters are never upgraded");
        Ok(false)
    }

    fn validate_provider_upgrade(&self, _blueprint: &Blueprint) -> Result<()> {
        Ok(())
    }

    fn provider_type(&self) -> ProviderKind {
        ProviderKind::Kind
    }

    fn kubeconfig_context(&self) -> String {
        format!("kind-{}", self.name)
    }

    fn export_kubeconfig(&self) -> Result<()> {
        let kubeconfig = self.kubeconfig_path();
        self.kind(&["export", "kubeconfig", "--name", self.name.as_str(), "--kubeconfig", kubeconfig.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::parse_blueprint;
    use crate::config::BctlConfig;
    use crate::fakes::{FakeExecutor, FakeProbe, FakeRunner};
    use crate::providers::existing::ProbeOutcome;
    use std::sync::Arc;

    fn setup(blueprint: &str) -> (Arc<FakeRunner>, KindProvider) {
        let runner = Arc::new(FakeRunner::new());
        let ctx = RunContext::with_collaborators(
            BctlConfig::new().kubeconfig("/tmp/kc"),
            runner.clone(),
            Arc::new(FakeExecutor::new()),
            Arc::new(FakeProbe(ProbeOutcome::Healthy)),
        );
        let provider = KindProvider::new(&parse_blueprint(blueprint).unwrap(), &ctx).unwrap();
        (runner, provider)
    }

    const PLAIN: &str = "apiVersion: blueprint.mirantis.com/v1alpha1\nkind: Blueprint\nmetadata:\n  name: dev\nspec:\n  kubernetes:\n    provider: kind\n";

    #[test]
    fn test_install_without_config() {
        let (runner, provider) = setup(PLAIN);
        provider.install().unwrap();
        assert_eq!(runner.calls(), vec!["kind create cluster -n dev --kubeconfig /tmp/kc"]);
    }

    #[test]
    fn test_install_renders_inline_config() {
        let (runner, provider) = setup(&format!(
            "{}    config:\n      kind: Cluster\n      apiVersion: kind.x-k8s.io/v1alpha4\n",
            PLAIN
        ));
        provider.install().unwrap();
        let call = &runner.calls()[0];
        let path = call.split("--config ").nth(1).unwrap();
        let rendered = std::fs::read_to_string(path).unwrap();
        assert!(rendered.contains("kind.x-k8s.io/v1alpha4"));
    }

    #[test]
    fn test_install_uses_config_path() {
        let (runner, provider) = setup(&format!("{}    configPath: /etc/kind.yaml\n", PLAIN));
        provider.install().unwrap();
        assert!(runner.calls()[0].ends_with("--config /etc/kind.yaml"));
    }

    #[test]
    fn test_exists_matches_whole_lines() {
        let (runner, provider) = setup(PLAIN);
        runner.respond_ok("kind get clusters", "dev-old\nstaging");
        assert!(!provider.exists().unwrap());

        let (runner, provider) = setup(PLAIN);
        runner.respond_ok("kind get clusters", "staging\ndev");
        assert!(provider.exists().unwrap());
    }

    #[test]
    fn test_context_and_lifecycle_commands() {
        let (runner, provider) = setup(PLAIN);
        assert_eq!(provider.kubeconfig_context(), "kind-dev");
        assert!(!provider.needs_upgrade(&parse_blueprint(PLAIN).unwrap()).unwrap());
        provider.update().unwrap();
        provider.export_kubeconfig().unwrap();
        provider.reset().unwrap();
        assert_eq!(
            runner.calls(),
            vec![
                "kind export kubeconfig --name dev --kubeconfig /tmp/kc",
                "kind delete clusters dev --kubeconfig /tmp/kc",
            ]
        );
    }
}
