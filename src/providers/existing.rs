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

//! A cluster bctl did not create and will never modify or destroy.

use crate::blueprint::Blueprint;
use crate::context::RunContext;
use crate::error::{BctlError, Result};
use crate::providers::{Provider, ProviderKind};
use std::time::Duration;
use tracing::debug;

const LIVENESS_PATH: &str = "/livez/verbose";

/// What an unauthenticated GET against the API server told us
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    /// The server answered 401/403: it is there, we just have no credentials
    Unauthorized,
    /// Connection refused, DNS failure, timeout
    Unreachable(String),
    Failed(String),
}

pub trait HealthProbe: Send + Sync {
    fn probe(&self, url: &str) -> ProbeOutcome;
}

/// [`HealthProbe`] using reqwest. TLS verification is off and no
/// credentials are sent.
#[derive(Clone, Debug)]
pub struct ReqwestProbe {
    timeout: Duration,
}

impl Default for ReqwestProbe {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10) }
    }
}

impl ReqwestProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl HealthProbe for ReqwestProbe {
    fn probe(&self, url: &str) -> ProbeOutcome {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => return ProbeOutcome::Failed(format!("failed to create async runtime: {}", e)),
        };

        rt.block_on(async {
            let client = match reqwest::Client::builder()
                .danger_accept_invalid_certs(true)
                .timeout(self.timeout)
                .build()
            {
                Ok(client) => client,
                Err(e) => return ProbeOutcome::Failed(format!("failed to create HTTP client: {}", e)),
            };

            match client.get(url).send().await {
                Ok(response) => classify_status(response.status().as_u16()),
                Err(e) if e.is_connect() || e.is_timeout() => ProbeOutcome::Unreachable(e.to_string()),
                Err(e) => ProbeOutcome::Failed(e.to_string()),
            }
        })
    }
}

pub fn classify_status(status: u16) -> ProbeOutcome {
    match status {
        200..=299 => ProbeOutcome::Healthy,
        401 | 403 => ProbeOutcome::Unauthorized,
        other => ProbeOutcome::Failed(format!("unexpected status {} from API server", other)),
    }
}

pub struct ExistingProvider {
    ctx: RunContext,
}

impl ExistingProvider {
    pub fn new(_blueprint: &Blueprint, ctx: &RunContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn liveness_url(&self) -> Result<String> {
        let config = self.ctx.kubeconfig.load()?;
        let server = config.current_server().ok_or_else(|| {
            BctlError::KubeConfig(format!(
                "no API server found for the current context in {}",
                self.ctx.kubeconfig.path().display()
            ))
        })?;
        Ok(format!("{}{}", server.trim_end_matches('/'), LIVENESS_PATH))
    }
}

impl Provider for ExistingProvider {
    fn run_context(&self) -> &RunContext {
        &self.ctx
    }

    fn install(&self) -> Result<()> {
        debug!("nothing done to install an existing cluster");
        Ok(())
    }

    fn update(&self) -> Result<()> {
        debug!("nothing done to update an existing cluster");
        Ok(())
    }

    fn exists(&self) -> Result<bool> {
        let url = self.liveness_url()?;
        match self.ctx.probe.probe(&url) {
            ProbeOutcome::Healthy | ProbeOutcome::Unauthorized => Ok(true),
            ProbeOutcome::Unreachable(reason) => {
                debug!(url = %url, reason = %reason, "API server unreachable");
                Ok(false)
            }
            ProbeOutcome::Failed(reason) => Err(BctlError::Probe(format!("{}: {}", url, reason))),
        }
    }

    fn reset(&self) -> Result<()> {
        debug!("nothing done to reset an existing cluster");
        Ok(())
    }

    fn needs_upgrade(&self, _blueprint: &Blueprint) -> Result<bool> {
        Ok(false)
    }

    fn validate_provider_upgrade(&self, _blueprint: &Blueprint) -> Result<()> {
        Ok(())
    }

    fn provider_type(&self) -> ProviderKind {
        ProviderKind::Existing
    }

    fn kubeconfig_context(&self) -> String {
        String::new()
    }

    fn export_kubeconfig(&self) -> Result<()> {
        Err(BctlError::validation(format!("provider: {} not supported", ProviderKind::Existing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::parse_blueprint;
    use crate::config::BctlConfig;
    use crate::fakes::{FakeExecutor, FakeProbe, FakeRunner};
    use std::sync::Arc;
    use tempfile::TempDir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: corp
  cluster:
    server: https://api.corp.example:6443/
contexts:
- name: corp
  context:
    cluster: corp
    user: me
current-context: corp
"#;

    fn provider(outcome: ProbeOutcome, dir: &TempDir, kubeconfig: &str) -> ExistingProvider {
        let path = dir.path().join("config");
        std::fs::write(&path, kubeconfig).unwrap();
        let ctx = RunContext::with_collaborators(
            BctlConfig::new().kubeconfig(&path.display().to_string()),
            Arc::new(FakeRunner::new()),
            Arc::new(FakeExecutor::new()),
            Arc::new(FakeProbe(outcome)),
        );
        let bp = parse_blueprint("apiVersion: v1\nkind: Blueprint\nmetadata:\n  name: corp\n").unwrap();
        ExistingProvider::new(&bp, &ctx)
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), ProbeOutcome::Healthy);
        assert_eq!(classify_status(401), ProbeOutcome::Unauthorized);
        assert_eq!(classify_status(403), ProbeOutcome::Unauthorized);
        assert!(matches!(classify_status(500), ProbeOutcome::Failed(_)));
    }

    #[test]
    fn test_liveness_url() {
        let dir = TempDir::new().unwrap();
        let p = provider(ProbeOutcome::Healthy, &dir, KUBECONFIG);
        assert_eq!(p.liveness_url().unwrap(), "https://api.corp.example:6443/livez/verbose");
    }

    #[test]
    fn test_exists_classification() {
        let dir = TempDir::new().unwrap();
        assert!(provider(ProbeOutcome::Unauthorized, &dir, KUBECONFIG).exists().unwrap());
        assert!(provider(ProbeOutcome::Healthy, &dir, KUBECONFIG).exists().unwrap());
        assert!(!provider(ProbeOutcome::Unreachable(String::from("connection refused")), &dir, KUBECONFIG)
            .exists()
            .unwrap());
        let err = provider(ProbeOutcome::Failed(String::from("bad gateway")), &dir, KUBECONFIG)
            .exists()
            .unwrap_err();
        assert!(matches!(err, BctlError::Probe(_)));
    }

    #[test]
    fn test_no_current_context_is_error() {
        let dir = TempDir::new().unwrap();
        let err = provider(ProbeOutcome::Healthy, &dir, "apiVersion: v1\nkind: Config\n").exists().unwrap_err();
        assert!(matches!(err, BctlError::KubeConfig(_)));
    }

    #[test]
    fn test_lifecycle_is_noop() {
        let dir = TempDir::new().unwrap();
        let p = provider(ProbeOutcome::Healthy, &dir, KUBECONFIG);
        p.install().unwrap();
        p.update().unwrap();
        p.reset().unwrap();
        assert!(p.export_kubeconfig().is_err());
        assert_eq!(p.provider_type(), ProviderKind::Existing);
        assert!(p.client().context().is_none());
    }
}
