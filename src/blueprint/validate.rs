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

//! Top-down blueprint validation. The first violation wins and is reported
//! with the qualified name of the offending field.

use super::{Addon, AddonKind, Blueprint, BlueprintSpec, ChartInfo, Host, Kubernetes, ManifestInfo, Metadata, ProviderKind, SshHost, KIND};
use crate::error::{BctlError, Result};
use crate::util::io::path_exists;
use once_cell::sync::Lazy;
use regex::Regex;

// hostname or IPv4 address
static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]*[a-zA-Z0-9])\.)*([A-Za-z0-9]|[A-Za-z0-9][A-Za-z0-9\-]*[A-Za-z0-9])$")
        .expect("valid regex")
});

static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^v?(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("valid regex")
});

// 300s, 10m, 1h30m, 1.5h
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+(\.[0-9]+)?(ns|us|µs|ms|s|m|h))+$").expect("valid regex")
});

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn blank(field: &str) -> BctlError {
    BctlError::validation(format!("{} field cannot be left blank", field))
}

pub fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

impl Validate for Blueprint {
    fn validate(&self) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(blank("apiVersion"));
        }
        if self.kind.trim().is_empty() {
            return Err(blank("kind"));
        }
        if self.kind != KIND {
            return Err(BctlError::validation(format!("invalid kind: {}, must be {}", self.kind, KIND)));
        }
        self.metadata.validate()?;
        self.spec.validate()
    }
}

impl Validate for Metadata {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(blank("metadata.name"));
        }
        Ok(())
    }
}

impl Validate for BlueprintSpec {
    fn validate(&self) -> Result<()> {
        if let Some(kubernetes) = &self.kubernetes {
            kubernetes.validate()?;
        }
        for addon in self.components.addons.iter() {
            addon.validate()?;
        }
        Ok(())
    }
}

impl Validate for Kubernetes {
    fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(blank("kubernetes.provider"));
        }
        let kind = match self.provider.parse::<ProviderKind>() {
            Ok(kind @ (ProviderKind::K0s | ProviderKind::Kind)) => kind,
            _ => {
                return Err(BctlError::validation(format!(
                    "invalid kubernetes.provider: {}, must be one of k0s, kind",
                    self.provider
                )))
            }
        };

        if let Some(version) = &self.version {
            if !version.is_empty() && !is_semver(version) {
                return Err(BctlError::validation(format!("invalid kubernetes.version: {}", version)));
            }
        }

        if self.config.is_some() && self.config_path.is_some() {
            return Err(BctlError::validation("cannot specify both kubernetes.config and kubernetes.configPath"));
        }
        if let Some(path) = &self.config_path {
            if !path_exists(path) {
                return Err(BctlError::validation(format!(
                    "kubernetes.configPath file \"{}\" does not exist",
                    path
                )));
            }
        }

        if let Some(infra) = &self.infra {
            for host in infra.hosts.iter() {
                host.validate()?;
            }
        }

        if kind == ProviderKind::K0s && self.controllers().is_empty() {
            return Err(BctlError::validation(
                "kubernetes.infra.hosts must contain at least one controller for provider k0s",
            ));
        }

        // upgrade checks reach the controllers over ssh
        let versioned = self.version.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false);
        if kind == ProviderKind::K0s && versioned && self.controllers().iter().any(|h| h.ssh.is_none()) {
            return Err(BctlError::validation(
                "kubernetes.infra.hosts controllers must use ssh when kubernetes.version is set for provider k0s",
            ));
        }

        Ok(())
    }
}

impl Validate for Host {
    fn validate(&self) -> Result<()> {
        match (&self.ssh, &self.localhost) {
            (Some(ssh), None) => ssh.validate()?,
            (None, Some(_)) => {}
            _ => {
                return Err(BctlError::validation("hosts must specify exactly one of ssh or localhost"));
            }
        }
        if self.role.trim().is_empty() {
            return Err(blank("hosts.role"));
        }
        self.role()?;
        Ok(())
    }
}

impl Validate for SshHost {
    fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(blank("hosts.ssh.address"));
        }
        if !ADDRESS.is_match(&self.address) {
            return Err(BctlError::validation(format!("invalid hosts.ssh.address: {}", self.address)));
        }
        if self.key_path.is_empty() {
            return Err(blank("hosts.ssh.keyPath"));
        }
        if !path_exists(&self.key_path) {
            return Err(BctlError::validation(format!(
                "hosts.ssh.keyPath file \"{}\" does not exist",
                self.key_path
            )));
        }
        if self.port == 0 {
            return Err(BctlError::validation("hosts.ssh.port outside of valid range 1-65535"));
        }
        if self.user.is_empty() {
            return Err(blank("hosts.ssh.user"));
        }
        Ok(())
    }
}

impl Validate for Addon {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(blank("addons.name"));
        }
        if self.kind.trim().is_empty() {
            return Err(blank("addons.kind"));
        }
        match self.addon_kind()? {
            AddonKind::Chart => {
                if self.manifest.is_some() {
                    return Err(BctlError::validation(format!(
                        "addons.manifest cannot be specified for chart addon {}",
                        self.name
                    )));
                }
                match &self.chart {
                    Some(chart) => chart.validate(),
                    None => Err(BctlError::validation(format!(
                        "addons.chart must be specified for chart addon {}",
                        self.name
                    ))),
                }
            }
            AddonKind::Manifest => {
                if self.chart.is_some() {
                    return Err(BctlError::validation(format!(
                        "addons.chart cannot be specified for manifest addon {}",
                        self.name
                    )));
                }
                match &self.manifest {
                    Some(manifest) => manifest.validate(),
                    None => Err(BctlError::validation(format!(
                        "addons.manifest must be specified for manifest addon {}",
                        self.name
                    ))),
                }
            }
        }
    }
}

impl Validate for ChartInfo {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(blank("addons.chart.name"));
        }
        if self.repo.trim().is_empty() {
            return Err(blank("addons.chart.repo"));
        }
        if self.version.trim().is_empty() {
            return Err(blank("addons.chart.version"));
        }
        if let Some(values) = &self.values {
            if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(values) {
                return Err(BctlError::validation(format!("invalid addons.chart.values: {}", e)));
            }
        }
        Ok(())
    }
}

impl Validate for ManifestInfo {
    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(blank("addons.manifest.url"));
        }
        if reqwest::Url::parse(&self.url).is_err() {
            return Err(BctlError::validation(format!("invalid addons.manifest.url: {}", self.url)));
        }
        if !self.timeout.is_empty() && !DURATION.is_match(&self.timeout) {
            return Err(BctlError::validation(format!("invalid addons.manifest.timeout: {}", self.timeout)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{parse_blueprint, Components, Infra, LocalHost};

    fn minimal() -> Blueprint {
        parse_blueprint("apiVersion: blueprint.mirantis.com/v1alpha1\nkind: Blueprint\nmetadata:\n  name: test\n").unwrap()
    }

    fn message(bp: &Blueprint) -> String {
        bp.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_minimal_is_valid() {
        minimal().validate().unwrap();
    }

    #[test]
    fn test_blank_api_version() {
        let mut bp = minimal();
        bp.api_version = String::new();
        assert!(message(&bp).contains("apiVersion field cannot be left blank"));
    }

    #[test]
    fn test_wrong_kind() {
        let mut bp = minimal();
        bp.kind = String::from("Cluster");
        assert!(message(&bp).contains("invalid kind: Cluster"));
    }

    #[test]
    fn test_missing_name() {
        let mut bp = minimal();
        bp.metadata.name = String::new();
        assert!(message(&bp).contains("metadata.name"));
    }

    #[test]
    fn test_provider_must_be_known() {
        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes { provider: String::from("existing"), ..Default::default() });
        assert!(message(&bp).contains("invalid kubernetes.provider: existing"));
        bp.spec.kubernetes = Some(Kubernetes::default());
        assert!(message(&bp).contains("kubernetes.provider field cannot be left blank"));
    }

    #[test]
    fn test_version_grammar() {
        assert!(is_semver("1.29.2+k0s.0"));
        assert!(is_semver("v1.2.3"));
        assert!(is_semver("1.2.3-rc.1"));
        assert!(!is_semver("1.2"));
        assert!(!is_semver("latest"));

        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes {
            provider: String::from("kind"),
            version: Some(String::from("one.two")),
            ..Default::default()
        });
        assert!(message(&bp).contains("invalid kubernetes.version"));
    }

    #[test]
    fn test_config_and_config_path_exclusive() {
        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes {
            provider: String::from("kind"),
            config: Some(serde_yaml::Mapping::new()),
            config_path: Some(String::from("/tmp")),
            ..Default::default()
        });
        assert!(message(&bp).contains("cannot specify both"));
    }

    #[test]
    fn test_config_path_must_exist() {
        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes {
            provider: String::from("kind"),
            config_path: Some(String::from("/non/existent/kind.yaml")),
            ..Default::default()
        });
        assert!(message(&bp).contains("does not exist"));
    }

    #[test]
    fn test_host_needs_exactly_one_connection() {
        let host = Host { role: String::from("controller"), ..Default::default() };
        assert!(host.validate().unwrap_err().to_string().contains("exactly one of ssh or localhost"));
    }

    #[test]
    fn test_host_role_checked() {
        let mut host = Host {
            localhost: Some(LocalHost { enabled: true }),
            ..Default::default()
        };
        assert!(host.validate().unwrap_err().to_string().contains("hosts.role field cannot be left blank"));
        host.role = String::from("master");
        assert!(host.validate().unwrap_err().to_string().contains("invalid hosts.role: master"));
        host.role = String::from("single");
        host.validate().unwrap();
    }

    #[test]
    fn test_ssh_host_fields() {
        let mut ssh = SshHost {
            address: String::from("bad address!"),
            key_path: String::from("/"),
            port: 22,
            user: String::from("root"),
        };
        assert!(ssh.validate().unwrap_err().to_string().contains("invalid hosts.ssh.address"));
        ssh.address = String::from("node-1.example.com");
        ssh.validate().unwrap();
        ssh.port = 0;
        assert!(ssh.validate().unwrap_err().to_string().contains("hosts.ssh.port"));
        ssh.port = 22;
        ssh.key_path = String::from("/non/existent/id_rsa");
        assert!(ssh.validate().unwrap_err().to_string().contains("keyPath"));
        ssh.key_path = String::from("/");
        ssh.user = String::new();
        assert!(ssh.validate().unwrap_err().to_string().contains("hosts.ssh.user"));
    }

    #[test]
    fn test_k0s_needs_a_controller() {
        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes {
            provider: String::from("k0s"),
            infra: Some(Infra {
                hosts: vec![Host {
                    localhost: Some(LocalHost { enabled: true }),
                    role: String::from("worker"),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        });
        assert!(message(&bp).contains("at least one controller"));
    }

    #[test]
    fn test_versioned_k0s_controller_needs_ssh() {
        let mut bp = minimal();
        bp.spec.kubernetes = Some(Kubernetes {
            provider: String::from("k0s"),
            version: Some(String::from("1.29.2+k0s.0")),
            infra: Some(Infra {
                hosts: vec![Host {
                    localhost: Some(LocalHost { enabled: true }),
                    role: String::from("single"),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        });
        assert!(message(&bp).contains("controllers must use ssh"));

        bp.spec.kubernetes.as_mut().unwrap().version = None;
        bp.validate().unwrap();
    }

    #[test]
    fn test_addon_kind_blank() {
        let mut bp = minimal();
        bp.spec.components = Components {
            core: None,
            addons: vec![Addon { name: String::from("x"), ..Default::default() }],
        };
        assert!(message(&bp).contains("addons.kind field cannot be left blank"));
    }

    #[test]
    fn test_addon_block_must_match_kind() {
        let chart = Addon {
            name: String::from("x"),
            kind: String::from("chart"),
            manifest: Some(ManifestInfo { url: String::from("https://example.com/a.yaml"), ..Default::default() }),
            ..Default::default()
        };
        assert!(chart.validate().unwrap_err().to_string().contains("addons.manifest cannot be specified"));
    }

    #[test]
    fn test_manifest_url_and_timeout() {
        let mut manifest = ManifestInfo { url: String::from("not a url"), ..Default::default() };
        assert!(manifest.validate().unwrap_err().to_string().contains("invalid addons.manifest.url"));
        manifest.url = String::from("https://example.com/metallb.yaml");
        manifest.timeout = String::from("ten minutes");
        assert!(manifest.validate().unwrap_err().to_string().contains("timeout"));
        manifest.timeout = String::from("10m");
        manifest.validate().unwrap();
    }

    #[test]
    fn test_chart_values_must_be_yaml() {
        let chart = ChartInfo {
            name: String::from("nginx"),
            repo: String::from("https://charts.bitnami.com/bitnami"),
            version: String::from("15.1.1"),
            values: Some(String::from("key: [unclosed")),
            ..Default::default()
        };
        assert!(chart.validate().unwrap_err().to_string().contains("addons.chart.values"));
    }
}
