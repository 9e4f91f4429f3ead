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

//! Conversion between blueprints and k0sctl cluster configuration.

use crate::blueprint::{
    Addon, Blueprint, BlueprintSpec, ChartInfo, Components, Core, CoreComponent, Host, Infra, Kubernetes, LocalHost,
    Metadata, SshHost, API_VERSION, KIND,
};
use crate::error::{BctlError, Result};
use crate::upgrade::parse_version;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

pub const K0SCTL_API_VERSION: &str = "k0sctl.k0sproject.io/v1beta1";
pub const K0SCTL_KIND: &str = "Cluster";

// blueprint-level switch, not part of the k0s config itself
const DYNAMIC_CONFIG_KEY: &str = "dynamicConfig";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct K0sctlCluster {
    pub api_version: String,
    pub kind: String,
    pub metadata: K0sctlMetadata,
    pub spec: K0sctlSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct K0sctlMetadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct K0sctlSpec {
    #[serde(default)]
    pub hosts: Vec<K0sctlHost>,
    #[serde(default)]
    pub k0s: K0sSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct K0sctlHost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<K0sctlSsh>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localhost: Option<K0sctlLocalhost>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct K0sctlSsh {
    pub address: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
}

fn default_port() -> u16 {
    22
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct K0sctlLocalhost {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct K0sSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dynamic_config: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Mapping>,
}

impl K0sctlCluster {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn parse_k0sctl(contents: &str) -> Result<K0sctlCluster> {
    serde_yaml::from_str(contents).map_err(|e| BctlError::Config(format!("unable to parse k0sctl config: {}", e)))
}

fn convert_host(host: &Host) -> K0sctlHost {
    K0sctlHost {
        ssh: host.ssh.as_ref().map(|ssh| K0sctlSsh {
            address: ssh.address.clone(),
            user: ssh.user.clone(),
            port: ssh.port,
            key_path: Some(ssh.key_path.clone()),
        }),
        localhost: host.localhost.as_ref().map(|l| K0sctlLocalhost { enabled: l.enabled }),
        role: host.role.clone(),
        install_flags: host.install_flags.clone(),
    }
}

/// Build the k0sctl cluster definition for a k0s blueprint
pub fn convert_to_k0s(blueprint: &Blueprint) -> Result<K0sctlCluster> {
    let kubernetes = blueprint
        .spec
        .kubernetes
        .as_ref()
        .ok_or_else(|| BctlError::validation("spec.kubernetes is required for provider k0s"))?;

    let version = match blueprint.declared_version() {
        Some(v) => {
            let parsed = parse_version(v)
                .map_err(|e| BctlError::Version(format!("unable to parse provided version as valid k0s version: {}", e)))?;
            Some(format!("v{}", parsed))
        }
        None => None,
    };

    let mut config = kubernetes.config.clone();
    let dynamic_config = match config.as_mut() {
        Some(mapping) => mapping
            .remove(DYNAMIC_CONFIG_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        None => false,
    };
    let config = config.filter(|m| !m.is_empty());

    Ok(K0sctlCluster {
        api_version: K0SCTL_API_VERSION.to_string(),
        kind: K0SCTL_KIND.to_string(),
        metadata: K0sctlMetadata { name: blueprint.metadata.name.clone() },
        spec: K0sctlSpec {
            hosts: blueprint.hosts().iter().map(convert_host).collect(),
            k0s: K0sSpec { version, dynamic_config, config },
        },
    })
}

/// Starter blueprint from a k0sctl cluster definition
pub fn convert_from_k0s(cluster: &K0sctlCluster, components: Components) -> Blueprint {
    let hosts = cluster
        .spec
        .hosts
        .iter()
        .map(|h| Host {
            ssh: h.ssh.as_ref().map(|ssh| SshHost {
                address: ssh.address.clone(),
                key_path: ssh.key_path.clone().unwrap_or_default(),
                port: ssh.port,
                user: ssh.user.clone(),
            }),
            localhost: h.localhost.as_ref().map(|l| LocalHost { enabled: l.enabled }),
            role: h.role.clone(),
            install_flags: h.install_flags.clone(),
        })
        .collect();

    let mut config = cluster.spec.k0s.config.clone();
    if cluster.spec.k0s.dynamic_config {
        config
            .get_or_insert_with(Mapping::new)
            .insert(Value::from(DYNAMIC_CONFIG_KEY), Value::Bool(true));
    }

    Blueprint {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        metadata: Metadata { name: cluster.metadata.name.clone() },
        spec: BlueprintSpec {
            kubernetes: Some(Kubernetes {
                provider: String::from("k0s"),
                version: cluster.spec.k0s.version.clone(),
                config,
                config_path: None,
                infra: Some(Infra { hosts }),
            }),
            components,
        },
    }
}

/// Starter blueprint for a kind cluster
pub fn blueprint_for_kind(name: &str, components: Components) -> Blueprint {
    Blueprint {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        metadata: Metadata { name: name.to_string() },
        spec: BlueprintSpec {
            kubernetes: Some(Kubernetes { provider: String::from("kind"), ..Default::default() }),
            components,
        },
    }
}

/// Components written into starter blueprints by `bctl init`
pub fn default_components() -> Components {
    let node_ports: Mapping = [("http", 30000), ("https", 30001)]
        .into_iter()
        .map(|(k, v)| (Value::from(k), Value::from(v)))
        .collect();
    let mut service = Mapping::new();
    service.insert(Value::from("type"), Value::from("NodePort"));
    service.insert(Value::from("nodePorts"), Value::Mapping(node_ports));
    let mut controller = Mapping::new();
    controller.insert(Value::from("service"), Value::Mapping(service));
    let mut ingress_config = Mapping::new();
    ingress_config.insert(Value::from("controller"), Value::Mapping(controller));

    Components {
        core: Some(Core {
            ingress: Some(CoreComponent {
                enabled: true,
                provider: String::from("ingress-nginx"),
                config: Some(ingress_config),
            }),
            ..Default::default()
        }),
        addons: vec![Addon {
            name: String::from("example-server"),
            kind: String::from("chart"),
            enabled: true,
            namespace: String::from("default"),
            chart: Some(ChartInfo {
                name: String::from("nginx"),
                repo: String::from("https://charts.bitnami.com/bitnami"),
                version: String::from("15.1.1"),
                values: Some(String::from("service:\n  type: ClusterIP\n")),
                ..Default::default()
            }),
            ..Default::default()
        }],
    }
}
