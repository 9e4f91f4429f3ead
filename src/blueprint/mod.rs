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

//! The blueprint document: the declarative description of a cluster and the
//! add-ons to reconcile onto it.
//!
//! ```yaml
//! apiVersion: blueprint.mirantis.com/v1alpha1
//! kind: Blueprint
//! metadata:
//!   name: my-cluster
//! spec:
//!   kubernetes:
//!     provider: k0s
//!     version: 1.29.2+k0s.0
//!     infra:
//!       hosts:
//!         - ssh:
//!             address: 10.0.0.1
//!             keyPath: ~/.ssh/id_rsa
//!             user: root
//!           role: controller
//!   components:
//!     addons:
//!       - name: example-server
//!         kind: chart
//!         enabled: true
//!         namespace: default
//!         chart:
//!           name: nginx
//!           repo: https://charts.bitnami.com/bitnami
//!           version: 15.1.1
//! ```

pub mod validate;

use crate::error::{BctlError, Result};
use crate::util::io::read_local_file;
use crate::util::yaml::expand_env_vars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use validate::Validate;

pub const API_VERSION: &str = "blueprint.mirantis.com/v1alpha1";
pub const KIND: &str = "Blueprint";

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: BlueprintSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BlueprintSpec {
    /// Absent means the cluster already exists and is not managed by bctl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<Kubernetes>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kubernetes {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Provider native configuration, inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_yaml::Mapping>,
    /// Provider native configuration, as a separate file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra: Option<Infra>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Infra {
    #[serde(default)]
    pub hosts: Vec<Host>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshHost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localhost: Option<LocalHost>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_flags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SshHost {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub key_path: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LocalHost {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Components {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Core>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Addon>,
}

/// Core components are carried through but not reconciled
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Core {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cni: Option<CoreComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<CoreComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<CoreComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<CoreComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<CoreComponent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CoreComponent {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_yaml::Mapping>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, IntOrString>,
    /// Helm values, as a YAML document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
}

/// A `set` value is passed to helm as written: either a number or a string
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ManifestValues>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_policy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ManifestValues {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<Patch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Patch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default)]
    pub patch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Selector>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotation_selector: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_suffix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,
}

/// Which backend owns the cluster lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    K0s,
    Kind,
    Existing,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::K0s => "k0s",
            ProviderKind::Kind => "kind",
            ProviderKind::Existing => "existing",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = BctlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "k0s" => Ok(ProviderKind::K0s),
            "kind" => Ok(ProviderKind::Kind),
            "existing" => Ok(ProviderKind::Existing),
            other => Err(BctlError::validation(format!("unknown provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Controller,
    Worker,
    Single,
    ControllerWorker,
}

impl Role {
    pub fn is_controller(&self) -> bool {
        matches!(self, Role::Controller | Role::Single | Role::ControllerWorker)
    }
}

impl FromStr for Role {
    type Err = BctlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "controller" => Ok(Role::Controller),
            "worker" => Ok(Role::Worker),
            "single" => Ok(Role::Single),
            "controller+worker" => Ok(Role::ControllerWorker),
            other => Err(BctlError::validation(format!("invalid hosts.role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonKind {
    Chart,
    Manifest,
}

impl AddonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddonKind::Chart => "chart",
            AddonKind::Manifest => "manifest",
        }
    }
}

impl FromStr for AddonKind {
    type Err = BctlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chart" => Ok(AddonKind::Chart),
            "manifest" => Ok(AddonKind::Manifest),
            _ => Err(BctlError::validation(format!("invalid addons.kind: {}", s))),
        }
    }
}

impl Blueprint {
    /// The provider owning this cluster; `existing` when no kubernetes block is given.
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        match &self.spec.kubernetes {
            None => Ok(ProviderKind::Existing),
            Some(k) => k.provider.parse(),
        }
    }

    pub fn declared_version(&self) -> Option<&str> {
        self.spec
            .kubernetes
            .as_ref()
            .and_then(|k| k.version.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn hosts(&self) -> &[Host] {
        self.spec
            .kubernetes
            .as_ref()
            .and_then(|k| k.infra.as_ref())
            .map(|infra| infra.hosts.as_slice())
            .unwrap_or(&[])
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Kubernetes {
    /// Every host with a controlling role, in blueprint order
    pub fn controllers(&self) -> Vec<&Host> {
        match &self.infra {
            Some(infra) => infra
                .hosts
                .iter()
                .filter(|h| h.role().map(|r| r.is_controller()).unwrap_or(false))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Host {
    pub fn role(&self) -> Result<Role> {
        self.role.parse()
    }
}

impl Addon {
    pub fn addon_kind(&self) -> Result<AddonKind> {
        self.kind.parse()
    }
}

/// Parse a blueprint document. No environment expansion and no validation.
pub fn parse_blueprint(contents: &str) -> Result<Blueprint> {
    Ok(serde_yaml::from_str(contents)?)
}

/// Read a blueprint from disk, expanding `$VAR` / `${VAR}` references first.
/// Returns the expanded text alongside so parse errors can be shown in context.
pub fn read_blueprint(path: &Path) -> Result<(String, std::result::Result<Blueprint, serde_yaml::Error>)> {
    let raw = read_local_file(path)?;
    let expanded = expand_env_vars(&raw);
    let parsed = serde_yaml::from_str(&expanded);
    Ok((expanded, parsed))
}

/// Read and parse a blueprint from disk. Validation is left to the caller.
pub fn load_blueprint(path: &Path) -> Result<Blueprint> {
    let (_, parsed) = read_blueprint(path)?;
    Ok(parsed?)
}
