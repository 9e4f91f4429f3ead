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

//! The Blueprint custom resource and the operator that reconciles it.
//!
//! bctl does not install add-ons itself. It installs the blueprint operator,
//! then hands it a `Blueprint` object listing the add-ons; the operator and
//! its helm controller do the rest.

use crate::blueprint::validate::is_semver;
use crate::blueprint::{self, AddonKind, Blueprint, IntOrString, ManifestValues};
use crate::error::{BctlError, Result};
use crate::k8s::Kubectl;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

pub const NAMESPACE_BLUEPRINT: &str = "blueprint-system";
pub const OPERATOR_DEPLOYMENT: &str = "blueprint-operator-controller-manager";
pub const HELM_CONTROLLER_DEPLOYMENT: &str = "helm-controller";

const OPERATOR_RELEASE_URI: &str = "https://github.com/MirantisContainers/blueprint/releases/download/{}/blueprint-operator.yaml";
const RESOURCE_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintResource {
    pub api_version: String,
    pub kind: String,
    pub metadata: ResourceMetadata,
    pub spec: ResourceSpec,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceMetadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceSpec {
    pub components: ResourceComponents,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceComponents {
    pub addons: Vec<AddonSpec>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddonSpec {
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestSpec>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub name: String,
    pub repo: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, IntOrString>,
    /// Helm values as structured JSON, converted from the blueprint's YAML text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<ManifestValues>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub failure_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

fn chart_values(addon: &str, values: Option<&str>) -> Result<Option<Value>> {
    match values.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => serde_yaml::from_str::<Value>(text).map(Some).map_err(|e| {
            BctlError::validation(format!("addons.chart.values for {} is not valid YAML: {}", addon, e))
        }),
    }
}

fn addon_spec(addon: &blueprint::Addon) -> Result<AddonSpec> {
    let kind = addon.addon_kind().map_err(|_| {
        BctlError::validation(format!(
            "unknown addon kind \"{}\" (valid values: chart|manifest)",
            addon.kind
        ))
    })?;

    let mut spec = AddonSpec {
        name: addon.name.clone(),
        kind: kind.as_str().to_string(),
        enabled: addon.enabled,
        dry_run: addon.dry_run,
        namespace: addon.namespace.clone(),
        chart: None,
        manifest: None,
    };

    match kind {
        AddonKind::Chart => {
            let chart = addon.chart.as_ref().ok_or_else(|| {
                BctlError::validation(format!("addons.chart is required for chart addon {}", addon.name))
            })?;
            spec.chart = Some(ChartSpec {
                name: chart.name.clone(),
                repo: chart.repo.clone(),
                version: chart.version.clone(),
                depends_on: chart.depends_on.clone(),
                set: chart.set.clone(),
                values: chart_values(&addon.name, chart.values.as_deref())?,
            });
        }
        AddonKind::Manifest => {
            let manifest = addon.manifest.as_ref().ok_or_else(|| {
                BctlError::validation(format!("addons.manifest is required for manifest addon {}", addon.name))
            })?;
            spec.manifest = Some(ManifestSpec {
                url: manifest.url.clone(),
                values: manifest.values.clone(),
                failure_policy: manifest.failure_policy.clone(),
                timeout: manifest.timeout.clone(),
            });
        }
    }
    Ok(spec)
}

/// Render the `Blueprint` object handed to the operator
pub fn build_blueprint_resource(blueprint: &Blueprint) -> Result<BlueprintResource> {
    let addons = blueprint
        .spec
        .components
        .addons
        .iter()
        .map(addon_spec)
        .collect::<Result<Vec<_>>>()?;

    Ok(BlueprintResource {
        api_version: blueprint::API_VERSION.to_string(),
        kind: blueprint::KIND.to_string(),
        metadata: ResourceMetadata {
            name: blueprint.metadata.name.clone(),
            namespace: RESOURCE_NAMESPACE.to_string(),
        },
        spec: ResourceSpec {
            components: ResourceComponents { addons },
        },
    })
}

/// Create or update the Blueprint object on the cluster
pub fn apply_blueprint(kubectl: &Kubectl, blueprint: &Blueprint) -> Result<()> {
    let resource = build_blueprint_resource(blueprint)?;
    info!(name = %resource.metadata.name, addons = resource.spec.components.addons.len(), "applying blueprint");
    kubectl.apply_json(&serde_json::to_value(&resource)?)
}

/// Delete the Blueprint object, which makes the operator uninstall every add-on
pub fn remove_components(kubectl: &Kubectl, blueprint: &Blueprint) -> Result<()> {
    let resource = build_blueprint_resource(blueprint)?;
    info!(name = %resource.metadata.name, "resetting blueprint");
    kubectl.delete_json(&serde_json::to_value(&resource)?)
}

/// Resolve an operator version or URI to the manifest location.
///
/// `latest` and semver versions (with or without a leading `v`) map to a
/// release asset; anything else must already be an absolute URI.
pub fn determine_operator_uri(version: &str) -> Result<String> {
    let version = version.trim();
    if version == "latest" {
        return Ok(OPERATOR_RELEASE_URI.replace("{}", version));
    }

    if is_semver(version) {
        let tag = if version.starts_with('v') {
            version.to_string()
        } else {
            format!("v{}", version)
        };
        return Ok(OPERATOR_RELEASE_URI.replace("{}", &tag));
    }
    debug!(version = %version, "not a semver version, assuming it is a URI");

    match reqwest::Url::parse(version) {
        Ok(uri) if !uri.cannot_be_a_base() => Ok(uri.to_string()),
        _ => Err(BctlError::Config(String::from("version is not a valid semver version or URI"))),
    }
}

/// Apply the operator manifest and wait for its pods
pub fn install_operator(kubectl: &Kubectl, uri: &str, timeout: Duration, interval: Duration) -> Result<()> {
    info!(uri = %uri, "installing blueprint operator");
    kubectl.apply_uri(uri)?;
    kubectl.wait_for_pods(NAMESPACE_BLUEPRINT, timeout, interval)
}

/// Remove the operator and everything its manifest created
pub fn uninstall_operator(kubectl: &Kubectl, uri: &str) -> Result<()> {
    info!(uri = %uri, "removing blueprint operator");
    kubectl.run(&["delete", "--ignore-not-found", "-f", uri])?;
    Ok(())
}
