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

use crate::blueprint::Blueprint;
use crate::components::{HELM_CONTROLLER_DEPLOYMENT, NAMESPACE_BLUEPRINT, OPERATOR_DEPLOYMENT};
use crate::context::RunContext;
use crate::error::{BctlError, Result};
use crate::k8s::Kubectl;
use crate::providers::get_provider;
use crate::util::terminal::{captioned_display, three_column_table, two_column_table};
use inline_colorization::{color_green, color_reset, color_yellow};
use serde_json::Value;

/// One row of the add-on table
#[derive(Debug, Clone, PartialEq)]
pub struct AddonStatus {
    pub name: String,
    pub kind: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

impl AddonStatus {
    fn from_object(addon: &Value) -> Self {
        let field = |pointer: &str| addon.pointer(pointer).and_then(Value::as_str).unwrap_or("").to_string();
        Self {
            name: field("/metadata/name"),
            kind: field("/spec/kind"),
            status: field("/status/type"),
            reason: field("/status/reason"),
            message: field("/status/message"),
        }
    }
}

/// `ready/desired` for a deployment object
pub fn deployment_summary(deployment: &Value) -> String {
    let count = |pointer: &str| deployment.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);
    let desired = count("/spec/replicas");
    let ready = count("/status/readyReplicas");
    if desired > 0 && ready >= desired {
        format!("{color_green}{}/{} ready{color_reset}", ready, desired)
    } else {
        format!("{color_yellow}{}/{} ready{color_reset}", ready, desired)
    }
}

fn deployment_row(kubectl: &Kubectl, name: &str, missing: &str) -> Result<(String, String)> {
    let deployment = kubectl.get_optional_json(&["get", "deployment", name, "-n", NAMESPACE_BLUEPRINT])?;
    Ok(match deployment {
        Some(d) => (name.to_string(), deployment_summary(&d)),
        None => (name.to_string(), missing.to_string()),
    })
}

pub fn list_addons(kubectl: &Kubectl) -> Result<Vec<AddonStatus>> {
    let list = kubectl.get_json(&["get", "addons", "-n", NAMESPACE_BLUEPRINT])?;
    Ok(list
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(AddonStatus::from_object).collect())
        .unwrap_or_default())
}

pub fn get_addon(kubectl: &Kubectl, name: &str) -> Result<AddonStatus> {
    kubectl
        .get_optional_json(&["get", "addon", name, "-n", NAMESPACE_BLUEPRINT])?
        .map(|addon| AddonStatus::from_object(&addon))
        .ok_or_else(|| BctlError::Config(format!("invalid input {}, no addon named {} exists", name, name)))
}

/// `bctl status [addon]`
pub fn status(ctx: &RunContext, blueprint: &Blueprint, addon: Option<&str>) -> Result<()> {
    let provider = get_provider(blueprint, ctx)?;
    let kubectl = provider.client();

    if let Some(name) = addon {
        let addon = get_addon(&kubectl, name)?;
        three_column_table(("NAME", "KIND", "STATUS"), &[(addon.name, addon.kind, addon.status)]);
        println!("Status Reason: {}", addon.reason);
        captioned_display("Detailed Status Message", &addon.message);
        return Ok(());
    }

    let rows = vec![
        deployment_row(&kubectl, OPERATOR_DEPLOYMENT, "No blueprint operator installation detected")?,
        deployment_row(&kubectl, HELM_CONTROLLER_DEPLOYMENT, "No helm controller detected - Chart addons may not function")?,
    ];
    two_column_table("DEPLOYMENT", "STATUS", &rows);

    let addons = list_addons(&kubectl)?;
    if addons.is_empty() {
        println!("No addons installed");
        return Ok(());
    }
    let rows: Vec<(String, String, String)> = addons.into_iter().map(|a| (a.name, a.kind, a.status)).collect();
    three_column_table(("NAME", "KIND", "STATUS"), &rows);
    Ok(())
}
