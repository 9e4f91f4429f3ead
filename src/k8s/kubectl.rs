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

//! Cluster client backed by the `kubectl` binary.

use crate::connection::local::CommandRunner;
use crate::connection::CommandOutput;
use crate::error::Result;
use crate::retry::poll_until;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const KUBECTL: &str = "kubectl";

#[derive(Clone)]
pub struct Kubectl {
    runner: Arc<dyn CommandRunner>,
    kubeconfig: PathBuf,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(runner: Arc<dyn CommandRunner>, kubeconfig: &Path, context: Option<String>) -> Self {
        Self {
            runner,
            kubeconfig: kubeconfig.to_path_buf(),
            context: context.filter(|c| !c.is_empty()),
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.push(String::from("--kubeconfig"));
        full.push(self.kubeconfig.display().to_string());
        if let Some(context) = &self.context {
            full.push(String::from("--context"));
            full.push(context.clone());
        }
        full
    }

    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run_checked(KUBECTL, &self.command_args(args))
    }

    /// `kubectl <args> -o json`, parsed
    pub fn get_json(&self, args: &[&str]) -> Result<Value> {
        let mut full = args.to_vec();
        full.extend_from_slice(&["-o", "json"]);
        let output = self.run(&full)?;
        Ok(serde_json::from_str(&output.stdout)?)
    }

    /// Like [`Kubectl::get_json`] but an absent object is `None` rather than an error.
    pub fn get_optional_json(&self, args: &[&str]) -> Result<Option<Value>> {
        let mut full = args.to_vec();
        full.extend_from_slice(&["--ignore-not-found", "-o", "json"]);
        let output = self.run(&full)?;
        if output.stdout.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&output.stdout)?))
    }

    /// Apply a manifest from a local path or URL
    pub fn apply_uri(&self, uri: &str) -> Result<()> {
        info!(uri = %uri, "applying manifest");
        self.run(&["apply", "-f", uri])?;
        Ok(())
    }

    pub fn apply_json(&self, object: &Value) -> Result<()> {
        self.with_object_file(object, |path| {
            self.run(&["apply", "-f", path])?;
            Ok(())
        })
    }

    pub fn delete_json(&self, object: &Value) -> Result<()> {
        self.with_object_file(object, |path| {
            self.run(&["delete", "--ignore-not-found", "-f", path])?;
            Ok(())
        })
    }

    fn with_object_file<F>(&self, object: &Value, f: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<()>,
    {
        let mut file = tempfile::Builder::new().prefix("bctl-").suffix(".json").tempfile()?;
        file.write_all(serde_json::to_string_pretty(object)?.as_bytes())?;
        file.flush()?;
        let path = file.path().display().to_string();
        f(&path)
    }

    /// Block until the cluster reports at least one node and every node is Ready.
    pub fn wait_for_nodes(&self, timeout: Duration, interval: Duration) -> Result<()> {
        info!("waiting for nodes to be ready");
        poll_until(timeout, interval, "nodes to be ready", || {
            let nodes = self.get_json(&["get", "nodes"])?;
            Ok(nodes_ready(&nodes))
        })
    }

    /// Block until every pod in `namespace` is running with all containers ready.
    pub fn wait_for_pods(&self, namespace: &str, timeout: Duration, interval: Duration) -> Result<()> {
        info!(namespace = %namespace, "waiting for pods to be ready");
        poll_until(timeout, interval, &format!("pods in namespace {} to be ready", namespace), || {
            let pods = self.get_json(&["get", "pods", "-n", namespace])?;
            Ok(pods_ready(&pods))
        })
    }
}

fn items(list: &Value) -> &[Value] {
    list.get("items").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn condition_true(object: &Value, condition: &str) -> bool {
    object
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .map(|conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(Value::as_str) == Some(condition)
                    && c.get("status").and_then(Value::as_str) == Some("True")
            })
        })
        .unwrap_or(false)
}

/// True when the node list is non-empty and every node is Ready
pub fn nodes_ready(list: &Value) -> bool {
    let nodes = items(list);
    if nodes.is_empty() {
        return false;
    }
    let not_ready: Vec<&str> = nodes
        .iter()
        .filter(|n| !condition_true(n, "Ready"))
        .map(|n| n.pointer("/metadata/name").and_then(Value::as_str).unwrap_or("?"))
        .collect();
    if !not_ready.is_empty() {
        debug!(nodes = ?not_ready, "nodes not ready");
    }
    not_ready.is_empty()
}

/// True when there is at least one pod and every pod has finished or is
/// running with all of its containers ready
pub fn pods_ready(list: &Value) -> bool {
    let pods = items(list);
    if pods.is_empty() {
        return false;
    }
    pods.iter().all(|pod| {
        match pod.pointer("/status/phase").and_then(Value::as_str) {
            Some("Succeeded") => true,
            Some("Running") => pod
                .pointer("/status/containerStatuses")
                .and_then(Value::as_array)
                .map(|statuses| {
                    statuses
                        .iter()
                        .all(|s| s.get("ready").and_then(Value::as_bool).unwrap_or(false))
                })
                .unwrap_or(false),
            _ => false,
        }
    })
}
