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

//! The on-disk kubeconfig is the only shared mutable state bctl touches.
//! Writes are read-merge-write and unlocked; concurrent invocations against
//! the same file are unsupported.

use crate::error::{BctlError, Result};
use crate::util::io::{read_local_file, write_local_file};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_api_version() -> String {
    String::from("v1")
}

fn default_kind() -> String {
    String::from("Config")
}

/// A named `clusters[]`, `users[]` or `contexts[]` item. Everything besides
/// the name is kept verbatim.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NamedEntry {
    pub name: String,
    #[serde(flatten)]
    pub rest: IndexMap<String, serde_yaml::Value>,
}

impl NamedEntry {
    fn payload_field(&self, payload: &str, field: &str) -> Option<&str> {
        self.rest.get(payload)?.get(field)?.as_str()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct KubeConfigFile {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub preferences: serde_yaml::Mapping,
    #[serde(default)]
    pub clusters: Vec<NamedEntry>,
    #[serde(default)]
    pub users: Vec<NamedEntry>,
    #[serde(default)]
    pub contexts: Vec<NamedEntry>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for KubeConfigFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            preferences: serde_yaml::Mapping::new(),
            clusters: Vec::new(),
            users: Vec::new(),
            contexts: Vec::new(),
            current_context: String::new(),
            extra: IndexMap::new(),
        }
    }
}

// insert or overwrite by name, keeping the position of entries already present
fn upsert(existing: &mut Vec<NamedEntry>, incoming: &[NamedEntry]) {
    for entry in incoming.iter() {
        match existing.iter_mut().find(|e| e.name == entry.name) {
            Some(slot) => *slot = entry.clone(),
            None => existing.push(entry.clone()),
        }
    }
}

impl KubeConfigFile {
    pub fn parse(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| BctlError::KubeConfig(format!("unable to parse kubeconfig: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Name-keyed union of clusters, users and contexts. Unrelated entries are
    /// never removed. The current context follows the incoming one when set.
    pub fn merge(&mut self, other: &KubeConfigFile) {
        upsert(&mut self.clusters, &other.clusters);
        upsert(&mut self.users, &other.users);
        upsert(&mut self.contexts, &other.contexts);
        if !other.current_context.is_empty() {
            self.current_context = other.current_context.clone();
        }
    }

    pub fn context(&self, name: &str) -> Option<&NamedEntry> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// API server URL for the cluster referenced by a context
    pub fn server_for_context(&self, context: &str) -> Option<String> {
        let cluster_name = self.context(context)?.payload_field("context", "cluster")?;
        let cluster = self.clusters.iter().find(|c| c.name == cluster_name)?;
        cluster.payload_field("cluster", "server").map(String::from)
    }

    pub fn current_server(&self) -> Option<String> {
        if self.current_context.is_empty() {
            return None;
        }
        self.server_for_context(&self.current_context)
    }

    /// Rename the current context, replacing any other context of that name
    pub fn rename_current_context(&mut self, name: &str) {
        if self.current_context.is_empty() || self.current_context == name {
            return;
        }
        let old = std::mem::replace(&mut self.current_context, name.to_string());
        self.contexts.retain(|c| c.name != name);
        if let Some(entry) = self.contexts.iter_mut().find(|c| c.name == old) {
            entry.name = name.to_string();
        }
    }

    /// Drop a context. Its cluster and user entries are left alone.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let before = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        before != self.contexts.len()
    }
}

/// Handle on the kubeconfig file bctl manages
#[derive(Debug, Clone, PartialEq)]
pub struct KubeConfig {
    path: PathBuf,
}

impl KubeConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; a missing file reads as an empty config.
    pub fn load(&self) -> Result<KubeConfigFile> {
        if !self.path.exists() {
            return Ok(KubeConfigFile::default());
        }
        KubeConfigFile::parse(&read_local_file(&self.path)?)
    }

    pub fn save(&self, config: &KubeConfigFile) -> Result<()> {
        write_local_file(&self.path, &config.to_yaml()?)
    }

    /// Read, merge `incoming` in and write back
    pub fn merge_config(&self, incoming: &KubeConfigFile) -> Result<()> {
        let mut current = self.load()?;
        current.merge(incoming);
        debug!(path = %self.path.display(), context = %current.current_context, "writing merged kubeconfig");
        self.save(&current)
    }

    pub fn delete_context(&self, name: &str) -> Result<()> {
        let mut current = self.load()?;
        if current.remove_context(name) {
            self.save(&current)?;
        }
        Ok(())
    }

    pub fn current_context(&self) -> Result<String> {
        Ok(self.load()?.current_context)
    }
}
