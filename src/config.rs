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

use crate::util::io::expand_path;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BLUEPRINT: &str = "blueprint.yaml";
pub const DEFAULT_KUBECONFIG: &str = "~/.kube/config";
pub const DEFAULT_OPERATOR_VERSION: &str = "latest";

/// Settings for one bctl invocation
#[derive(Clone, Debug)]
pub struct BctlConfig {
    pub blueprint_path: PathBuf,
    pub kubeconfig_path: PathBuf,
    /// Operator release (`latest`, a version) or a manifest URI
    pub operator_uri: String,
    pub debug: bool,
    pub node_wait_timeout: Duration,
    pub pod_wait_timeout: Duration,
    pub poll_interval: Duration,
}

/// First entry of `$KUBECONFIG`, else `~/.kube/config`
pub fn default_kubeconfig_path() -> PathBuf {
    default_kubeconfig_from(std::env::var("KUBECONFIG").ok())
}

fn default_kubeconfig_from(env: Option<String>) -> PathBuf {
    env.as_deref()
        .and_then(|v| std::env::split_paths(v).find(|p| !p.as_os_str().is_empty()))
        .map(|p| expand_path(&p.to_string_lossy()))
        .unwrap_or_else(|| expand_path(DEFAULT_KUBECONFIG))
}

impl Default for BctlConfig {
    fn default() -> Self {
        Self {
            blueprint_path: PathBuf::from(DEFAULT_BLUEPRINT),
            kubeconfig_path: default_kubeconfig_path(),
            operator_uri: String::from(DEFAULT_OPERATOR_VERSION),
            debug: false,
            node_wait_timeout: Duration::from_secs(10 * 60),
            pod_wait_timeout: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl BctlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blueprint<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.blueprint_path = path.into();
        self
    }

    /// Tilde is expanded
    pub fn kubeconfig(mut self, path: &str) -> Self {
        self.kubeconfig_path = expand_path(path);
        self
    }

    pub fn operator_uri(mut self, uri: &str) -> Self {
        self.operator_uri = uri.to_string();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn node_wait_timeout(mut self, timeout: Duration) -> Self {
        self.node_wait_timeout = timeout;
        self
    }

    pub fn pod_wait_timeout(mut self, timeout: Duration) -> Self {
        self.pod_wait_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
