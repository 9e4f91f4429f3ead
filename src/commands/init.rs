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
use crate::connection::CommandRunner;
use crate::error::Result;
use crate::k0sctl::{blueprint_for_kind, convert_from_k0s, default_components, parse_k0sctl};
use tracing::debug;

pub const DEFAULT_CLUSTER_NAME: &str = "blueprint-cluster";

/// `bctl init`: a starter blueprint, either for kind or seeded from `k0sctl init`
pub fn init(runner: &dyn CommandRunner, kind: bool) -> Result<Blueprint> {
    if kind {
        return Ok(blueprint_for_kind(DEFAULT_CLUSTER_NAME, default_components()));
    }

    let output = runner.run_checked("k0sctl", &[String::from("init")])?;
    debug!(bytes = output.stdout.len(), "read k0sctl init output");
    let cluster = parse_k0sctl(&output.stdout)?;
    Ok(convert_from_k0s(&cluster, default_components()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{ProviderKind, Validate};
    use crate::fakes::{exit, FakeRunner};

    #[test]
    fn test_init_kind() {
        let runner = FakeRunner::new();
        let bp = init(&runner, true).unwrap();
        assert_eq!(bp.metadata.name, DEFAULT_CLUSTER_NAME);
        assert_eq!(bp.provider_kind().unwrap(), ProviderKind::Kind);
        assert_eq!(bp.spec.components.addons[0].name, "example-server");
        assert!(runner.calls().is_empty());
        bp.validate().unwrap();
    }

    #[test]
    fn test_init_from_k0sctl() {
        let runner = FakeRunner::new();
        runner.respond_ok(
            "k0sctl init",
            "apiVersion: k0sctl.k0sproject.io/v1beta1\nkind: Cluster\nmetadata:\n  name: k0s-cluster\nspec:\n  hosts:\n  - ssh:\n      address: 10.0.0.1\n      user: root\n      port: 22\n      keyPath: null\n    role: controller\n  - ssh:\n      address: 10.0.0.2\n      user: root\n      port: 22\n      keyPath: null\n    role: worker\n  k0s:\n    version: null\n    dynamicConfig: false\n",
        );
        let bp = init(&runner, false).unwrap();
        assert_eq!(bp.metadata.name, "k0s-cluster");
        assert_eq!(bp.provider_kind().unwrap(), ProviderKind::K0s);
        assert_eq!(bp.hosts().len(), 2);
        assert_eq!(bp.hosts()[1].role, "worker");
    }

    #[test]
    fn test_init_k0sctl_missing() {
        let runner = FakeRunner::new();
        runner.respond("k0sctl init", exit(127, "k0sctl: command not found"));
        assert!(init(&runner, false).is_err());
    }
}
