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

mod common;

use bctl::providers::existing::ProbeOutcome;
use bctl::upgrade::{cleanup_command, validate_command, VERSION_COMMAND};
use bctl::{get_provider, parse_blueprint, BctlError, UpgradeValidator};
use common::{exit, harness, k0s_blueprint, key_file, ok};

const SINGLE_CONTROLLER: &str = r#"apiVersion: blueprint.mirantis.com/v1alpha1
kind: Blueprint
metadata:
  name: prod
spec:
  kubernetes:
    provider: k0s
    version: 1.2.3
    infra:
      hosts:
        - ssh:
            address: 10.0.0.1
            keyPath: KEY
            user: root
          role: controller
"#;

#[test]
fn test_upgrade_then_update() {
    let key = key_file();
    let bp = parse_blueprint(&SINGLE_CONTROLLER.replace("KEY", &key.path().display().to_string())).unwrap();
    let h = harness("/tmp/kc", ProbeOutcome::Healthy);
    h.executor.respond("10.0.0.1", VERSION_COMMAND, ok("v1.2.2"));

    let provider = get_provider(&bp, &h.ctx).unwrap();
    assert!(provider.needs_upgrade(&bp).unwrap());
    provider.validate_provider_upgrade(&bp).unwrap();

    let commands = h.executor.commands_for("10.0.0.1");
    assert!(commands.iter().any(|c| c.contains("K0S_VERSION=v1.2.3")));
    assert!(commands.contains(&validate_command()));
    assert_eq!(commands.last().unwrap(), &cleanup_command());

    provider.update().unwrap();
    let calls = h.runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("k0sctl apply --config "));
    assert!(calls[0].ends_with("--no-wait"));
}

#[test]
fn test_equal_versions_need_nothing() {
    let key = key_file();
    let bp = parse_blueprint(&k0s_blueprint("1.2.3", &key)).unwrap();
    let h = harness("/tmp/kc", ProbeOutcome::Healthy);
    h.executor.respond("10.0.0.1", VERSION_COMMAND, ok("v1.2.3+k0s.0"));
    let provider = get_provider(&bp, &h.ctx).unwrap();
    assert!(!provider.needs_upgrade(&bp).unwrap());
    assert_eq!(h.executor.call_count(), 1);
}

#[test]
fn test_downgrade_is_refused() {
    let key = key_file();
    let bp = parse_blueprint(&k0s_blueprint("1.2.3", &key)).unwrap();
    let h = harness("/tmp/kc", ProbeOutcome::Healthy);
    h.executor.respond("10.0.0.1", VERSION_COMMAND, ok("v1.3.0"));
    let provider = get_provider(&bp, &h.ctx).unwrap();
    let err = provider.needs_upgrade(&bp).unwrap_err();
    assert!(matches!(err, BctlError::Downgrade { .. }));
}

#[test]
fn test_second_controller_failure_cleans_both() {
    let key = key_file();
    let bp = parse_blueprint(&k0s_blueprint("1.2.3", &key)).unwrap();
    let h = harness("/tmp/kc", ProbeOutcome::Healthy);
    h.executor.respond("10.0.0.1", VERSION_COMMAND, ok("v1.2.2"));
    h.executor.respond("10.0.0.3", "config validate", exit(1, "invalid spec.network"));
    // cleanup failing on the first host must not replace the validation error
    h.executor.respond("10.0.0.1", "rm -f", exit(1, "permission denied"));

    let err = UpgradeValidator::new(h.executor.as_ref()).validate(&bp).unwrap_err();
    match err {
        BctlError::UpgradeValidation { host, stderr } => {
            assert_eq!(host, "10.0.0.3");
            assert!(stderr.contains("invalid spec.network"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    for host in ["10.0.0.1", "10.0.0.3"] {
        assert_eq!(h.executor.commands_for(host).last().unwrap(), &cleanup_command());
    }
    assert!(h.executor.commands_for("10.0.0.2").is_empty());
}
