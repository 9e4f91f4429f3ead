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

use bctl::{parse_blueprint, Validate};
use common::{is_validation, k0s_blueprint, key_file};

const HEAD: &str = "apiVersion: blueprint.mirantis.com/v1alpha1\nkind: Blueprint\n";

fn with_addon(addon: &str) -> String {
    format!("{}metadata:\n  name: prod\nspec:\n  components:\n    addons:\n{}", HEAD, addon)
}

#[test]
fn test_missing_name_always_mentions_metadata_name() {
    for doc in [
        HEAD.to_string(),
        format!("{}metadata: {{}}\n", HEAD),
        format!("{}metadata:\n  name: \"\"\n", HEAD),
        format!("{}metadata:\n  name: \"   \"\nspec:\n  kubernetes:\n    provider: kind\n", HEAD),
    ] {
        let err = parse_blueprint(&doc).unwrap().validate().unwrap_err();
        assert!(is_validation(&err));
        assert!(err.to_string().contains("metadata.name"), "{}", err);
    }
}

#[test]
fn test_chart_addon_needs_chart_block() {
    for kind in ["chart", "Chart", "CHART"] {
        let doc = with_addon(&format!("      - name: web\n        kind: {}\n        enabled: true\n", kind));
        let err = parse_blueprint(&doc).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("addons.chart"), "{}", err);
    }
}

#[test]
fn test_manifest_addon_needs_manifest_block() {
    let doc = with_addon("      - name: lb\n        kind: manifest\n        enabled: true\n");
    let err = parse_blueprint(&doc).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("addons.manifest"), "{}", err);
}

#[test]
fn test_addon_blocks_must_match_kind() {
    let doc = with_addon(
        "      - name: lb\n        kind: manifest\n        manifest:\n          url: https://example.com/lb.yaml\n        chart:\n          name: x\n          repo: https://example.com\n          version: 1.0.0\n",
    );
    let err = parse_blueprint(&doc).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("addons.chart cannot be specified"));
}

#[test]
fn test_valid_addons() {
    let doc = with_addon(
        "      - name: web\n        kind: chart\n        enabled: true\n        chart:\n          name: nginx\n          repo: https://charts.bitnami.com/bitnami\n          version: 15.1.1\n      - name: lb\n        kind: manifest\n        enabled: true\n        manifest:\n          url: https://example.com/lb.yaml\n          timeout: 5m\n",
    );
    parse_blueprint(&doc).unwrap().validate().unwrap();
}

#[test]
fn test_k0s_blueprint_with_real_key_is_valid() {
    let key = key_file();
    let bp = parse_blueprint(&k0s_blueprint("1.2.3", &key)).unwrap();
    bp.validate().unwrap();
    let controllers = bp.spec.kubernetes.as_ref().unwrap().controllers();
    let addresses: Vec<&str> = controllers.iter().map(|h| h.ssh.as_ref().unwrap().address.as_str()).collect();
    assert_eq!(addresses, vec!["10.0.0.1", "10.0.0.3"]);
}

#[test]
fn test_k0s_blueprint_bad_version() {
    let key = key_file();
    let err = parse_blueprint(&k0s_blueprint("1.2", &key)).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("kubernetes.version"));
}

#[test]
fn test_missing_key_file() {
    let key = key_file();
    let doc = k0s_blueprint("1.2.3", &key);
    let path = key.path().to_path_buf();
    drop(key);
    let err = parse_blueprint(&doc).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("keyPath"), "{} ({})", err, path.display());
}
