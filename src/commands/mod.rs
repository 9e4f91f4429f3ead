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

//! The operations behind each `bctl` subcommand.

pub mod apply;
pub mod init;
pub mod reset;
pub mod status;

pub use apply::apply;
pub use init::init;
pub use reset::reset;
pub use status::status;

use crate::blueprint::{read_blueprint, Blueprint, Validate};
use crate::components::{apply_blueprint, determine_operator_uri, install_operator};
use crate::context::RunContext;
use crate::error::{BctlError, Result};
use crate::providers::get_provider;
use crate::util::yaml::show_yaml_error_in_context;
use std::path::Path;
use tracing::info;

/// Read, parse and validate the blueprint at `path`. Parse errors are
/// printed with the surrounding lines before being returned.
pub fn load_and_validate(path: &Path) -> Result<Blueprint> {
    let (contents, parsed) = read_blueprint(path)?;
    let blueprint = match parsed {
        Ok(blueprint) => blueprint,
        Err(e) => {
            show_yaml_error_in_context(&e, path, &contents);
            return Err(BctlError::Config(format!(
                "failed to parse blueprint {}: {}",
                path.display(),
                e
            )));
        }
    };
    blueprint.validate()?;
    Ok(blueprint)
}

/// `bctl validate`
pub fn validate(ctx: &RunContext) -> Result<Blueprint> {
    let blueprint = load_and_validate(&ctx.config.blueprint_path)?;
    info!(path = %ctx.config.blueprint_path.display(), name = %blueprint.metadata.name, "blueprint is valid");
    Ok(blueprint)
}

/// `bctl update`: re-submit the Blueprint object, leaving the cluster alone
pub fn update(ctx: &RunContext, blueprint: &Blueprint) -> Result<()> {
    let provider = get_provider(blueprint, ctx)?;
    apply_blueprint(&provider.client(), blueprint)
}

/// `bctl upgrade`: apply the operator manifest for `ctx.config.operator_uri`
pub fn upgrade(ctx: &RunContext, blueprint: &Blueprint) -> Result<()> {
    let uri = determine_operator_uri(&ctx.config.operator_uri)?;
    let provider = get_provider(blueprint, ctx)?;
    let client = provider.setup_client()?;
    install_operator(&client, &uri, ctx.config.pod_wait_timeout, ctx.config.poll_interval)
}

/// `bctl kubeconfig`: write the cluster's credentials into the managed kubeconfig
pub fn kubeconfig(ctx: &RunContext, blueprint: &Blueprint) -> Result<()> {
    let provider = get_provider(blueprint, ctx)?;
    if !provider.exists()? {
        return Err(BctlError::Config(format!(
            "cluster {} does not exist, run apply first",
            blueprint.metadata.name
        )));
    }
    provider.export_kubeconfig()?;
    info!(path = %ctx.kubeconfig.path().display(), context = %provider.kubeconfig_context(), "kubeconfig written");
    Ok(())
}
