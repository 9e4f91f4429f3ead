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
use crate::components::{apply_blueprint, determine_operator_uri, install_operator};
use crate::context::RunContext;
use crate::error::Result;
use crate::providers::get_provider;
use crate::util::terminal::banner;
use tracing::info;

/// `bctl apply`: create or converge the cluster, install the operator,
/// then hand it the add-ons.
pub fn apply(ctx: &RunContext, blueprint: &Blueprint) -> Result<()> {
    let uri = determine_operator_uri(&ctx.config.operator_uri)?;
    let provider = get_provider(blueprint, ctx)?;

    if provider.exists()? {
        info!(cluster = %blueprint.metadata.name, "cluster exists, checking for changes");
        if provider.needs_upgrade(blueprint)? {
            banner(&format!("Upgrading {} cluster {}", provider.provider_type(), blueprint.metadata.name));
            provider.validate_provider_upgrade(blueprint)?;
        }
        provider.update()?;
    } else {
        banner(&format!("Installing {} cluster {}", provider.provider_type(), blueprint.metadata.name));
        provider.install()?;
    }

    let client = provider.setup_client()?;
    install_operator(&client, &uri, ctx.config.pod_wait_timeout, ctx.config.poll_interval)?;
    provider.wait_for_pods()?;
    apply_blueprint(&client, blueprint)?;

    info!(cluster = %blueprint.metadata.name, "blueprint applied");
    Ok(())
}
