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
use crate::components::{determine_operator_uri, remove_components, uninstall_operator};
use crate::context::RunContext;
use crate::error::Result;
use crate::providers::{get_provider, ProviderKind};
use tracing::{info, warn};

/// `bctl reset`: remove the add-ons, then tear down whatever the provider
/// created. For an existing cluster only the operator and its resources go.
pub fn reset(ctx: &RunContext, blueprint: &Blueprint) -> Result<()> {
    let provider = get_provider(blueprint, ctx)?;

    if !provider.exists()? {
        info!(cluster = %blueprint.metadata.name, "cluster not found, nothing to remove");
        return provider.reset();
    }

    let client = provider.client();
    if let Err(e) = remove_components(&client, blueprint) {
        if provider.provider_type() == ProviderKind::Existing {
            return Err(e);
        }
        warn!(error = %e, "unable to remove components, continuing with reset");
    }

    if provider.provider_type() == ProviderKind::Existing {
        let uri = determine_operator_uri(&ctx.config.operator_uri)?;
        uninstall_operator(&client, &uri)?;
    }

    provider.reset()?;
    info!(cluster = %blueprint.metadata.name, "reset complete");
    Ok(())
}
