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

pub mod blueprint;
pub mod commands;
pub mod components;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod k0sctl;
pub mod k8s;
pub mod providers;
pub mod retry;
pub mod upgrade;
pub mod util;

#[cfg(test)]
mod fakes;

// Re-export commonly used types for library users
pub use blueprint::{load_blueprint, parse_blueprint, Blueprint, Validate};
pub use config::BctlConfig;
pub use context::RunContext;
pub use error::{BctlError, Result};
pub use providers::{get_provider, Provider, ProviderKind};
pub use retry::{retry_with_backoff, retry_with_exponential_backoff, RetryConfig};
pub use upgrade::{UpgradeDecision, UpgradeValidator};
