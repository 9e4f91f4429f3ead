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

//! Process and remote-shell collaborators.
//!
//! Everything that mutates a cluster does it by running a program, either
//! locally (`k0sctl`, `kind`, `kubectl`) or on a node over SSH. Both are
//! behind narrow traits so provider logic can run against fakes.

pub mod command;
pub mod local;
pub mod ssh;

pub use command::CommandOutput;
pub use local::{CommandRunner, LocalRunner};
pub use ssh::{RemoteExecutor, SshExecutor, SshTarget};
