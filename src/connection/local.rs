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

use crate::connection::command::{display_command, CommandOutput};
use crate::error::{BctlError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs a local program to completion.
///
/// `run` returns `Ok` for any process that started, whatever its exit code;
/// callers decide what a given code means for their tool.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Like `run`, but a non-zero exit becomes [`BctlError::CommandFailed`].
    fn run_checked(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(program, args)?;
        if !output.success() {
            return Err(BctlError::CommandFailed {
                command: display_command(program, args),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Clone, Debug, Default)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for LocalRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(command = %display_command(program, args), "running local command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BctlError::CommandSpawn {
                program: program.to_string(),
                source: e,
            })?;
        Ok(CommandOutput::new(output.status.code(), &output.stdout, &output.stderr))
    }
}

/// Build an owned argument vector from string literals.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
