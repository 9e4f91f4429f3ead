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

/// Captured result of one local or remote command
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal or the remote side
    /// never reported an exit status
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code,
            stdout: clean_output(stdout),
            stderr: clean_output(stderr),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Lossy UTF-8 decode, then strip non-printable characters from both ends.
pub fn clean_output(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    s.trim_matches(|c: char| c.is_control() || c.is_whitespace())
        .to_string()
}

/// Render a program and its arguments for log and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}
