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

//! Scripted stand-ins for the process, SSH and probe collaborators.

use crate::connection::command::display_command;
use crate::connection::{CommandOutput, CommandRunner, RemoteExecutor, SshTarget};
use crate::error::{BctlError, Result};
use crate::providers::existing::{HealthProbe, ProbeOutcome};
use std::sync::Mutex;

fn take_response<K: Clone>(rules: &Mutex<Vec<(K, CommandOutput)>>, matches: impl Fn(&K) -> bool) -> Option<CommandOutput> {
    let mut rules = rules.lock().unwrap();
    let hits: Vec<usize> = rules
        .iter()
        .enumerate()
        .filter(|(_, (k, _))| matches(k))
        .map(|(i, _)| i)
        .collect();
    match hits.len() {
        0 => None,
        // the last scripted answer for a pattern sticks
        1 => Some(rules[hits[0]].1.clone()),
        _ => Some(rules.remove(hits[0]).1),
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput::new(Some(0), stdout.as_bytes(), b"")
}

pub fn exit(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput::new(Some(code), b"", stderr.as_bytes())
}

/// Answers by command-line prefix; unmatched commands succeed silently.
#[derive(Default)]
pub struct FakeRunner {
    rules: Mutex<Vec<(String, CommandOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, prefix: &str, output: CommandOutput) {
        self.rules.lock().unwrap().push((prefix.to_string(), output));
    }

    pub fn respond_ok(&self, prefix: &str, stdout: &str) {
        self.respond(prefix, ok(stdout));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls.lock().unwrap().push(line.clone());
        Ok(take_response(&self.rules, |prefix: &String| line.starts_with(prefix.as_str())).unwrap_or_else(|| ok("")))
    }
}

/// Answers by (host address, command substring); unmatched commands succeed silently.
#[derive(Default)]
pub struct FakeExecutor {
    rules: Mutex<Vec<((String, String), CommandOutput)>>,
    calls: Mutex<Vec<(String, String)>>,
    unreachable: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, host: &str, command: &str, output: CommandOutput) {
        self.rules.lock().unwrap().push(((host.to_string(), command.to_string()), output));
    }

    pub fn unreachable(&self, host: &str) {
        self.unreachable.lock().unwrap().push(host.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.calls().into_iter().filter(|(h, _)| h == host).map(|(_, c)| c).collect()
    }
}

impl RemoteExecutor for FakeExecutor {
    fn run(&self, target: &SshTarget, command: &str) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push((target.address.clone(), command.to_string()));
        if self.unreachable.lock().unwrap().contains(&target.address) {
            return Err(BctlError::Ssh(format!("SSH connection attempt failed for {}", target.address)));
        }
        Ok(take_response(&self.rules, |(host, pattern): &(String, String)| {
            host == &target.address && command.contains(pattern.as_str())
        })
        .unwrap_or_else(|| ok("")))
    }
}

pub struct FakeProbe(pub ProbeOutcome);

impl HealthProbe for FakeProbe {
    fn probe(&self, _url: &str) -> ProbeOutcome {
        self.0.clone()
    }
}
