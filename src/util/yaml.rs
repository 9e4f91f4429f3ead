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

use crate::util::terminal::{banner, markdown_print};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

const YAML_ERROR_SHOW_LINES:usize = 10;
const YAML_ERROR_WIDTH:usize = 180; // things will wrap in terminal anyway

// ${VAR} or $VAR
static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
});

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Print a YAML parse error with the surrounding lines of the offending document.
/// `contents` is the text that was actually parsed (after variable expansion).
pub fn show_yaml_error_in_context(yaml_error: &serde_yaml::Error, path: &Path, contents: &str) {

    println!();

    let yaml_error_str = error_summary(yaml_error);

    let location = match yaml_error.location() {
        Some(location) => location,
        None => {
            let markdown_table = format!("|:-|\n\
                                          |Error reading YAML file: {}|\n\
                                          |{}|\n\
                                          |-", path.display(), yaml_error_str);
            markdown_print(&markdown_table);
            return;
        }
    };

    banner(&format!("Error reading YAML file: {}, {}", path.display(), yaml_error_str));

    println!();
    for line in context_lines(contents, location.line(), location.column()) {
        println!("{}", line);
    }
    println!();
}

/// The error message cut to the display width on a character boundary.
pub fn error_summary(yaml_error: &serde_yaml::Error) -> String {
    let mut summary = yaml_error.to_string();
    if let Some((cut, _)) = summary.char_indices().nth(YAML_ERROR_WIDTH) {
        summary.truncate(cut);
        summary.push_str("...");
    }
    summary
}

/// Lines of `contents` around `error_line` (1-based), the offending one marked.
pub fn context_lines(contents: &str, error_line: usize, error_column: usize) -> Vec<String> {
    let show_start = error_line.saturating_sub(YAML_ERROR_SHOW_LINES);
    let show_stop = error_line + YAML_ERROR_SHOW_LINES;

    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(count, _)| *count >= show_start && *count <= show_stop)
        .map(|(count, line)| {
            if count == error_line {
                format!("     {count:5}:{error_column:5} | >>> | {}", line)
            } else {
                format!("     {count:5}       |     | {}", line)
            }
        })
        .collect()
}

/// Replace `${VAR}` and `$VAR` references with values from the environment.
/// Unset variables expand to the empty string, as a shell would.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Same as [`expand_env_vars`] with an explicit lookup
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR
        .replace_all(input, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or_default();
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}
