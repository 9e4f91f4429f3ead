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

use crate::error::{BctlError, Result};
use inline_colorization::{color_red, color_reset};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

// quit with a message - don't use this except in main.rs!
pub fn quit(s: &str) -> ! {
    eprintln!("{color_red}{}{color_reset}", s);
    process::exit(0x01)
}

// expand a leading ~ the way a shell would, leaving the path alone if that fails
pub fn expand_path(path: &str) -> PathBuf {
    match expanduser::expanduser(path) {
        Ok(expanded) => expanded,
        Err(_) => PathBuf::from(path),
    }
}

// true if the path, after tilde expansion, names something on disk
pub fn path_exists(path: &str) -> bool {
    expand_path(path).exists()
}

pub fn read_local_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(
        |x| BctlError::Other(format!("unable to read file: {}, {}", path.display(), x))
    )
}

// write a whole file, creating missing parent directories first
pub fn write_local_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(
                |x| BctlError::Other(format!("unable to create directory: {}, {}", parent.display(), x))
            )?;
        }
    }
    fs::write(path, contents).map_err(
        |x| BctlError::Other(format!("unable to write file: {}, {}", path.display(), x))
    )
}

pub fn path_as_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
