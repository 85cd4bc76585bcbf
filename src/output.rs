// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// Writes files below a root directory. In dry-run mode every write is logged
/// and skipped.
#[derive(Debug, Clone)]
pub struct Output {
    root: PathBuf,
    dry_run: bool,
}

impl Output {
    pub fn new(root: &Path, dry_run: bool) -> Output {
        Output {
            root: root.to_path_buf(),
            dry_run,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a directory (and its parents) relative to the root.
    pub fn create_dir_all(&self, relative: &Path) -> io::Result<()> {
        let path = self.root.join(relative);
        if self.dry_run {
            debug!(path = ?path, "Dry run: would create directory");
            return Ok(());
        }
        fs::create_dir_all(path)
    }

    /// Writes bytes to a file relative to the root, replacing any existing file.
    pub fn write_bytes(&self, relative: &Path, contents: &[u8]) -> io::Result<()> {
        let path = self.root.join(relative);
        if self.dry_run {
            debug!(path = ?path, bytes = contents.len(), "Dry run: would write file");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    /// Writes a value as pretty-printed JSON relative to the root.
    pub fn write_json<T: Serialize>(&self, relative: &Path, value: &T) -> io::Result<()> {
        let json = to_json(value)?;
        self.write_bytes(relative, json.as_bytes())
    }
}

/// Serializes a value as pretty-printed JSON with a trailing newline.
pub fn to_json<T: Serialize>(value: &T) -> io::Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
