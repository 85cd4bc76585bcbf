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

//! Regenerates the library and root indexes of a converted library tree.
//!
//! Every immediate sub-directory of the root is a library, except for tooling
//! directories. Presets are found at any depth by their file name and
//! summarized from their playback graph.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::index::{
    self, Entry, Index, LibraryEntry, PresetEntry, INDEX_FILE, ROOT_INDEX_DESCRIPTION,
    ROOT_INDEX_NAME,
};
use crate::output::Output;
use crate::preset::PRESET_FILE;
use crate::util::{locale_cmp, to_forward_slashes};

use self::summary::PresetSummary;

mod summary;

/// Directories under the library root that are never libraries.
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    ".github",
    "node_modules",
    "scripts",
    "tools",
    "target",
];

/// Directory name of the library shipped with SongWalker itself.
pub const BUILTIN_LIBRARY: &str = "builtin";

/// Category for presets that don't declare one.
const DEFAULT_CATEGORY: &str = "sampler";

/// Errors that stop an indexing run. Only the root directory and the root
/// index are fatal; anything inside a library is logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors summarizing a single preset. Logged and counted, never fatal.
#[derive(Debug, thiserror::Error)]
enum PresetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counters describing a finished indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub libraries: usize,
    pub presets: usize,
    pub errors: usize,
}

/// Display name of a library directory.
pub fn display_name(dir_name: &str) -> String {
    if dir_name == BUILTIN_LIBRARY {
        "Built-in".to_string()
    } else {
        dir_name.replace('_', " ")
    }
}

/// Description of a library directory.
pub fn description(dir_name: &str) -> String {
    if dir_name == BUILTIN_LIBRARY {
        "Built-in SongWalker instruments".to_string()
    } else {
        index::soundfont_description(&display_name(dir_name))
    }
}

/// Rebuilds every library index under the root, then the root index.
pub fn run(root: &Path) -> Result<IndexReport, IndexError> {
    let output = Output::new(root, false);
    let mut report = IndexReport::default();
    let mut root_entries = Vec::new();

    for library_dir in library_dirs(root)? {
        let dir_name = library_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entries: Vec<Entry> = index_library(&library_dir, &mut report)
            .into_iter()
            .map(Entry::Preset)
            .collect();
        let preset_count = entries.len();
        let library_description = description(&dir_name);
        let index_path = Path::new(&dir_name).join(INDEX_FILE);
        let index = Index::new(&display_name(&dir_name), &library_description, entries);
        if let Err(e) = output.write_json(&index_path, &index) {
            error!(
                path = ?root.join(&index_path),
                err = %e,
                "Failed to write library index"
            );
            report.errors += 1;
            continue;
        }
        info!(library = %dir_name, presets = preset_count, "Indexed library");

        report.libraries += 1;
        report.presets += preset_count;
        root_entries.push(Entry::Index(LibraryEntry {
            name: display_name(&dir_name),
            path: to_forward_slashes(&index_path),
            description: library_description,
            preset_count,
        }));
    }

    output
        .write_json(
            Path::new(INDEX_FILE),
            &Index::new(ROOT_INDEX_NAME, ROOT_INDEX_DESCRIPTION, root_entries),
        )
        .map_err(|source| IndexError::Write {
            path: root.join(INDEX_FILE),
            source,
        })?;

    Ok(report)
}

/// Lists library directories in name order.
fn library_dirs(root: &Path) -> Result<Vec<PathBuf>, IndexError> {
    list_library_dirs(root).map_err(|source| IndexError::Read {
        path: root.to_path_buf(),
        source,
    })
}

fn list_library_dirs(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if SKIP_DIRS.iter().any(|skip| name == *skip) {
            debug!(dir = ?name, "Skipping tooling directory");
            continue;
        }
        dirs.push(entry.path());
    }
    dirs.sort();
    Ok(dirs)
}

/// Summarizes every preset below a library directory, sorted by category then
/// name.
fn index_library(library_dir: &Path, report: &mut IndexReport) -> Vec<PresetEntry> {
    let mut preset_paths = Vec::new();
    find_presets(library_dir, &mut preset_paths, report);

    let mut entries = Vec::with_capacity(preset_paths.len());
    for path in preset_paths {
        match summarize(library_dir, &path) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                error!(path = ?path, err = %e, "Failed to read preset");
                report.errors += 1;
            }
        }
    }

    entries.sort_by(|a, b| {
        locale_cmp(&a.category, &b.category).then_with(|| locale_cmp(&a.name, &b.name))
    });
    entries
}

/// Recursively collects preset files, walking directories in name order. A
/// directory that can't be listed is logged, counted and skipped.
fn find_presets(dir: &Path, found: &mut Vec<PathBuf>, report: &mut IndexReport) {
    let mut children = match list_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            error!(path = ?dir, err = %e, "Failed to read directory");
            report.errors += 1;
            return;
        }
    };
    children.sort();

    for child in children {
        if child.is_dir() {
            find_presets(&child, found, report);
        } else if child.file_name().is_some_and(|name| name == PRESET_FILE) {
            found.push(child);
        }
    }
}

fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect()
}

/// Builds the index entry for one preset file.
fn summarize(library_dir: &Path, path: &Path) -> Result<PresetEntry, PresetError> {
    let preset = PresetSummary::parse(&fs::read_to_string(path)?)?;
    let stats = preset.zone_stats();

    let relative = path.strip_prefix(library_dir).unwrap_or(path);
    Ok(PresetEntry {
        path: to_forward_slashes(relative),
        category: preset
            .category()
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        tags: preset.tags(),
        gm_program: preset.gm_program(),
        zone_count: (stats.count > 0).then_some(stats.count),
        key_range: stats.key_range.filter(|_| stats.count > 0),
        name: preset.name,
    })
}
