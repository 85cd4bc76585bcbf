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

//! Content-addressed bookkeeping for audio blobs written during a run.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::audio::Codec;
use crate::gm::note_name;

/// Every blob stored during one run, keyed by content hash. The first zone to
/// produce a hash owns the file; later producers point at it. A stored path is
/// never handed out again.
#[derive(Debug, Default)]
pub struct BlobStore {
    /// Stored blob paths, relative to the output root.
    stored: HashMap<String, PathBuf>,
    /// Every path a blob has been written to.
    paths: HashSet<PathBuf>,
    /// Number of zones that reused an existing blob.
    reused: usize,
}

impl BlobStore {
    pub fn new() -> BlobStore {
        BlobStore::default()
    }

    /// Returns the path of the blob already stored for this hash, counting the
    /// reuse.
    pub fn reuse(&mut self, hash: &str) -> Option<PathBuf> {
        let existing = self.stored.get(hash).cloned();
        if let Some(path) = &existing {
            debug!(hash, path = ?path, "Reusing stored blob");
            self.reused += 1;
        }
        existing
    }

    /// Records a newly stored blob.
    pub fn record(&mut self, hash: &str, path: &Path) {
        self.stored.insert(hash.to_string(), path.to_path_buf());
        self.paths.insert(path.to_path_buf());
    }

    /// Whether a blob has already been written to this path.
    pub fn is_taken(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Picks a path `{dir}/zone_{note}.{ext}` no blob has been written to yet,
    /// appending `_2`, `_3`, ... to the stem on collisions.
    pub fn free_path(&self, dir: &Path, root_note: u8, codec: Codec) -> PathBuf {
        let stem = format!("zone_{}", note_name(root_note));
        let mut path = dir.join(format!("{}.{}", stem, codec.extension()));
        let mut suffix = 2;
        while self.is_taken(&path) {
            path = dir.join(format!("{}_{}.{}", stem, suffix, codec.extension()));
            suffix += 1;
        }
        path
    }

    /// Number of distinct blobs stored.
    pub fn written(&self) -> usize {
        self.stored.len()
    }

    /// Number of zones that reused an existing blob.
    pub fn reused(&self) -> usize {
        self.reused
    }
}
