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

//! Fixture builders for descriptor datasets and converted library trees.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use crate::index::Index;
use crate::source::{MELODIC_DIR, NAMES_FILE, PERCUSSION_DIR};

/// Base64-encodes bytes the way descriptor files embed them.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Fake MP3 frame: a frame sync header followed by a seed-dependent body.
pub fn mp3_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFB, 0x90, 0x64];
    bytes.extend((0..32).map(|i: u8| i.wrapping_mul(seed).wrapping_add(seed)));
    bytes
}

/// Fake Ogg page.
pub fn ogg_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = b"OggS".to_vec();
    bytes.extend((0..32).map(|i: u8| i ^ seed));
    bytes
}

/// Little-endian 16-bit PCM.
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Builder for a descriptor zone.
#[derive(Clone)]
pub struct ZoneFixture {
    value: Value,
}

impl ZoneFixture {
    /// A zone over the key range, recorded at the given MIDI note.
    pub fn new(low: u8, high: u8, root_note: u8) -> ZoneFixture {
        ZoneFixture {
            value: json!({
                "midi": 0,
                "originalPitch": u32::from(root_note) * 100,
                "keyRangeLow": low,
                "keyRangeHigh": high,
                "sampleRate": 44100,
            }),
        }
    }

    /// Embeds a compressed payload in the `file` field.
    pub fn file(mut self, bytes: &[u8]) -> ZoneFixture {
        self.value["file"] = json!(encode(bytes));
        self
    }

    /// Embeds raw PCM in the `sample` field.
    pub fn sample(mut self, bytes: &[u8]) -> ZoneFixture {
        self.value["sample"] = json!(encode(bytes));
        self
    }

    pub fn looped(mut self, start: u64, end: u64) -> ZoneFixture {
        self.value["loopStart"] = json!(start);
        self.value["loopEnd"] = json!(end);
        self
    }

    pub fn channel(mut self, midi: i64) -> ZoneFixture {
        self.value["midi"] = json!(midi);
        self
    }

    pub fn set(mut self, field: &str, value: Value) -> ZoneFixture {
        self.value[field] = value;
        self
    }
}

/// Creates a dataset root with the given GM name table and empty descriptor
/// directories.
pub fn write_dataset(root: &Path, names: &[&str]) {
    fs::create_dir_all(root.join(MELODIC_DIR)).unwrap();
    fs::create_dir_all(root.join(PERCUSSION_DIR)).unwrap();
    fs::write(
        root.join(NAMES_FILE),
        serde_json::to_string(&names).unwrap(),
    )
    .unwrap();
}

/// Writes a melodic descriptor.
pub fn write_melodic(root: &Path, file_name: &str, zones: &[ZoneFixture]) {
    write_descriptor(&root.join(MELODIC_DIR).join(file_name), zones);
}

/// Writes a percussion descriptor.
pub fn write_percussion(root: &Path, file_name: &str, zones: &[ZoneFixture]) {
    write_descriptor(&root.join(PERCUSSION_DIR).join(file_name), zones);
}

fn write_descriptor(path: &Path, zones: &[ZoneFixture]) {
    let zones: Vec<Value> = zones.iter().map(|zone| zone.value.clone()).collect();
    fs::write(path, serde_json::to_string(&json!({ "zones": zones })).unwrap()).unwrap();
}

/// Reads a JSON document.
pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Counts regular files below a directory.
pub fn count_files(dir: &Path, extension: &str) -> usize {
    let mut count = 0;
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            count += count_files(&path, extension);
        } else if path.extension().is_some_and(|ext| ext == extension) {
            count += 1;
        }
    }
    count
}

/// Asserts every `path` in an index resolves relative to the index's directory.
pub fn assert_index_paths_resolve(index_path: &Path) {
    let index: Index = serde_json::from_str(&fs::read_to_string(index_path).unwrap()).unwrap();
    let dir = index_path.parent().unwrap();
    for entry in &index.entries {
        assert!(
            dir.join(entry.path()).is_file(),
            "{} references missing {}",
            index_path.display(),
            entry.path()
        );
    }
}
