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

//! The index document format shared by the converter and the indexer.

use serde::{Deserialize, Serialize};

use crate::preset::KeyRange;

/// Format tag of index documents.
pub const INDEX_FORMAT: &str = "songwalker-index";

/// Current index format version.
pub const INDEX_VERSION: u32 = 1;

/// The file name every index document is stored under.
pub const INDEX_FILE: &str = "index.json";

/// Name of the root index.
pub const ROOT_INDEX_NAME: &str = "SongWalker Library";

/// Description of the root index.
pub const ROOT_INDEX_DESCRIPTION: &str = "All SongWalker instrument libraries";

/// Description of a library derived from a soundfont.
pub fn soundfont_description(library: &str) -> String {
    format!("Instruments converted from the {} soundfont", library)
}

/// An index document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Index {
    pub format: String,
    pub version: u32,
    pub name: String,
    pub description: String,
    pub entries: Vec<Entry>,
}

impl Index {
    pub fn new(name: &str, description: &str, entries: Vec<Entry>) -> Index {
        Index {
            format: INDEX_FORMAT.to_string(),
            version: INDEX_VERSION,
            name: name.to_string(),
            description: description.to_string(),
            entries,
        }
    }
}

/// An entry of an index document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Preset(PresetEntry),
    /// A reference to a library index, used by the root index.
    Index(LibraryEntry),
}

impl Entry {
    /// The path this entry points at, relative to the index's directory.
    pub fn path(&self) -> &str {
        match self {
            Entry::Preset(preset) => &preset.path,
            Entry::Index(library) => &library.path,
        }
    }
}

/// Summary of one preset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresetEntry {
    pub name: String,
    pub path: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_program: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_range: Option<KeyRange>,
}

/// Summary of one library, pointing at its own index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub name: String,
    pub path: String,
    pub description: String,
    pub preset_count: usize,
}
