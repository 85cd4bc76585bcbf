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

//! The preset document format.

use serde::{Deserialize, Serialize};

/// Format tag of preset documents.
pub const PRESET_FORMAT: &str = "songwalker-preset";

/// Current preset format version.
pub const PRESET_VERSION: u32 = 1;

/// The file name every preset document is stored under.
pub const PRESET_FILE: &str = "preset.json";

/// A preset document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// The playback graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
}

fn default_format() -> String {
    PRESET_FORMAT.to_string()
}

fn default_version() -> u32 {
    PRESET_VERSION
}

/// Provenance metadata.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_program: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_note: Option<u8>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// A node of the playback graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Plays keyed sample zones.
    Sampler { config: SamplerConfig },
    /// Layers or splits several child nodes.
    Composite {
        #[serde(default)]
        children: Vec<Node>,
    },
}

/// Configuration of a sampler node.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplerConfig {
    #[serde(default)]
    pub one_shot: bool,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// A keyed, pitched sample region.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub key_range: KeyRange,
    pub pitch: Pitch,
    pub sample_rate: u32,
    pub audio: AudioRef,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_region: Option<LoopRegion>,
}

/// An inclusive MIDI key range.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub low: u8,
    pub high: u8,
}

impl KeyRange {
    pub fn new(low: u8, high: u8) -> KeyRange {
        KeyRange { low, high }
    }

    /// Returns the smallest range covering both ranges.
    pub fn union(self, other: KeyRange) -> KeyRange {
        KeyRange {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }
}

/// The pitch a sample was recorded at.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pitch {
    pub root_note: u8,
    pub fine_tune_cents: i32,
}

/// A reference to an audio blob stored outside the preset document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AudioRef {
    #[serde(rename = "type", default = "default_audio_type")]
    pub kind: String,
    /// Path of the blob relative to the preset's directory.
    pub url: String,
    pub codec: String,
    /// Truncated SHA-256 of the decoded audio.
    pub sha256: String,
}

fn default_audio_type() -> String {
    "external".to_string()
}

impl AudioRef {
    pub fn external(url: String, codec: &str, sha256: &str) -> AudioRef {
        AudioRef {
            kind: default_audio_type(),
            url,
            codec: codec.to_string(),
            sha256: sha256.to_string(),
        }
    }
}

/// Loop region in sample offsets.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopRegion {
    pub start: u64,
    pub end: u64,
}

/// Zone count and aggregate key range of a playback graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneStats {
    pub count: usize,
    pub key_range: Option<KeyRange>,
}

impl ZoneStats {
    /// Accounts for one more zone.
    pub fn add(&mut self, range: KeyRange) {
        self.count += 1;
        self.key_range = Some(match self.key_range {
            Some(current) => current.union(range),
            None => range,
        });
    }
}
