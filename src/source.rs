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

//! The input side of the converter: the GM name table, per-instrument
//! descriptor files and the file-name convention that identifies them.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// File holding the General MIDI program names.
pub const NAMES_FILE: &str = "names.json";

/// Directory holding melodic instrument descriptors.
pub const MELODIC_DIR: &str = "i";

/// Directory holding percussion descriptors.
pub const PERCUSSION_DIR: &str = "p";

/// MIDI channel value a zone uses to mark itself as percussion.
pub const PERCUSSION_CHANNEL: i64 = 128;

/// Default sample rate for zones that don't declare one.
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Which input directory a descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Melodic,
    Percussion,
}

/// The identity encoded in a descriptor file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorName {
    pub kind: SourceKind,
    /// The GM program for melodic descriptors, the MIDI note for percussion.
    pub number: u8,
    pub variant: u32,
    pub library: String,
}

impl DescriptorName {
    /// Parses a descriptor file name. Returns None when the name doesn't follow
    /// the convention or encodes a program/note outside the MIDI range.
    ///
    /// Melodic: `{code}_{library}[_sf2][_file].json`, program = code / 10,
    /// variant = code % 10.
    ///
    /// Percussion: `{note}_{variant}_{library}[_sf2][_file].json`. A 5-digit
    /// note starting with 128 carries the note in its last two digits.
    pub fn parse(file_name: &str, kind: SourceKind) -> Option<DescriptorName> {
        let stem = file_name.strip_suffix(".json")?;

        match kind {
            SourceKind::Melodic => {
                let (code, rest) = stem.split_once('_')?;
                let code = parse_digits(code)?;
                let program = u8::try_from(code / 10).ok().filter(|p| *p < 128)?;
                Some(DescriptorName {
                    kind,
                    number: program,
                    variant: code % 10,
                    library: library_name(rest)?,
                })
            }
            SourceKind::Percussion => {
                let (note, rest) = stem.split_once('_')?;
                let (variant, rest) = rest.split_once('_')?;
                let note = match note.strip_prefix("128") {
                    Some(short) if note.len() == 5 => parse_digits(short)?,
                    _ => parse_digits(note)?,
                };
                let note = u8::try_from(note).ok().filter(|n| *n < 128)?;
                Some(DescriptorName {
                    kind,
                    number: note,
                    variant: parse_digits(variant)?,
                    library: library_name(rest)?,
                })
            }
        }
    }
}

fn parse_digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Strips the `_file` and `_sf2` suffixes from the library part of a name.
fn library_name(rest: &str) -> Option<String> {
    let rest = rest.strip_suffix("_file").unwrap_or(rest);
    let rest = rest.strip_suffix("_sf2").unwrap_or(rest);
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Failures reading the GM name table.
#[derive(Debug, thiserror::Error)]
pub enum NameTableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The General MIDI program name table.
#[derive(Debug, Clone, Default)]
pub struct GmNames {
    names: HashMap<u8, String>,
}

/// The on-disk shapes of the name table: a list indexed by program, or an
/// object keyed by the program number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNames {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl GmNames {
    /// Parses the name table from its JSON text.
    pub fn parse(contents: &str) -> Result<GmNames, serde_json::Error> {
        let names = match serde_json::from_str::<RawNames>(contents)? {
            RawNames::List(list) => list
                .into_iter()
                .enumerate()
                .filter_map(|(program, name)| u8::try_from(program).ok().map(|p| (p, name)))
                .collect(),
            RawNames::Map(map) => map
                .into_iter()
                .filter_map(|(program, name)| program.trim().parse::<u8>().ok().map(|p| (p, name)))
                .collect(),
        };
        Ok(GmNames { names })
    }

    /// Reads and parses the name table at the given path.
    pub fn load(path: &Path) -> Result<GmNames, NameTableError> {
        let contents = fs::read_to_string(path)?;
        Ok(GmNames::parse(&contents)?)
    }

    /// Gets the display name for a program. Anything after a `:` is a
    /// category annotation and is dropped.
    pub fn display_name(&self, program: u8) -> String {
        match self.names.get(&program) {
            Some(name) => name
                .split(':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
            None => format!("Program {}", program),
        }
    }
}

/// An instrument descriptor file.
#[derive(Deserialize, Debug, Default)]
pub struct Descriptor {
    #[serde(default)]
    pub zones: Vec<RawZone>,
}

impl Descriptor {
    /// Whether any zone declares the percussion MIDI channel.
    pub fn declares_percussion(&self) -> bool {
        self.zones
            .iter()
            .any(|zone| zone.midi == Some(PERCUSSION_CHANNEL))
    }
}

/// A zone as it appears in a descriptor file.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawZone {
    pub midi: Option<i64>,
    #[serde(default)]
    pub original_pitch: f64,
    #[serde(default)]
    pub coarse_tune: f64,
    #[serde(default)]
    pub fine_tune: f64,
    #[serde(default)]
    key_range_low: Option<f64>,
    #[serde(default)]
    key_range_high: Option<f64>,
    sample_rate: Option<f64>,
    loop_start: Option<f64>,
    loop_end: Option<f64>,
    /// Base64 of a compressed container (MP3/OGG).
    pub file: Option<String>,
    /// Base64 of raw 16-bit PCM.
    pub sample: Option<String>,
}

impl RawZone {
    /// The base64 audio payload, preferring the compressed container.
    pub fn payload(&self) -> Option<&str> {
        [self.file.as_deref(), self.sample.as_deref()]
            .into_iter()
            .flatten()
            .find(|payload| !payload.trim().is_empty())
    }

    /// The inclusive key range, clamped to the MIDI range.
    pub fn key_range(&self) -> (u8, u8) {
        let clamp = |value: f64| value.clamp(0.0, 127.0) as u8;
        let low = clamp(self.key_range_low.unwrap_or(0.0));
        let high = clamp(self.key_range_high.unwrap_or(127.0));
        (low, high)
    }

    /// The zone sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
            .filter(|rate| *rate > 0.0)
            .map(|rate| rate as u32)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// The loop region in samples, if it is valid.
    pub fn loop_region(&self) -> Option<(u64, u64)> {
        match (self.loop_start, self.loop_end) {
            (Some(start), Some(end)) if start >= 0.0 && end >= 0.0 && end > start => {
                Some((start as u64, end as u64))
            }
            _ => None,
        }
    }
}
