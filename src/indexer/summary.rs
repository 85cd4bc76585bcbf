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

//! A forgiving read of preset documents. Only `name` is required; every other
//! field an index entry needs is taken when it has the expected shape and
//! dropped otherwise.

use serde::Deserialize;
use serde_json::Value;

use crate::preset::{KeyRange, ZoneStats};

/// Highest MIDI note.
const MAX_NOTE: f64 = 127.0;

/// The parts of a preset document an index entry is built from.
#[derive(Deserialize, Debug)]
pub struct PresetSummary {
    pub name: String,
    #[serde(default)]
    category: Value,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    metadata: Value,
    /// The playback graph. Older documents call this field `graph`.
    #[serde(default, alias = "graph")]
    node: Value,
}

impl PresetSummary {
    /// Parses a preset document.
    pub fn parse(contents: &str) -> Result<PresetSummary, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_str()
    }

    /// The string tags. Anything else in the list is ignored.
    pub fn tags(&self) -> Vec<String> {
        self.tags
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The General MIDI program, if it is a valid one.
    pub fn gm_program(&self) -> Option<u8> {
        self.metadata
            .get("gmProgram")
            .and_then(Value::as_u64)
            .and_then(|program| u8::try_from(program).ok())
            .filter(|program| *program < 128)
    }

    /// Counts zones and widens the key range across every sampler in the graph.
    pub fn zone_stats(&self) -> ZoneStats {
        let mut stats = ZoneStats::default();
        collect_zone_stats(&self.node, &mut stats);
        stats
    }
}

/// Graph nodes as far as zone counting cares. Children and zones stay raw so
/// one odd entry doesn't hide its siblings.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SummaryNode {
    Sampler {
        #[serde(default)]
        config: SamplerSummary,
    },
    Composite {
        #[serde(default, alias = "nodes")]
        children: Vec<Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct SamplerSummary {
    #[serde(default)]
    zones: Vec<Value>,
}

fn collect_zone_stats(node: &Value, stats: &mut ZoneStats) {
    match SummaryNode::deserialize(node) {
        Ok(SummaryNode::Sampler { config }) => {
            for zone in config.zones.iter().filter(|zone| zone.is_object()) {
                stats.add(zone_key_range(zone));
            }
        }
        Ok(SummaryNode::Composite { children }) => {
            for child in &children {
                collect_zone_stats(child, stats);
            }
        }
        Ok(SummaryNode::Other) | Err(_) => {}
    }
}

/// A zone's key range, clamped to the MIDI range. Missing bounds span the
/// whole keyboard.
fn zone_key_range(zone: &Value) -> KeyRange {
    let bound = |field: &str, default: f64| {
        zone.get("keyRange")
            .and_then(|range| range.get(field))
            .and_then(Value::as_f64)
            .unwrap_or(default)
            .clamp(0.0, MAX_NOTE) as u8
    };
    KeyRange::new(bound("low", 0.0), bound("high", MAX_NOTE))
}
