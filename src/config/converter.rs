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
use std::collections::HashMap;
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;

/// Default number of hex characters kept from the SHA-256 of a blob.
pub const DEFAULT_HASH_LENGTH: usize = 16;

/// Shortest and longest allowed truncated hash.
const MIN_HASH_LENGTH: usize = 8;
const MAX_HASH_LENGTH: usize = 64;

/// Optional settings for the converter, read from a YAML, TOML or JSON file.
#[derive(Deserialize, Clone, Debug)]
pub struct ConverterSettings {
    /// License notes keyed by source library name.
    #[serde(default)]
    license: HashMap<String, String>,

    /// License note for libraries without an entry in `license`.
    #[serde(default = "default_license")]
    default_license: String,

    /// Number of hex characters of the content hash used to identify blobs.
    #[serde(default = "default_hash_length")]
    hash_length: usize,
}

fn default_license() -> String {
    "See original soundfont license".to_string()
}

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}

impl Default for ConverterSettings {
    fn default() -> Self {
        ConverterSettings {
            license: HashMap::new(),
            default_license: default_license(),
            hash_length: default_hash_length(),
        }
    }
}

impl ConverterSettings {
    /// Reads the settings from the given file. The format is picked from the
    /// file extension.
    pub fn deserialize(path: &Path) -> Result<ConverterSettings, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<ConverterSettings>()?)
    }

    /// Gets the license note for a source library. Library names match
    /// case-insensitively.
    pub fn license_for(&self, library: &str) -> &str {
        self.license
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(library))
            .map(|(_, license)| license.as_str())
            .unwrap_or(&self.default_license)
    }

    /// Gets the truncated hash length, clamped to a usable range.
    pub fn hash_length(&self) -> usize {
        self.hash_length.clamp(MIN_HASH_LENGTH, MAX_HASH_LENGTH)
    }
}
