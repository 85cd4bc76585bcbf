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
use std::path::PathBuf;

use crate::audio::PayloadError;
use crate::config::error::ConfigError;
use crate::source::NameTableError;

/// Errors that stop a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Failed to load GM name table {path}: {source}")]
    NameTable {
        path: PathBuf,
        #[source]
        source: NameTableError,
    },

    #[error("Failed to read source directory {path}: {source}")]
    SourceDir {
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

    #[error(transparent)]
    Settings(#[from] ConfigError),
}

/// Errors converting a single instrument. The run logs these and moves on, so
/// the variants only exist for the message.
#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed descriptor: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Preset directory {0} already holds another instrument")]
    DuplicatePreset(PathBuf),
}
