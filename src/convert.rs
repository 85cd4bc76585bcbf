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

//! Converts a directory of instrument descriptors into a preset library.
//!
//! Each descriptor becomes one preset document plus one audio file per unique
//! zone payload. Identical payloads are stored once per run. After all
//! instruments are processed a library index is written per source library,
//! followed by a root index listing the libraries.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::audio::AudioPayload;
use crate::config::ConverterSettings;
use crate::gm::{self, RootPitch, PERCUSSION_CATEGORY};
use crate::index::{
    self, Entry, Index, LibraryEntry, PresetEntry, INDEX_FILE, ROOT_INDEX_DESCRIPTION,
    ROOT_INDEX_NAME,
};
use crate::output::Output;
use crate::preset::{
    AudioRef, KeyRange, LoopRegion, Metadata, Node, Pitch, Preset, SamplerConfig, Zone,
    ZoneStats, PRESET_FILE, PRESET_FORMAT, PRESET_VERSION,
};
use crate::source::{
    Descriptor, DescriptorName, GmNames, RawZone, SourceKind, MELODIC_DIR, NAMES_FILE,
    PERCUSSION_DIR,
};
use crate::util::{filename_display, relative_path, sanitize_name, to_forward_slashes};

use self::blobs::BlobStore;
pub use self::error::{ConvertError, InstrumentError};

mod blobs;
mod error;
#[cfg(test)]
mod tests;

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// The dataset root holding the name table and descriptor directories.
    pub source: PathBuf,
    /// The library output root.
    pub output: PathBuf,
    /// Compute everything but write nothing.
    pub dry_run: bool,
    /// Stop after this many instruments have been converted.
    pub limit: Option<usize>,
    pub settings: ConverterSettings,
}

impl ConvertOptions {
    pub fn new(source: &Path, output: &Path) -> ConvertOptions {
        ConvertOptions {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            dry_run: false,
            limit: None,
            settings: ConverterSettings::default(),
        }
    }
}

/// Loads converter settings from an optional file, falling back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<ConverterSettings, ConvertError> {
    match path {
        Some(path) => Ok(ConverterSettings::deserialize(path)?),
        None => Ok(ConverterSettings::default()),
    }
}

/// Counters describing a finished conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    /// Instruments written as presets.
    pub converted: usize,
    /// Files whose name doesn't identify an instrument.
    pub skipped: usize,
    /// Instruments dropped because no zone carried audio.
    pub empty: usize,
    /// Instruments that failed to convert.
    pub errors: usize,
    /// Zones written into presets.
    pub zones: usize,
    /// Distinct audio blobs stored.
    pub blobs_written: usize,
    /// Zones that pointed at an already stored blob.
    pub dedup_hits: usize,
    /// Libraries indexed.
    pub libraries: usize,
}

/// Runs the converter.
pub fn convert(options: &ConvertOptions) -> Result<ConvertReport, ConvertError> {
    let names_path = options.source.join(NAMES_FILE);
    let names = GmNames::load(&names_path).map_err(|source| ConvertError::NameTable {
        path: names_path.clone(),
        source,
    })?;
    info!(path = ?names_path, "Loaded GM name table");

    let descriptors = list_descriptors(&options.source)?;
    info!(
        count = descriptors.len(),
        dry_run = options.dry_run,
        "Converting instrument descriptors"
    );

    let limit = options.limit.filter(|limit| *limit > 0);
    let mut converter = Converter::new(names, options);
    for (path, kind) in descriptors {
        if limit.is_some_and(|limit| converter.report.converted >= limit) {
            info!(limit = ?limit, "Reached conversion limit");
            break;
        }
        converter.convert_file(&path, kind);
    }

    converter.finish()
}

/// Lists descriptor files, melodic first, each directory in file-name order.
fn list_descriptors(source: &Path) -> Result<Vec<(PathBuf, SourceKind)>, ConvertError> {
    let mut descriptors = Vec::new();
    for (dir, kind) in [
        (MELODIC_DIR, SourceKind::Melodic),
        (PERCUSSION_DIR, SourceKind::Percussion),
    ] {
        let path = source.join(dir);
        if !path.is_dir() {
            warn!(path = ?path, "Descriptor directory not found, skipping");
            continue;
        }

        let files = sorted_files(&path).map_err(|source| ConvertError::SourceDir {
            path: path.clone(),
            source,
        })?;
        descriptors.extend(files.into_iter().map(|file| (file, kind)));
    }
    Ok(descriptors)
}

fn sorted_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Presets converted for one source library, in conversion order.
struct Library {
    name: String,
    entries: Vec<PresetEntry>,
}

/// State threaded through one conversion run.
struct Converter<'a> {
    names: GmNames,
    settings: &'a ConverterSettings,
    output: Output,
    blobs: BlobStore,
    /// Preset directories already written during this run.
    preset_dirs: HashSet<PathBuf>,
    libraries: Vec<Library>,
    report: ConvertReport,
}

/// Identity of the instrument being converted, resolved from its file name
/// and contents.
struct Instrument<'a> {
    id: &'a DescriptorName,
    percussion: bool,
    name: String,
    category: &'static str,
    /// Preset directory relative to the output root.
    dir: PathBuf,
}

impl<'a> Converter<'a> {
    fn new(names: GmNames, options: &'a ConvertOptions) -> Converter<'a> {
        Converter {
            names,
            settings: &options.settings,
            output: Output::new(&options.output, options.dry_run),
            blobs: BlobStore::new(),
            preset_dirs: HashSet::new(),
            libraries: Vec::new(),
            report: ConvertReport::default(),
        }
    }

    /// Converts one descriptor file. Failures are logged and counted.
    fn convert_file(&mut self, path: &Path, kind: SourceKind) {
        let file_name = filename_display(path);
        let Some(id) = DescriptorName::parse(file_name, kind) else {
            debug!(file = file_name, "Not an instrument descriptor, skipping");
            self.report.skipped += 1;
            return;
        };

        match self.convert_instrument(path, &id) {
            Ok(Some(entry)) => {
                info!(
                    file = file_name,
                    library = %id.library,
                    preset = %entry.path,
                    zones = entry.zone_count.unwrap_or_default(),
                    "Converted instrument"
                );
                self.report.converted += 1;
                self.add_entry(&id.library, entry);
            }
            Ok(None) => {
                debug!(file = file_name, "No zones with audio, dropping instrument");
                self.report.empty += 1;
            }
            Err(e) => {
                error!(file = file_name, err = %e, "Failed to convert instrument");
                self.report.errors += 1;
            }
        }
    }

    /// Converts one instrument. Returns None when no zone carries audio, in
    /// which case nothing is written.
    fn convert_instrument(
        &mut self,
        path: &Path,
        id: &DescriptorName,
    ) -> Result<Option<PresetEntry>, InstrumentError> {
        let descriptor: Descriptor = serde_json::from_str(&fs::read_to_string(path)?)?;
        let instrument = self.resolve(id, &descriptor);

        // Decode every payload before touching the output so a bad zone leaves
        // no partial instrument behind.
        let mut decoded: Vec<(&RawZone, AudioPayload)> = Vec::new();
        for raw in &descriptor.zones {
            let Some(encoded) = raw.payload() else {
                continue;
            };
            let payload =
                AudioPayload::decode(encoded, raw.sample_rate(), self.settings.hash_length())?;
            decoded.push((raw, payload));
        }
        if decoded.is_empty() {
            return Ok(None);
        }
        if !self.preset_dirs.insert(instrument.dir.clone()) {
            return Err(InstrumentError::DuplicatePreset(instrument.dir));
        }

        self.output.create_dir_all(&instrument.dir)?;

        let mut zones = Vec::with_capacity(decoded.len());
        for (raw, payload) in decoded {
            let pitch = RootPitch::from_raw(raw.original_pitch, raw.coarse_tune, raw.fine_tune);
            let blob = match self.blobs.reuse(payload.hash()) {
                Some(existing) => existing,
                None => {
                    let blob = self
                        .blobs
                        .free_path(&instrument.dir, pitch.root_note, payload.codec());
                    self.output.write_bytes(&blob, payload.contents())?;
                    self.blobs.record(payload.hash(), &blob);
                    blob
                }
            };

            let (low, high) = raw.key_range();
            zones.push(Zone {
                key_range: KeyRange::new(low, high),
                pitch: Pitch {
                    root_note: pitch.root_note,
                    fine_tune_cents: pitch.fine_tune_cents,
                },
                sample_rate: raw.sample_rate(),
                audio: AudioRef::external(
                    relative_path(&instrument.dir, &blob),
                    payload.codec().as_str(),
                    payload.hash(),
                ),
                loop_region: raw
                    .loop_region()
                    .map(|(start, end)| LoopRegion { start, end }),
            });
        }

        let mut stats = ZoneStats::default();
        zones.iter().for_each(|zone| stats.add(zone.key_range));
        let looped = zones.iter().any(|zone| zone.loop_region.is_some());
        let tags = tags(&instrument, looped);

        let preset = Preset {
            format: PRESET_FORMAT.to_string(),
            version: PRESET_VERSION,
            name: instrument.name.clone(),
            category: Some(instrument.category.to_string()),
            tags: tags.clone(),
            metadata: self.metadata(&instrument),
            node: Some(Node::Sampler {
                config: SamplerConfig {
                    one_shot: !looped,
                    zones,
                },
            }),
        };

        let preset_path = instrument.dir.join(PRESET_FILE);
        self.output.write_json(&preset_path, &preset)?;
        self.report.zones += stats.count;

        let library_relative = preset_path
            .strip_prefix(&id.library)
            .unwrap_or(preset_path.as_path());
        Ok(Some(PresetEntry {
            name: instrument.name.clone(),
            path: to_forward_slashes(library_relative),
            category: instrument.category.to_string(),
            tags,
            gm_program: preset.metadata.gm_program,
            zone_count: Some(stats.count),
            key_range: stats.key_range,
        }))
    }

    /// Resolves display name, category and output directory.
    fn resolve<'i>(&self, id: &'i DescriptorName, descriptor: &Descriptor) -> Instrument<'i> {
        let percussion = id.kind == SourceKind::Percussion || descriptor.declares_percussion();
        let name = match id.kind {
            SourceKind::Melodic => self.names.display_name(id.number),
            SourceKind::Percussion => gm::percussion_key_name(id.number)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Percussion {}", id.number)),
        };

        let mut dir_name = sanitize_name(&name);
        if id.variant > 0 {
            dir_name = format!("{}_{}", dir_name, id.variant);
        }

        let (category, dir) = if percussion {
            (
                PERCUSSION_CATEGORY,
                Path::new(&id.library)
                    .join("percussion")
                    .join("individual")
                    .join(dir_name),
            )
        } else {
            let category = gm::category_for_program(id.number);
            (
                category,
                Path::new(&id.library)
                    .join("instruments")
                    .join(category)
                    .join(dir_name),
            )
        };

        Instrument {
            id,
            percussion,
            name,
            category,
            dir,
        }
    }

    fn metadata(&self, instrument: &Instrument) -> Metadata {
        let id = instrument.id;
        let melodic = !instrument.percussion;
        Metadata {
            gm_program: melodic.then_some(id.number),
            gm_category: melodic.then(|| instrument.category.to_string()),
            midi_note: instrument.percussion.then_some(id.number),
            source: id.library.clone(),
            variant: Some(id.variant),
            license: Some(self.settings.license_for(&id.library).to_string()),
        }
    }

    fn add_entry(&mut self, library: &str, entry: PresetEntry) {
        match self.libraries.iter_mut().find(|l| l.name == library) {
            Some(existing) => existing.entries.push(entry),
            None => self.libraries.push(Library {
                name: library.to_string(),
                entries: vec![entry],
            }),
        }
    }

    /// Writes the library indexes and the root index.
    fn finish(mut self) -> Result<ConvertReport, ConvertError> {
        let mut root_entries = Vec::with_capacity(self.libraries.len());
        for library in &self.libraries {
            let description = index::soundfont_description(&library.name);
            let index_path = Path::new(&library.name).join(INDEX_FILE);
            let entries = library.entries.iter().cloned().map(Entry::Preset).collect();
            self.output
                .write_json(
                    &index_path,
                    &Index::new(&library.name, &description, entries),
                )
                .map_err(|source| ConvertError::Write {
                    path: index_path.clone(),
                    source,
                })?;
            info!(
                library = %library.name,
                presets = library.entries.len(),
                "Wrote library index"
            );

            root_entries.push(Entry::Index(LibraryEntry {
                name: library.name.clone(),
                path: to_forward_slashes(&index_path),
                description,
                preset_count: library.entries.len(),
            }));
        }

        let root_path = PathBuf::from(INDEX_FILE);
        self.output
            .write_json(
                &root_path,
                &Index::new(ROOT_INDEX_NAME, ROOT_INDEX_DESCRIPTION, root_entries),
            )
            .map_err(|source| ConvertError::Write {
                path: self.output.root().join(&root_path),
                source,
            })?;

        self.report.libraries = self.libraries.len();
        self.report.blobs_written = self.blobs.written();
        self.report.dedup_hits = self.blobs.reused();
        Ok(self.report)
    }
}

/// Builds the preset tags. Percussion ends up with only its kind and note;
/// melodic instruments carry family, program and loop behavior.
fn tags(instrument: &Instrument, looped: bool) -> Vec<String> {
    let id = instrument.id;
    if instrument.percussion {
        return vec![
            PERCUSSION_CATEGORY.to_string(),
            format!("midi:{}", id.number),
        ];
    }

    let mut tags = vec![
        "melodic".to_string(),
        instrument.category.to_string(),
        format!("gm:{}", id.number),
    ];
    if looped {
        tags.push("sustained".to_string());
        tags.push("looped".to_string());
    } else {
        tags.push("one-shot".to_string());
    }
    tags
}
