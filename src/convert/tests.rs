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
use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::tempdir;

use super::*;
use crate::testutil::{
    assert_index_paths_resolve, count_files, mp3_bytes, ogg_bytes, pcm_bytes, read_json,
    write_dataset, write_melodic, write_percussion, ZoneFixture,
};

const NAMES: &[&str] = &[
    "Acoustic Grand Piano: Piano",
    "Bright Acoustic Piano",
    "Electric Grand Piano",
];

fn options(source: &Path, output: &Path) -> ConvertOptions {
    ConvertOptions::new(source, output)
}

#[test]
fn test_grand_piano_end_to_end() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(21, 108, 60)
            .file(&mp3_bytes(1))
            .looped(10000, 20000)],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.converted, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.zones, 1);
    assert_eq!(report.blobs_written, 1);
    assert_eq!(report.libraries, 1);

    let preset_dir = output
        .path()
        .join("FluidR3_GM/instruments/piano/Acoustic_Grand_Piano");
    let preset = read_json(&preset_dir.join("preset.json"));
    assert_eq!(preset["format"], "songwalker-preset");
    assert_eq!(preset["version"], 1);
    assert_eq!(preset["name"], "Acoustic Grand Piano");
    assert_eq!(preset["category"], "piano");
    assert_eq!(
        preset["tags"],
        json!(["melodic", "piano", "gm:0", "sustained", "looped"])
    );
    assert_eq!(preset["metadata"]["gmProgram"], 0);
    assert_eq!(preset["metadata"]["gmCategory"], "piano");
    assert_eq!(preset["metadata"]["source"], "FluidR3_GM");
    assert_eq!(preset["metadata"]["variant"], 0);

    let node = &preset["node"];
    assert_eq!(node["type"], "sampler");
    assert_eq!(node["config"]["oneShot"], false);
    let zones = node["config"]["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0]["keyRange"], json!({"low": 21, "high": 108}));
    assert_eq!(zones[0]["pitch"], json!({"rootNote": 60, "fineTuneCents": 0}));
    assert_eq!(zones[0]["loop"], json!({"start": 10000, "end": 20000}));
    assert_eq!(zones[0]["audio"]["type"], "external");
    assert_eq!(zones[0]["audio"]["codec"], "mp3");
    assert_eq!(zones[0]["audio"]["url"], "zone_C4.mp3");
    assert_eq!(
        zones[0]["audio"]["sha256"],
        crate::audio::content_hash(&mp3_bytes(1), 16)
    );
    assert_eq!(
        fs::read(preset_dir.join("zone_C4.mp3")).unwrap(),
        mp3_bytes(1)
    );

    let library_index = read_json(&output.path().join("FluidR3_GM/index.json"));
    assert_eq!(library_index["format"], "songwalker-index");
    assert_eq!(library_index["name"], "FluidR3_GM");
    let entry = &library_index["entries"][0];
    assert_eq!(entry["type"], "preset");
    assert_eq!(
        entry["path"],
        "instruments/piano/Acoustic_Grand_Piano/preset.json"
    );
    assert_eq!(entry["zoneCount"], 1);
    assert_eq!(entry["keyRange"], json!({"low": 21, "high": 108}));
    assert_eq!(entry["gmProgram"], 0);

    let root_index = read_json(&output.path().join("index.json"));
    assert_eq!(root_index["entries"][0]["type"], "index");
    assert_eq!(root_index["entries"][0]["path"], "FluidR3_GM/index.json");
    assert_eq!(root_index["entries"][0]["presetCount"], 1);

    assert_index_paths_resolve(&output.path().join("index.json"));
    assert_index_paths_resolve(&output.path().join("FluidR3_GM/index.json"));
}

#[test]
fn test_identical_audio_is_stored_once() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    let shared = mp3_bytes(3);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[
            ZoneFixture::new(0, 59, 60).file(&shared),
            ZoneFixture::new(60, 127, 72).file(&shared),
        ],
    );
    write_melodic(
        source.path(),
        "0010_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&shared)],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.converted, 2);
    assert_eq!(report.zones, 3);
    assert_eq!(report.blobs_written, 1);
    assert_eq!(report.dedup_hits, 2);
    assert_eq!(count_files(output.path(), "mp3"), 1);

    let first = read_json(
        &output
            .path()
            .join("Lib/instruments/piano/Acoustic_Grand_Piano/preset.json"),
    );
    let first_zones = &first["node"]["config"]["zones"];
    assert_eq!(first_zones[0]["audio"]["url"], "zone_C4.mp3");
    assert_eq!(first_zones[1]["audio"]["url"], "zone_C4.mp3");

    let second_dir = output
        .path()
        .join("Lib/instruments/piano/Bright_Acoustic_Piano");
    let second = read_json(&second_dir.join("preset.json"));
    let url = second["node"]["config"]["zones"][0]["audio"]["url"]
        .as_str()
        .unwrap();
    assert_eq!(url, "../Acoustic_Grand_Piano/zone_C4.mp3");
    assert!(second_dir.join(url).is_file());
    assert_eq!(
        second["node"]["config"]["zones"][0]["audio"]["sha256"],
        first_zones[0]["audio"]["sha256"]
    );
}

#[test]
fn test_same_root_note_different_audio_gets_suffix() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[
            ZoneFixture::new(0, 63, 60).file(&mp3_bytes(1)),
            ZoneFixture::new(64, 127, 60).file(&mp3_bytes(2)),
            ZoneFixture::new(0, 127, 60).file(&ogg_bytes(2)),
        ],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.blobs_written, 3);

    let dir = output
        .path()
        .join("Lib/instruments/piano/Acoustic_Grand_Piano");
    assert!(dir.join("zone_C4.mp3").is_file());
    assert!(dir.join("zone_C4_2.mp3").is_file());
    assert!(dir.join("zone_C4.ogg").is_file());
    assert_eq!(fs::read(dir.join("zone_C4_2.mp3")).unwrap(), mp3_bytes(2));
}

#[test]
fn test_second_instrument_for_same_directory_never_overwrites() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    // Both names strip to library "Lib", program 0, variant 0.
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );
    write_melodic(
        source.path(),
        "0000_Lib_sf2_file.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(2))],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.converted, 1);
    assert_eq!(report.errors, 1);
    assert_eq!(report.blobs_written, 1);

    let dir = output
        .path()
        .join("Lib/instruments/piano/Acoustic_Grand_Piano");
    assert_eq!(fs::read(dir.join("zone_C4.mp3")).unwrap(), mp3_bytes(1));
    assert_eq!(count_files(output.path(), "mp3"), 1);
    let preset = read_json(&dir.join("preset.json"));
    assert_eq!(
        preset["node"]["config"]["zones"][0]["audio"]["sha256"],
        crate::audio::content_hash(&mp3_bytes(1), 16)
    );

    let index = read_json(&output.path().join("Lib/index.json"));
    assert_eq!(index["entries"].as_array().unwrap().len(), 1);
}

#[test]
fn test_percussion_channel_routes_to_percussion() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[
            ZoneFixture::new(35, 35, 35).file(&mp3_bytes(1)),
            ZoneFixture::new(36, 36, 36)
                .file(&mp3_bytes(2))
                .channel(128)
                .looped(0, 100),
        ],
    );

    convert(&options(source.path(), output.path())).unwrap();

    assert!(!output.path().join("Lib/instruments").exists());
    let preset = read_json(
        &output
            .path()
            .join("Lib/percussion/individual/Acoustic_Grand_Piano/preset.json"),
    );
    assert_eq!(preset["category"], "percussion");
    assert_eq!(preset["tags"], json!(["percussion", "midi:0"]));
    assert!(preset["metadata"].get("gmProgram").is_none());
    assert_eq!(preset["metadata"]["midiNote"], 0);

    let index = read_json(&output.path().join("Lib/index.json"));
    assert_eq!(
        index["entries"][0]["path"],
        "percussion/individual/Acoustic_Grand_Piano/preset.json"
    );
    assert_eq!(index["entries"][0]["tags"], json!(["percussion", "midi:0"]));
}

#[test]
fn test_percussion_directory() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_percussion(
        source.path(),
        "35_0_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(35, 35, 35).file(&mp3_bytes(1))],
    );
    write_percussion(
        source.path(),
        "12890_1_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(90, 90, 90).file(&mp3_bytes(2))],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.converted, 2);

    let kick = read_json(
        &output
            .path()
            .join("FluidR3_GM/percussion/individual/Acoustic_Bass_Drum/preset.json"),
    );
    assert_eq!(kick["name"], "Acoustic Bass Drum");
    assert_eq!(kick["tags"], json!(["percussion", "midi:35"]));
    assert_eq!(kick["node"]["config"]["oneShot"], true);
    assert_eq!(
        kick["node"]["config"]["zones"][0]["audio"]["url"],
        "zone_B1.mp3"
    );

    let other = read_json(
        &output
            .path()
            .join("FluidR3_GM/percussion/individual/Percussion_90_1/preset.json"),
    );
    assert_eq!(other["name"], "Percussion 90");
    assert_eq!(other["metadata"]["variant"], 1);
}

#[test]
fn test_instrument_without_audio_is_dropped() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[
            ZoneFixture::new(0, 127, 60),
            ZoneFixture::new(0, 127, 60).set("file", json!("")),
        ],
    );
    write_melodic(
        source.path(),
        "0010_Lib.json",
        &[
            ZoneFixture::new(0, 127, 60),
            ZoneFixture::new(10, 20, 62).file(&mp3_bytes(4)),
        ],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.converted, 1);
    assert_eq!(report.empty, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.zones, 1);

    assert!(!output
        .path()
        .join("Lib/instruments/piano/Acoustic_Grand_Piano")
        .exists());
    let index = read_json(&output.path().join("Lib/index.json"));
    let entries = index["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "Bright Acoustic Piano");
    assert_eq!(entries[0]["zoneCount"], 1);
    assert_eq!(entries[0]["keyRange"], json!({"low": 10, "high": 20}));
}

#[test]
fn test_skips_and_errors_do_not_abort() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "1280_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );
    write_melodic(
        source.path(),
        "readme.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );
    fs::write(source.path().join("i/0000_Lib.json"), "{ not json").unwrap();
    write_melodic(
        source.path(),
        "0010_Lib.json",
        &[ZoneFixture::new(0, 127, 60).set("file", json!("%%%"))],
    );
    write_melodic(
        source.path(),
        "0020_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );

    let report = convert(&options(source.path(), output.path())).unwrap();
    assert_eq!(report.skipped, 2);
    assert_eq!(report.errors, 2);
    assert_eq!(report.converted, 1);

    // A zone that failed to decode leaves nothing behind.
    assert!(!output
        .path()
        .join("Lib/instruments/piano/Bright_Acoustic_Piano")
        .exists());
    assert!(output
        .path()
        .join("Lib/instruments/piano/Electric_Grand_Piano/preset.json")
        .is_file());
}

#[test]
fn test_missing_name_table_is_fatal() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let target = output.path().join("out");
    fs::create_dir_all(source.path().join("i")).unwrap();
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );

    let result = convert(&options(source.path(), &target));
    assert!(matches!(result, Err(ConvertError::NameTable { .. })));
    assert!(!target.exists());

    fs::write(source.path().join("names.json"), "{ broken").unwrap();
    let result = convert(&options(source.path(), &target));
    assert!(matches!(result, Err(ConvertError::NameTable { .. })));
    assert!(!target.exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let target = output.path().join("out");
    write_dataset(source.path(), NAMES);
    let shared = mp3_bytes(5);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&shared)],
    );
    write_melodic(
        source.path(),
        "0010_Lib.json",
        &[ZoneFixture::new(0, 127, 60).file(&shared)],
    );

    let mut dry = options(source.path(), &target);
    dry.dry_run = true;
    let dry_report = convert(&dry).unwrap();
    assert!(!target.exists());

    let report = convert(&options(source.path(), &target)).unwrap();
    assert_eq!(dry_report, report);
    assert_eq!(report.dedup_hits, 1);
}

#[test]
fn test_limit_caps_conversions() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    for (i, file_name) in ["0000_Lib.json", "0010_Lib.json", "0020_Lib.json"]
        .iter()
        .enumerate()
    {
        write_melodic(
            source.path(),
            file_name,
            &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(i as u8 + 1))],
        );
    }

    let mut limited = options(source.path(), output.path());
    limited.limit = Some(2);
    let report = convert(&limited).unwrap();
    assert_eq!(report.converted, 2);

    let index = read_json(&output.path().join("Lib/index.json"));
    assert_eq!(index["entries"].as_array().unwrap().len(), 2);
}

#[test]
fn test_variants_and_libraries_keep_insertion_order() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Zeta_sf2_file.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );
    write_melodic(
        source.path(),
        "0001_Zeta_sf2_file.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(2))],
    );
    write_melodic(
        source.path(),
        "0010_Alpha_sf2_file.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(3))],
    );

    convert(&options(source.path(), output.path())).unwrap();

    let zeta = read_json(&output.path().join("Zeta/index.json"));
    assert_eq!(
        zeta["entries"][0]["path"],
        "instruments/piano/Acoustic_Grand_Piano/preset.json"
    );
    assert_eq!(
        zeta["entries"][1]["path"],
        "instruments/piano/Acoustic_Grand_Piano_1/preset.json"
    );

    let root = read_json(&output.path().join("index.json"));
    assert_eq!(root["entries"][0]["name"], "Zeta");
    assert_eq!(root["entries"][1]["name"], "Alpha");
    assert_eq!(
        root["entries"][1]["description"],
        "Instruments converted from the Alpha soundfont"
    );
    assert_index_paths_resolve(&output.path().join("index.json"));
    assert_index_paths_resolve(&output.path().join("Zeta/index.json"));
    assert_index_paths_resolve(&output.path().join("Alpha/index.json"));
}

#[test]
fn test_raw_pcm_is_wrapped_as_wav() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[ZoneFixture::new(0, 127, 69)
            .sample(&pcm_bytes(&[100, -100, 200]))
            .set("sampleRate", json!(22050))],
    );

    convert(&options(source.path(), output.path())).unwrap();

    let dir = output
        .path()
        .join("Lib/instruments/piano/Acoustic_Grand_Piano");
    let preset = read_json(&dir.join("preset.json"));
    let zone = &preset["node"]["config"]["zones"][0];
    assert_eq!(zone["audio"]["codec"], "wav");
    assert_eq!(zone["audio"]["url"], "zone_A4.wav");
    assert_eq!(zone["sampleRate"], 22050);

    let reader = hound::WavReader::open(dir.join("zone_A4.wav")).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    assert_eq!(reader.len(), 3);
}

#[test]
fn test_pitch_fields_and_license() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0000_Lib.json",
        &[ZoneFixture::new(0, 127, 60)
            .file(&mp3_bytes(1))
            .set("originalPitch", json!(6050))
            .set("coarseTune", json!(1))
            .set("fineTune", json!(20))],
    );
    let settings_path = source.path().join("settings.yaml");
    fs::write(&settings_path, "license:\n  lib: CC-BY 4.0\n").unwrap();

    let mut with_settings = options(source.path(), output.path());
    with_settings.settings = load_settings(Some(&settings_path)).unwrap();
    convert(&with_settings).unwrap();

    let preset = read_json(
        &output
            .path()
            .join("Lib/instruments/piano/Acoustic_Grand_Piano/preset.json"),
    );
    assert_eq!(preset["metadata"]["license"], "CC-BY 4.0");
    let zone = &preset["node"]["config"]["zones"][0];
    assert_eq!(zone["pitch"], json!({"rootNote": 59, "fineTuneCents": 30}));
    assert_eq!(zone["audio"]["url"], "zone_B3.mp3");
}

#[test]
fn test_missing_settings_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_settings(Some(&dir.path().join("nope.yaml"))),
        Err(ConvertError::Settings(_))
    ));
    assert!(load_settings(None).is_ok());
}

#[test]
fn test_indexer_reindexes_converted_tree() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_dataset(source.path(), NAMES);
    write_melodic(
        source.path(),
        "0010_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(0, 127, 60).file(&mp3_bytes(1))],
    );
    write_melodic(
        source.path(),
        "0000_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(21, 108, 60)
            .file(&mp3_bytes(2))
            .looped(1, 2)],
    );
    write_percussion(
        source.path(),
        "36_0_FluidR3_GM_sf2_file.json",
        &[ZoneFixture::new(36, 36, 36).file(&mp3_bytes(3))],
    );

    let converted = convert(&options(source.path(), output.path())).unwrap();
    let report = crate::indexer::run(output.path()).unwrap();
    assert_eq!(report.presets, converted.converted);
    assert_eq!(report.errors, 0);

    let index = read_json(&output.path().join("FluidR3_GM/index.json"));
    assert_eq!(index["name"], "FluidR3 GM");
    let entries = index["entries"].as_array().unwrap();
    let names: Vec<&str> = entries
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Bass Drum 1", "Acoustic Grand Piano", "Bright Acoustic Piano"]
    );
    assert_eq!(entries[1]["zoneCount"], 1);
    assert_eq!(entries[1]["keyRange"], json!({"low": 21, "high": 108}));
    assert_eq!(entries[1]["gmProgram"], 0);

    assert_index_paths_resolve(&output.path().join("index.json"));
    assert_index_paths_resolve(&output.path().join("FluidR3_GM/index.json"));
}
