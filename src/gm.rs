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

//! General MIDI lookup tables: instrument families, percussion key names and
//! note spelling.

/// Category used for every percussion instrument.
pub const PERCUSSION_CATEGORY: &str = "percussion";

/// Category used when a program has no family.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Number of programs in each General MIDI instrument family.
const PROGRAMS_PER_FAMILY: u8 = 8;

/// The 16 General MIDI instrument families, in program order.
const FAMILIES: [&str; 16] = [
    "piano",
    "chromatic-percussion",
    "organ",
    "guitar",
    "bass",
    "strings",
    "ensemble",
    "brass",
    "reed",
    "pipe",
    "synth-lead",
    "synth-pad",
    "synth-effects",
    "ethnic",
    "percussive",
    "sound-effects",
];

/// General MIDI percussion key map, starting at note 35.
const PERCUSSION_KEYS_START: u8 = 35;
const PERCUSSION_KEYS: [&str; 47] = [
    "Acoustic Bass Drum",
    "Bass Drum 1",
    "Side Stick",
    "Acoustic Snare",
    "Hand Clap",
    "Electric Snare",
    "Low Floor Tom",
    "Closed Hi-Hat",
    "High Floor Tom",
    "Pedal Hi-Hat",
    "Low Tom",
    "Open Hi-Hat",
    "Low-Mid Tom",
    "Hi-Mid Tom",
    "Crash Cymbal 1",
    "High Tom",
    "Ride Cymbal 1",
    "Chinese Cymbal",
    "Ride Bell",
    "Tambourine",
    "Splash Cymbal",
    "Cowbell",
    "Crash Cymbal 2",
    "Vibraslap",
    "Ride Cymbal 2",
    "Hi Bongo",
    "Low Bongo",
    "Mute Hi Conga",
    "Open Hi Conga",
    "Low Conga",
    "High Timbale",
    "Low Timbale",
    "High Agogo",
    "Low Agogo",
    "Cabasa",
    "Maracas",
    "Short Whistle",
    "Long Whistle",
    "Short Guiro",
    "Long Guiro",
    "Claves",
    "Hi Wood Block",
    "Low Wood Block",
    "Mute Cuica",
    "Open Cuica",
    "Mute Triangle",
    "Open Triangle",
];

/// Note names spelled with flats.
const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Returns the instrument family for a General MIDI program, or "unknown" when
/// the program is outside 0..=127.
pub fn category_for_program(program: u8) -> &'static str {
    FAMILIES
        .get(usize::from(program / PROGRAMS_PER_FAMILY))
        .copied()
        .unwrap_or(UNKNOWN_CATEGORY)
}

/// Returns the General MIDI percussion name for a note, if it has one.
pub fn percussion_key_name(note: u8) -> Option<&'static str> {
    note.checked_sub(PERCUSSION_KEYS_START)
        .and_then(|offset| PERCUSSION_KEYS.get(usize::from(offset)))
        .copied()
}

/// Spells a MIDI note with flats, e.g. 60 => "C4", 61 => "Db4", 0 => "C-1".
pub fn note_name(note: u8) -> String {
    let octave = i32::from(note / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(note % 12)], octave)
}

/// A root note and cents offset derived from raw soundfont pitch fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootPitch {
    pub root_note: u8,
    pub fine_tune_cents: i32,
}

impl RootPitch {
    /// Derives the root pitch from the combined detune in cents
    /// (original pitch minus the coarse and fine tuning).
    ///
    /// The root note is floored and clamped to the MIDI range. The cents keep
    /// the remainder's sign, so a negative detune yields negative cents.
    pub fn from_detune(base_detune: i64) -> RootPitch {
        let root = base_detune.div_euclid(100).clamp(0, 127);
        RootPitch {
            root_note: root as u8,
            fine_tune_cents: (base_detune % 100) as i32,
        }
    }

    /// Derives the root pitch from the raw descriptor fields.
    pub fn from_raw(original_pitch: f64, coarse_tune: f64, fine_tune: f64) -> RootPitch {
        let base_detune = (original_pitch - 100.0 * coarse_tune - fine_tune).round() as i64;
        RootPitch::from_detune(base_detune)
    }

    /// Reconstructs the detune in cents this pitch represents.
    pub fn detune(&self) -> i64 {
        i64::from(self.root_note) * 100 + i64::from(self.fine_tune_cents)
    }
}
