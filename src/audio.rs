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

//! Embedded audio payloads: decoding, content hashing and codec detection.

use std::fmt;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hound::{SampleFormat, WavSpec, WavWriter};
use sha2::{Digest, Sha256};

/// The container an audio blob is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Mp3,
    Ogg,
    /// Raw 16-bit PCM, stored wrapped in a WAV container.
    Wav,
}

impl Codec {
    /// Detects the codec from the leading bytes. Anything that isn't an MP3
    /// (ID3 tag or MPEG frame sync) or an Ogg page is raw PCM.
    pub fn sniff(bytes: &[u8]) -> Codec {
        match bytes {
            [b'I', b'D', b'3', ..] => Codec::Mp3,
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Codec::Mp3,
            [b'O', b'g', b'g', b'S', ..] => Codec::Ogg,
            _ => Codec::Wav,
        }
    }

    /// The codec name written to preset documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Mp3 => "mp3",
            Codec::Ogg => "ogg",
            Codec::Wav => "wav",
        }
    }

    /// The file extension for stored blobs.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("WAV wrapping failed: {0}")]
    Wav(#[from] hound::Error),
}

/// A decoded audio payload, ready to be stored.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    /// Truncated hex SHA-256 of the decoded payload bytes.
    hash: String,
    codec: Codec,
    /// The bytes to write to disk.
    contents: Vec<u8>,
}

impl AudioPayload {
    /// Decodes a base64 payload, hashes it and prepares the stored bytes.
    /// Raw PCM is wrapped in a mono WAV container at the given sample rate.
    pub fn decode(
        encoded: &str,
        sample_rate: u32,
        hash_length: usize,
    ) -> Result<AudioPayload, PayloadError> {
        let cleaned: String = encoded.split_whitespace().collect();
        let bytes = STANDARD.decode(cleaned.as_bytes())?;
        let hash = content_hash(&bytes, hash_length);
        let codec = Codec::sniff(&bytes);
        let contents = match codec {
            Codec::Wav => pcm16_to_wav(&bytes, sample_rate)?,
            Codec::Mp3 | Codec::Ogg => bytes,
        };

        Ok(AudioPayload {
            hash,
            codec,
            contents,
        })
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

/// Hex SHA-256 of the data, truncated to `length` characters.
pub fn content_hash(data: &[u8], length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(length);
    hash
}

/// Wraps little-endian 16-bit mono PCM in a WAV container. A trailing odd byte
/// is dropped.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for frame in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([frame[0], frame[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
