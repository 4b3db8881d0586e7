/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Audio file decoding and OpenAL bindings.
//!
//! The audio file decoding support is an abstraction over various libraries
//! (currently [caf], [hound], and [symphonia]), usage of which should be
//! confined to this module. Everything is decoded to the PCM layouts OpenAL
//! accepts: unsigned 8-bit if the file is 8-bit, otherwise signed 16-bit in
//! native byte order.
//!
//! Resources:
//! - [Apple Core Audio Format Specification 1.0](https://developer.apple.com/library/archive/documentation/MusicAudio/Reference/CAFSpec/CAF_intro/CAF_intro.html)

mod ima4;
pub mod openal;
mod symphonia_formats;

use ima4::decode_ima4;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symphonia_formats::SymphoniaStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioFileError {
    #[error("couldn't read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0:?} is not in a recognized audio format")]
    UnrecognizedFormat(String),
    #[error("{name:?} uses an unsupported encoding: {detail}")]
    UnsupportedEncoding { name: String, detail: String },
    #[error("couldn't decode {name:?}: {detail}")]
    Decode { name: String, detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioFormat {
    LinearPcm {
        is_float: bool,
        is_little_endian: bool,
    },
    AppleIma4,
    /// Anything decoded by symphonia, named by its codec.
    Compressed(&'static str),
}

/// Fields have the same meanings as in the Core Audio Format's
/// Audio Description chunk, which is in turn similar to Core Audio Types'
/// `AudioStreamBasicDescription`. Zero means unknown or variable.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDescription {
    /// Hz
    pub sample_rate: f64,
    pub format: AudioFormat,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
}

/// The PCM layout a [Decoder] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u32,
    /// 8 (unsigned) or 16 (signed, native-endian).
    pub bits: u32,
}

impl PcmFormat {
    pub fn frame_size(&self) -> usize {
        (self.channels * self.bits / 8) as usize
    }
}

/// The file contents, shared between an [AudioFile] and its decoders.
#[derive(Clone)]
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

type Reader = Cursor<SharedBytes>;

#[derive(Clone, Copy)]
enum Container {
    Wave,
    Caf,
    Symphonia,
}

/// An audio file held in memory, whose format has been recognized.
pub struct AudioFile {
    name: String,
    bytes: SharedBytes,
    container: Container,
    description: AudioDescription,
}

impl AudioFile {
    pub fn open(path: &Path) -> Result<AudioFile, AudioFileError> {
        let bytes = std::fs::read(path).map_err(|source| AudioFileError::Io {
            path: path.to_owned(),
            source,
        })?;
        AudioFile::from_bytes(&path.display().to_string(), bytes)
    }

    /// Recognize the format of `bytes`. `name` is used in error messages, and
    /// its extension (if any) as a hint for the compressed formats.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<AudioFile, AudioFileError> {
        let bytes = SharedBytes(bytes.into());
        let name = name.to_string();

        // Both WavReader::new() and CafPacketReader::new() consume the reader
        // passed to them, so a cheap clone of the bytes is used for sniffing
        // and the decoder recreates the reader later.
        let (container, description) =
            if let Ok(reader) = hound::WavReader::new(Cursor::new(bytes.clone())) {
                (Container::Wave, wave_description(&name, reader.spec())?)
            } else if let Ok(reader) = caf::CafPacketReader::new(Cursor::new(bytes.clone()), vec![])
            {
                (Container::Caf, caf_description(&name, &reader.audio_desc)?)
            } else if let Ok(stream) = SymphoniaStream::open(&name, Cursor::new(bytes.clone())) {
                (Container::Symphonia, stream.description())
            } else {
                log_dbg!("Could not recognize audio file {:?}", name);
                return Err(AudioFileError::UnrecognizedFormat(name));
            };

        Ok(AudioFile {
            name,
            bytes,
            container,
            description,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format of the data in the file, before decoding.
    pub fn description(&self) -> &AudioDescription {
        &self.description
    }

    /// Start decoding the file from the beginning.
    pub fn decoder(&self) -> Result<Decoder, AudioFileError> {
        let decode_error = |detail: String| AudioFileError::Decode {
            name: self.name.clone(),
            detail,
        };
        let reader = Cursor::new(self.bytes.clone());
        let source = match self.container {
            Container::Wave => {
                let reader =
                    hound::WavReader::new(reader).map_err(|err| decode_error(err.to_string()))?;
                DecoderSource::Wave(reader)
            }
            Container::Caf => {
                let reader = caf::CafPacketReader::new(reader, vec![])
                    .map_err(|err| decode_error(format!("{:?}", err)))?;
                if self.description.format == AudioFormat::AppleIma4 {
                    DecoderSource::CafIma4 {
                        reader,
                        channels: self.description.channels_per_frame as usize,
                    }
                } else {
                    DecoderSource::CafPcm(reader)
                }
            }
            Container::Symphonia => DecoderSource::Symphonia(
                SymphoniaStream::open(&self.name, reader).map_err(decode_error)?,
            ),
        };

        let description = &self.description;
        let format = PcmFormat {
            sample_rate: description.sample_rate.round() as u32,
            channels: description.channels_per_frame,
            bits: match (&description.format, description.bits_per_channel) {
                (AudioFormat::LinearPcm { is_float: false, .. }, 8) => 8,
                _ => 16,
            },
        };
        Ok(Decoder {
            name: self.name.clone(),
            format,
            description: description.clone(),
            source,
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
        })
    }
}

fn wave_description(name: &str, spec: hound::WavSpec) -> Result<AudioDescription, AudioFileError> {
    let hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format,
    } = spec;
    let supported = match sample_format {
        hound::SampleFormat::Int => matches!(bits_per_sample, 8 | 16 | 24 | 32),
        hound::SampleFormat::Float => bits_per_sample == 32,
    };
    if !supported || channels == 0 {
        return Err(AudioFileError::UnsupportedEncoding {
            name: name.to_string(),
            detail: format!("{}-bit {:?} WAV", bits_per_sample, sample_format),
        });
    }
    Ok(AudioDescription {
        sample_rate: sample_rate.into(),
        format: AudioFormat::LinearPcm {
            is_float: sample_format == hound::SampleFormat::Float,
            is_little_endian: true,
        },
        bytes_per_packet: u32::from(channels) * u32::from(bits_per_sample) / 8,
        frames_per_packet: 1,
        channels_per_frame: channels.into(),
        bits_per_channel: bits_per_sample.into(),
    })
}

fn caf_description(
    name: &str,
    desc: &caf::chunks::AudioDescription,
) -> Result<AudioDescription, AudioFileError> {
    let caf::chunks::AudioDescription {
        sample_rate,
        ref format_id,
        format_flags,
        bytes_per_packet,
        frames_per_packet,
        channels_per_frame,
        bits_per_channel,
    } = *desc;
    let unsupported = |detail: String| AudioFileError::UnsupportedEncoding {
        name: name.to_string(),
        detail,
    };

    let format = match format_id {
        caf::FormatType::LinearPcm if format_flags & !3 == 0 => {
            let is_float = (format_flags & 1) == 1;
            let supported = if is_float {
                matches!(bits_per_channel, 32 | 64)
            } else {
                matches!(bits_per_channel, 8 | 16 | 24 | 32)
            };
            if !supported {
                return Err(unsupported(format!(
                    "{}-bit linear PCM",
                    bits_per_channel
                )));
            }
            AudioFormat::LinearPcm {
                is_float,
                is_little_endian: (format_flags & 2) == 2,
            }
        }
        caf::FormatType::AppleIma4 if format_flags == 0 => AudioFormat::AppleIma4,
        _ => {
            return Err(unsupported(format!(
                "{:?} with flags {:#x}",
                format_id, format_flags
            )))
        }
    };
    if channels_per_frame == 0 || bytes_per_packet == 0 {
        return Err(unsupported("variable packet size".to_string()));
    }
    if format == AudioFormat::AppleIma4 && bytes_per_packet != 34 * channels_per_frame {
        return Err(unsupported(format!(
            "IMA4 with {} bytes per packet",
            bytes_per_packet
        )));
    }
    Ok(AudioDescription {
        sample_rate,
        format,
        bytes_per_packet,
        frames_per_packet,
        channels_per_frame,
        bits_per_channel,
    })
}

/// How many samples (or packets) each backend decodes at once.
const WAVE_CHUNK_SAMPLES: usize = 4096;
const CAF_CHUNK_PACKETS: usize = 256;

enum DecoderSource {
    Wave(hound::WavReader<Reader>),
    CafPcm(caf::CafPacketReader<Reader>),
    CafIma4 {
        reader: caf::CafPacketReader<Reader>,
        channels: usize,
    },
    Symphonia(SymphoniaStream),
}

/// Streams the PCM data of an [AudioFile].
pub struct Decoder {
    name: String,
    format: PcmFormat,
    description: AudioDescription,
    source: DecoderSource,
    pending: Vec<u8>,
    pending_pos: usize,
    finished: bool,
}

impl Decoder {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The layout of the bytes [Self::read_pcm_bytes] produces.
    pub fn pcm_format(&self) -> PcmFormat {
        self.format
    }

    /// Fill `buf` with PCM data. Less than `buf.len()` bytes are only written
    /// when the stream ends; 0 means it has already ended.
    pub fn read_pcm_bytes(&mut self, buf: &mut [u8]) -> Result<usize, AudioFileError> {
        let mut written = 0;
        while written < buf.len() {
            if self.pending_pos == self.pending.len() {
                if self.finished {
                    break;
                }
                self.pending.clear();
                self.pending_pos = 0;
                self.finished = !self.decode_chunk()?;
                continue;
            }
            let count = (buf.len() - written).min(self.pending.len() - self.pending_pos);
            buf[written..][..count].copy_from_slice(&self.pending[self.pending_pos..][..count]);
            written += count;
            self.pending_pos += count;
        }
        Ok(written)
    }

    /// Decode everything that is left.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, AudioFileError> {
        let mut data = self.pending.split_off(self.pending_pos);
        self.pending.clear();
        self.pending_pos = 0;
        while !self.finished {
            self.finished = !self.decode_chunk()?;
            data.append(&mut self.pending);
        }
        Ok(data)
    }

    /// Append the next chunk of PCM to `self.pending`. Returns `false` at the
    /// end of the stream.
    fn decode_chunk(&mut self) -> Result<bool, AudioFileError> {
        let out = &mut self.pending;
        let result = match &mut self.source {
            DecoderSource::Wave(reader) => decode_wave_chunk(reader, self.format.bits == 8, out),
            DecoderSource::CafPcm(reader) => decode_caf_pcm_chunk(reader, &self.description, out),
            DecoderSource::CafIma4 { reader, channels } => {
                decode_caf_ima4_chunk(reader, *channels, out)
            }
            DecoderSource::Symphonia(stream) => stream.decode_packet(out),
        };
        result.map_err(|detail| AudioFileError::Decode {
            name: self.name.clone(),
            detail,
        })
    }
}

fn push_i16(out: &mut Vec<u8>, sample: i16) {
    out.extend_from_slice(&sample.to_ne_bytes());
}

fn float_to_i16(sample: f64) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

fn decode_wave_chunk(
    reader: &mut hound::WavReader<Reader>,
    eight_bit: bool,
    out: &mut Vec<u8>,
) -> Result<bool, String> {
    let spec = reader.spec();
    let mut count = 0;
    match spec.sample_format {
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>().take(WAVE_CHUNK_SAMPLES) {
                let sample = sample.map_err(|err| err.to_string())?;
                push_i16(out, float_to_i16(sample.into()));
                count += 1;
            }
        }
        hound::SampleFormat::Int => {
            for sample in reader.samples::<i32>().take(WAVE_CHUNK_SAMPLES) {
                let sample = sample.map_err(|err| err.to_string())?;
                if eight_bit {
                    // From the OpenAL docs: 8-bit PCM data is expressed as an
                    // unsigned value over the range 0 to 255, 128 being an
                    // audio output level of zero. hound gives signed samples.
                    out.push((sample + 128) as u8);
                } else {
                    push_i16(out, (sample >> (spec.bits_per_sample - 16)) as i16);
                }
                count += 1;
            }
        }
    }
    Ok(count == WAVE_CHUNK_SAMPLES)
}

/// Convert one linear PCM packet (a frame) of a CAF file.
fn convert_caf_pcm(packet: &[u8], description: &AudioDescription, out: &mut Vec<u8>) {
    let AudioFormat::LinearPcm {
        is_float,
        is_little_endian,
    } = description.format
    else {
        return;
    };
    let sample_size = (description.bits_per_channel / 8) as usize;
    for sample in packet.chunks_exact(sample_size) {
        match (is_float, sample_size) {
            (true, 4) => {
                let bytes = [sample[0], sample[1], sample[2], sample[3]];
                let value = if is_little_endian {
                    f32::from_le_bytes(bytes)
                } else {
                    f32::from_be_bytes(bytes)
                };
                push_i16(out, float_to_i16(value.into()));
            }
            (true, _) => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(sample);
                let value = if is_little_endian {
                    f64::from_le_bytes(bytes)
                } else {
                    f64::from_be_bytes(bytes)
                };
                push_i16(out, float_to_i16(value));
            }
            // 8-bit CAF samples are signed.
            (false, 1) => out.push((i16::from(sample[0] as i8) + 128) as u8),
            // Wider samples keep their two most significant bytes.
            (false, size) => {
                let value = if is_little_endian {
                    i16::from_le_bytes([sample[size - 2], sample[size - 1]])
                } else {
                    i16::from_be_bytes([sample[0], sample[1]])
                };
                push_i16(out, value);
            }
        }
    }
}

fn decode_caf_pcm_chunk(
    reader: &mut caf::CafPacketReader<Reader>,
    description: &AudioDescription,
    out: &mut Vec<u8>,
) -> Result<bool, String> {
    let mut packet = Vec::new();
    for _ in 0..CAF_CHUNK_PACKETS {
        let Some(size) = reader.next_packet_size() else {
            return Ok(false);
        };
        packet.resize(size, 0);
        reader
            .read_packet_into(&mut packet)
            .map_err(|err| format!("{:?}", err))?;
        convert_caf_pcm(&packet, description, out);
    }
    Ok(true)
}

fn decode_caf_ima4_chunk(
    reader: &mut caf::CafPacketReader<Reader>,
    channels: usize,
    out: &mut Vec<u8>,
) -> Result<bool, String> {
    let mut packet = vec![0u8; 34 * channels];
    for _ in 0..CAF_CHUNK_PACKETS {
        if reader.next_packet_size().is_none() {
            return Ok(false);
        }
        reader
            .read_packet_into(&mut packet)
            .map_err(|err| format!("{:?}", err))?;

        // Each packet holds one 34-byte IMA4 block per channel, in channel
        // order. The decoded blocks are interleaved into frames.
        let decoded: Vec<[i16; 64]> = packet
            .chunks_exact(34)
            .map(|block| {
                let mut array = [0u8; 34];
                array.copy_from_slice(block);
                decode_ima4(&array)
            })
            .collect();
        for frame in 0..64 {
            for channel in &decoded {
                push_i16(out, channel[frame]);
            }
        }
    }
    Ok(true)
}
