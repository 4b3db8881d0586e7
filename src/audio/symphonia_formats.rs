/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Streaming decoding of compressed formats (MP3, AAC, Vorbis, FLAC) to
//! linear PCM.
//!
//! This should be the only module that makes use of [symphonia]. For AAC, only
//! the LC profile and MPEG-4 container format are supported (see feature list
//! in Cargo.toml).

use super::{AudioDescription, AudioFormat};
use std::path::Path;
use symphonia::core::audio::{Channels, RawSampleBuffer, SignalSpec};
use symphonia::core::codecs::{self, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatReader;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::probe::Hint;

/// One audio track of a file, decoded a packet at a time.
pub struct SymphoniaStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn codecs::Decoder>,
    track_id: u32,
    codec_name: &'static str,
    bits_per_sample: u32,
    spec: SignalSpec,
    sample_buf: Option<RawSampleBuffer<i16>>,
    /// The first packet is decoded when opening, to learn the signal spec.
    first_packet: Option<Vec<u8>>,
}

impl SymphoniaStream {
    pub fn open<R: MediaSource + 'static>(name: &str, source: R) -> Result<Self, String> {
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = Path::new(name).extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        // If this failed, the container format is not supported.
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &Default::default(), &Default::default())
            .map_err(|err| err.to_string())?;

        let format = probed.format;
        let track = format
            .default_track()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                format
                    .tracks()
                    .iter()
                    .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or_else(|| "no audio track".to_string())?;
        let track_id = track.id;
        let codec_name = symphonia::default::get_codecs()
            .get_codec(track.codec_params.codec)
            .map_or("unknown", |descriptor| descriptor.short_name);
        let bits_per_sample = track.codec_params.bits_per_sample.unwrap_or(0);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &Default::default())
            .map_err(|err| err.to_string())?;

        let mut stream = SymphoniaStream {
            format,
            decoder,
            track_id,
            codec_name,
            bits_per_sample,
            spec: SignalSpec::new(0, Channels::empty()),
            sample_buf: None,
            first_packet: None,
        };
        let mut first_packet = Vec::new();
        if !stream.decode_next(&mut first_packet)? {
            return Err("no decodable packets".to_string());
        }
        stream.first_packet = Some(first_packet);
        Ok(stream)
    }

    pub fn description(&self) -> AudioDescription {
        AudioDescription {
            sample_rate: self.spec.rate.into(),
            format: AudioFormat::Compressed(self.codec_name),
            bytes_per_packet: 0,
            frames_per_packet: 0,
            channels_per_frame: self.spec.channels.count() as u32,
            bits_per_channel: self.bits_per_sample,
        }
    }

    /// Append one packet's worth of 16-bit native-endian PCM to `out`.
    /// Returns `false` at the end of the stream.
    pub fn decode_packet(&mut self, out: &mut Vec<u8>) -> Result<bool, String> {
        if let Some(mut first_packet) = self.first_packet.take() {
            out.append(&mut first_packet);
            return Ok(true);
        }
        self.decode_next(out)
    }

    fn decode_next(&mut self, out: &mut Vec<u8>) -> Result<bool, String> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                // Assume I/O errors can only mean end-of-file, because the
                // entire file is in-memory.
                Err(Error::IoError(_)) | Err(Error::ResetRequired) => return Ok(false),
                Err(err) => return Err(err.to_string()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt packet is skipped, not fatal.
                Err(Error::DecodeError(err)) => {
                    log_dbg!("Skipping undecodable packet: {}", err);
                    continue;
                }
                Err(err) => return Err(err.to_string()),
            };

            // The "signal spec" (number of channels etc) is reported
            // per-packet, but it must be the same for all of them.
            self.spec = *decoded.spec();
            let capacity = decoded.capacity();
            let spec = self.spec;
            if self
                .sample_buf
                .as_ref()
                .is_some_and(|buf| buf.capacity() < capacity)
            {
                self.sample_buf = None;
            }
            let sample_buf = self
                .sample_buf
                .get_or_insert_with(|| RawSampleBuffer::new(capacity as u64, spec));
            sample_buf.clear();
            sample_buf.copy_interleaved_ref(decoded);
            out.extend_from_slice(sample_buf.as_bytes());
            return Ok(true);
        }
    }
}
