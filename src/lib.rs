/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! oal is an object-oriented binding to OpenAL and its Effects Extension
//! (EFX).
//!
//! A [System] owns the OpenAL library, its devices and contexts, and every
//! object created through it: [Source]s, [Buffer]s, effects, effect slots and
//! filters. Objects are reference-counted handles that free their native
//! counterpart when the last handle goes away, or all at once when the
//! system shuts down.
//!
//! The native error state is checked after every call, so each operation
//! either succeeds or returns a [SoundError] naming the object involved.
//! The state of objects is mirrored on the Rust side, which is what the
//! getters return.

// The documentation for this crate is intended to include private items.
#![allow(rustdoc::private_intra_doc_links)]

#[macro_use]
mod log;
mod audio;
mod buffer;
pub mod effect;
mod effect_slot;
mod error;
pub mod filter;
mod listener;
mod object;
pub mod options;
mod param;
mod source;
mod system;
#[cfg(test)]
mod testing;

pub use audio::{AudioDescription, AudioFile, AudioFileError, AudioFormat, Decoder, PcmFormat};
pub use buffer::{
    Buffer, SoundFormat, FREQ_11KHZ, FREQ_16KHZ, FREQ_22KHZ, FREQ_32KHZ, FREQ_44KHZ, FREQ_48KHZ,
    FREQ_8KHZ,
};
pub use effect::{AnyEffect, Effect, EffectType};
pub use effect_slot::EffectSlot;
pub use error::SoundError;
pub use filter::{AnyFilter, Filter, FilterType};
pub use glam::Vec3;
pub use listener::Listener;
pub use object::ObjectKind;
pub use options::Options;
pub use source::{PlaybackState, Source, SourceListener};
pub use system::{ContextAttributes, DistanceModel, System, DEFAULT_NAME};

use std::path::PathBuf;
use std::time::Duration;

/// Current version, from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage:
    oal [options] path/to/sound.wav

Plays the sound file through OpenAL. WAV, CAF, MP3, AAC (in MP4), Ogg Vorbis
and FLAC files are supported.

Special options:
    --help
        Display this help text.

    --info
        Print information about the sound file without playing it.

    --devices
        List the available output and capture devices, and the properties of
        the default device.

    --options-file=...
        Apply options from a file. Each line may contain several options.
        Anything after a '#' is ignored. Options given directly on the command
        line take precedence.
";

/// Number of buffers in the queue when streaming.
const STREAM_BUFFER_COUNT: usize = 4;
/// Length of each streamed buffer, in frames.
const STREAM_BUFFER_FRAMES: usize = 8192;

fn apply_options(options: &mut Options, args: &[String], origin: &str) -> Result<(), String> {
    for arg in args {
        match options.parse_argument(arg) {
            Ok(true) => (),
            Ok(false) => return Err(format!("Unknown option {:?} in {}", arg, origin)),
            Err(err) => return Err(format!("Invalid option {:?} in {}: {}", arg, origin, err)),
        }
    }
    Ok(())
}

/// The entry point of the `oal` binary. `args` includes `argv[0]`.
pub fn main<T: Iterator<Item = String>>(mut args: T) -> Result<(), String> {
    log::init();
    echo!("oal {}", VERSION);

    let _ = args.next(); // skip argv[0]

    let mut file_path: Option<PathBuf> = None;
    let mut just_info = false;
    let mut list_devices = false;
    let mut options_files = Vec::new();
    let mut option_args = Vec::new();

    for arg in args {
        if arg == "--help" {
            echo!("{}", USAGE);
            echo!("{}", options::DOCUMENTATION);
            return Ok(());
        } else if arg == "--info" {
            just_info = true;
        } else if arg == "--devices" {
            list_devices = true;
        } else if let Some(path) = arg.strip_prefix("--options-file=") {
            options_files.push(PathBuf::from(path));
        // Parse an option but discard the value, to test whether it's valid.
        // We don't want to apply it immediately, because then options loaded
        // from a file would take precedence over options from the command line.
        } else if Options::default().parse_argument(&arg)? {
            option_args.push(arg);
        } else if file_path.is_none() && !arg.starts_with("--") {
            file_path = Some(PathBuf::from(arg));
        } else {
            echo!("{}", USAGE);
            return Err(format!("Unexpected argument: {:?}", arg));
        }
    }

    let mut options = Options::default();
    for path in &options_files {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Could not open {}: {}", path.display(), e))?;
        let file_args = options::get_options_from_file(file)
            .map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
        echo!("Using options from {}: {}", path.display(), file_args.join(" "));
        apply_options(&mut options, &file_args, &path.display().to_string())?;
    }
    apply_options(&mut options, &option_args, "the command line")?;

    if list_devices {
        print_devices(&options)?;
        if file_path.is_none() {
            return Ok(());
        }
    }

    let Some(file_path) = file_path else {
        echo!("{}", USAGE);
        return Err("Path to a sound file must be specified".to_string());
    };

    let file = AudioFile::open(&file_path).map_err(|e| e.to_string())?;
    print_file_info(&file);
    if just_info {
        return Ok(());
    }

    play(&file, &options).map_err(|e| format!("Playback failed: {}", e))
}

fn print_file_info(file: &AudioFile) {
    let description = file.description();
    echo!("Sound file info:");
    echo!("- Name: {}", file.name());
    echo!("- Encoding: {}", match &description.format {
        AudioFormat::LinearPcm { is_float: true, .. } => "linear PCM (float)".to_string(),
        AudioFormat::LinearPcm { is_float: false, .. } => "linear PCM (integer)".to_string(),
        AudioFormat::AppleIma4 => "Apple IMA4 ADPCM".to_string(),
        AudioFormat::Compressed(codec) => codec.to_string(),
    });
    echo!("- Sample rate: {} Hz", description.sample_rate);
    echo!("- Channels: {}", description.channels_per_frame);
    if description.bits_per_channel != 0 {
        echo!("- Bits per channel: {}", description.bits_per_channel);
    }
    echo!();
}

fn print_devices(options: &Options) -> Result<(), String> {
    let system = System::new(options).map_err(|e| e.to_string())?;
    echo!("Output devices:");
    let default_name = system.default_device_name();
    for name in system.device_names() {
        let marker = if Some(&name) == default_name.as_ref() {
            " (default)"
        } else {
            ""
        };
        echo!("- {}{}", name, marker);
    }
    echo!("Capture devices:");
    for name in system.capture_device_names() {
        echo!("- {}", name);
    }
    echo!();

    let describe = |result: Result<String, SoundError>| result.unwrap_or_else(|e| e.to_string());
    echo!("Opened device: {}", system.current_device_name().unwrap_or_default());
    echo!("- Vendor: {}", describe(system.vendor_name()));
    echo!("- Renderer: {}", describe(system.renderer_name()));
    echo!("- Version: {}", describe(system.version_name()));
    if system.is_efx_available() {
        echo!(
            "- EFX: available, {} auxiliary send(s) per source",
            system.max_auxiliary_sends().map_err(|e| e.to_string())?
        );
    } else {
        echo!("- EFX: not available");
    }
    echo!(
        "- Extensions: {}",
        system.extensions().map_err(|e| e.to_string())?.join(" ")
    );
    echo!();
    Ok(())
}

fn play(file: &AudioFile, options: &Options) -> Result<(), SoundError> {
    let system = System::new(options)?;
    let source = system.create_source(false)?;
    source.set_gain(options.gain)?;
    source.set_pitch(options.pitch)?;

    // The effect objects have to outlive playback. Attaching only copies
    // their parameters, but the slot must stay allocated.
    let mut _effects = None;
    if let Some(decay_time) = options.reverb {
        let reverb = system.create_reverb()?;
        reverb.set_decay_time(decay_time)?;
        let slot = system.create_effect_slot()?;
        slot.set_effect(Some(reverb.as_ref()))?;
        source.set_effect_slot(0, Some(&slot), None)?;
        _effects = Some((reverb, slot));
    }
    let mut _filter = None;
    if let Some(gain_hf) = options.low_pass {
        let low_pass = system.create_low_pass()?;
        low_pass.set_gain_hf(gain_hf)?;
        source.set_dry_filter(Some(low_pass.as_ref()))?;
        _filter = Some(low_pass);
    }

    if options.stream {
        stream(&system, &source, file, options.looping)?;
    } else {
        let buffer = system.create_buffer_from_decoder(&mut file.decoder()?)?;
        source.set_looping(options.looping)?;
        source.set_buffer(Some(&buffer))?;
        echo!("Playing {}", file.name());
        source.play()?;
        source.wait_for_end()?;
    }
    echo!("Finished playing {}", file.name());
    Ok(())
}

/// Decode the next piece of the file into `buffer`. Returns `false` if there
/// was nothing left to decode.
fn fill_buffer(
    buffer: &Buffer,
    decoder: &mut Decoder,
    chunk: &mut [u8],
) -> Result<bool, SoundError> {
    let read = decoder.read_pcm_bytes(chunk)?;
    if read == 0 {
        return Ok(false);
    }
    let format = decoder.pcm_format();
    buffer.set_format_by_channels_and_bits(format.channels, format.bits)?;
    buffer.set_frequency(format.sample_rate);
    buffer.load_pcm_data(&chunk[..read])?;
    Ok(true)
}

/// Play the file through a small queue of buffers that are refilled as the
/// source finishes with them.
fn stream(
    system: &System,
    source: &Source,
    file: &AudioFile,
    looping: bool,
) -> Result<(), SoundError> {
    let mut decoder = file.decoder()?;
    let mut chunk = vec![0u8; STREAM_BUFFER_FRAMES * decoder.pcm_format().frame_size()];

    // Returns false once the file is exhausted (and not looping).
    let mut refill = |buffer: &Buffer, decoder: &mut Decoder| -> Result<bool, SoundError> {
        if fill_buffer(buffer, decoder, &mut chunk)? {
            return Ok(true);
        }
        if looping {
            *decoder = file.decoder()?;
            return fill_buffer(buffer, decoder, &mut chunk);
        }
        Ok(false)
    };

    let mut exhausted = false;
    for buffer in system.create_buffers(STREAM_BUFFER_COUNT)? {
        if !refill(&buffer, &mut decoder)? {
            exhausted = true;
            break;
        }
        source.enqueue_buffer(&buffer)?;
    }

    echo!("Streaming {}", file.name());
    source.play()?;
    while source.queued_buffer_count()? > 0 {
        std::thread::sleep(Duration::from_millis(10));
        for buffer in source.dequeue_processed_buffers()? {
            if !exhausted && refill(&buffer, &mut decoder)? {
                source.enqueue_buffer(&buffer)?;
            } else {
                exhausted = true;
            }
        }
        // An underrun stops the source even though buffers are queued.
        if source.is_stopped()? && source.queued_buffer_count()? > source.processed_buffer_count()? {
            log_dbg!("Stream underrun, restarting {}", source);
            source.play()?;
        }
    }
    Ok(())
}
