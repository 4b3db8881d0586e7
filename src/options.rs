/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Parsing and management of user-configurable options, e.g. the device to
//! open or the context attributes to request.

use crate::system::DistanceModel;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

pub const DOCUMENTATION: &str = "\
Device and context options:
    --library=...
        Path to the OpenAL shared library to load. By default, the platform's
        usual library names are tried (e.g. libopenal.so.1 on Linux).

    --device=...
        Name of the output device to open, as listed by --devices. The
        default is the system's default device.

    --frequency=...
    --refresh=...
        Mixing frequency and refresh rate to request for the context, in Hz.
        By default the driver chooses.

    --sync
        Request a synchronous context.

    --mono-sources=...
    --stereo-sources=...
        Hints for how many mono and stereo sources the context should be able
        to play at once.

    --aux-sends=...
        Number of auxiliary effect sends per source. The default is 2. The
        driver may provide fewer.

        This is a natural number, at most 16.

Global state options:
    --distance-model=...
        How a source's gain falls off with distance. One of none, inverse,
        inverse-clamped, linear, linear-clamped, exponent and
        exponent-clamped. The default is inverse-clamped.

    --doppler-factor=...
        Exaggerates (above 1) or reduces (below 1) the doppler effect.
        This is a floating-point (decimal) number, at least 0.

    --speed-of-sound=...
        Speed of sound in world units per second. The default is 343.3.
        This is a floating-point (decimal) number greater than 0.

Playback options:
    --gain=...
        Volume of the played sound, at least 0. The default is 1.

    --pitch=...
        Pitch multiplier of the played sound, greater than 0. The default
        is 1.

    --loop
        Keep playing the sound until interrupted.

    --stream
        Stream the file through a queue of small buffers rather than loading
        it into a single buffer.

    --reverb=...
        Send the sound through a reverb with the given decay time in seconds
        (0.1 to 20). Requires the EFX extension.

    --low-pass=...
        Apply a low-pass filter with the given high-frequency gain (0 to 1)
        to the direct path. Requires the EFX extension.
";

/// Struct containing all user-configurable options.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub library: Option<PathBuf>,
    pub device: Option<String>,
    pub frequency: Option<u32>,
    pub refresh: Option<u32>,
    pub sync: bool,
    pub mono_sources: Option<u32>,
    pub stereo_sources: Option<u32>,
    pub aux_sends: u32,
    pub distance_model: DistanceModel,
    pub doppler_factor: Option<f32>,
    pub speed_of_sound: Option<f32>,
    pub gain: f32,
    pub pitch: f32,
    pub looping: bool,
    pub stream: bool,
    pub reverb: Option<f32>,
    pub low_pass: Option<f32>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            library: None,
            device: None,
            frequency: None,
            refresh: None,
            sync: false,
            mono_sources: None,
            stereo_sources: None,
            aux_sends: 2,
            distance_model: DistanceModel::default(),
            doppler_factor: None,
            speed_of_sound: None,
            gain: 1.0,
            pitch: 1.0,
            looping: false,
            stream: false,
            reverb: None,
            low_pass: None,
        }
    }
}

impl Options {
    /// Parse the command-line argument syntax for an option. Returns `Ok(true)`
    /// if the option was valid and has been applied, and `Ok(false)` if the
    /// option was not recognized.
    pub fn parse_argument(&mut self, arg: &str) -> Result<bool, String> {
        fn parse_count(arg: &str, name: &str) -> Result<u32, String> {
            arg.parse()
                .map_err(|_| format!("Value for {} is invalid", name))
        }
        fn parse_float(arg: &str, name: &str, min: f32, max: f32) -> Result<f32, String> {
            let arg: f32 = arg
                .parse()
                .map_err(|_| format!("Value for {} is invalid", name))?;
            if !arg.is_finite() || !(min..=max).contains(&arg) {
                return Err(format!("Value for {} is out of range", name));
            }
            Ok(arg)
        }
        fn parse_positive(arg: &str, name: &str) -> Result<f32, String> {
            let arg = parse_float(arg, name, 0.0, f32::MAX)?;
            if arg == 0.0 {
                return Err(format!("Value for {} must be greater than 0", name));
            }
            Ok(arg)
        }

        if let Some(value) = arg.strip_prefix("--library=") {
            self.library = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--device=") {
            self.device = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--frequency=") {
            self.frequency = Some(parse_count(value, "frequency")?);
        } else if let Some(value) = arg.strip_prefix("--refresh=") {
            self.refresh = Some(parse_count(value, "refresh")?);
        } else if arg == "--sync" {
            self.sync = true;
        } else if let Some(value) = arg.strip_prefix("--mono-sources=") {
            self.mono_sources = Some(parse_count(value, "mono sources")?);
        } else if let Some(value) = arg.strip_prefix("--stereo-sources=") {
            self.stereo_sources = Some(parse_count(value, "stereo sources")?);
        } else if let Some(value) = arg.strip_prefix("--aux-sends=") {
            let sends = parse_count(value, "aux sends")?;
            if sends > 16 {
                return Err("Value for aux sends is out of range".to_string());
            }
            self.aux_sends = sends;
        } else if let Some(value) = arg.strip_prefix("--distance-model=") {
            self.distance_model = DistanceModel::from_name(value)
                .ok_or_else(|| format!("Unknown distance model {:?}", value))?;
        } else if let Some(value) = arg.strip_prefix("--doppler-factor=") {
            self.doppler_factor = Some(parse_float(value, "doppler factor", 0.0, f32::MAX)?);
        } else if let Some(value) = arg.strip_prefix("--speed-of-sound=") {
            self.speed_of_sound = Some(parse_positive(value, "speed of sound")?);
        } else if let Some(value) = arg.strip_prefix("--gain=") {
            self.gain = parse_float(value, "gain", 0.0, f32::MAX)?;
        } else if let Some(value) = arg.strip_prefix("--pitch=") {
            self.pitch = parse_positive(value, "pitch")?;
        } else if arg == "--loop" {
            self.looping = true;
        } else if arg == "--stream" {
            self.stream = true;
        } else if let Some(value) = arg.strip_prefix("--reverb=") {
            self.reverb = Some(parse_float(value, "reverb decay time", 0.1, 20.0)?);
        } else if let Some(value) = arg.strip_prefix("--low-pass=") {
            self.low_pass = Some(parse_float(value, "low-pass gain", 0.0, 1.0)?);
        } else {
            return Ok(false);
        };
        Ok(true)
    }
}

/// Read options from an options file. Each line may contain any number of
/// whitespace-separated options, and anything after a `#` is a comment.
pub fn get_options_from_file<F: Read>(file: F) -> Result<Vec<String>, String> {
    let mut options = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_no + 1, e))?;
        let line = line.split_once('#').map_or(line.as_str(), |(options, _)| options);
        options.extend(line.split_ascii_whitespace().map(str::to_string));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        let mut options = Options::default();
        for arg in args {
            if !options.parse_argument(arg)? {
                return Err(format!("unrecognized: {}", arg));
            }
        }
        Ok(options)
    }

    #[test]
    fn context_attributes() {
        let options = parse(&[
            "--frequency=48000",
            "--refresh=50",
            "--sync",
            "--mono-sources=30",
            "--stereo-sources=2",
            "--aux-sends=4",
        ])
        .unwrap();
        assert_eq!(options.frequency, Some(48000));
        assert_eq!(options.refresh, Some(50));
        assert!(options.sync);
        assert_eq!(options.mono_sources, Some(30));
        assert_eq!(options.stereo_sources, Some(2));
        assert_eq!(options.aux_sends, 4);
    }

    #[test]
    fn device_and_library() {
        let options = parse(&["--device=OpenAL Soft", "--library=/opt/libopenal.so"]).unwrap();
        assert_eq!(options.device.as_deref(), Some("OpenAL Soft"));
        assert_eq!(options.library, Some(PathBuf::from("/opt/libopenal.so")));
    }

    #[test]
    fn global_state() {
        let options = parse(&[
            "--distance-model=Linear-Clamped",
            "--doppler-factor=0",
            "--speed-of-sound=1500",
        ])
        .unwrap();
        assert_eq!(options.distance_model, DistanceModel::LinearClamped);
        assert_eq!(options.doppler_factor, Some(0.0));
        assert_eq!(options.speed_of_sound, Some(1500.0));
    }

    #[test]
    fn invalid_values() {
        assert!(parse(&["--frequency=fast"]).is_err());
        assert!(parse(&["--aux-sends=17"]).is_err());
        assert!(parse(&["--distance-model=cubic"]).is_err());
        assert!(parse(&["--speed-of-sound=0"]).is_err());
        assert!(parse(&["--doppler-factor=-1"]).is_err());
        assert!(parse(&["--gain=NaN"]).is_err());
        assert!(parse(&["--reverb=30"]).is_err());
        assert!(parse(&["--low-pass=1.5"]).is_err());
    }

    #[test]
    fn unrecognized() {
        let mut options = Options::default();
        assert_eq!(options.parse_argument("--frobnicate"), Ok(false));
        assert_eq!(options.parse_argument("sound.wav"), Ok(false));
        assert_eq!(options, Options::default());
    }

    #[test]
    fn options_file() {
        let file = "\
# Quiet, reverberant playback
--gain=0.5 --reverb=3   # long decay

--stream
";
        let args = get_options_from_file(file.as_bytes()).unwrap();
        assert_eq!(args, ["--gain=0.5", "--reverb=3", "--stream"]);

        let options = parse(&args.iter().map(String::as_str).collect::<Vec<_>>()).unwrap();
        assert_eq!(options.gain, 0.5);
        assert_eq!(options.reverb, Some(3.0));
        assert!(options.stream);
    }
}
