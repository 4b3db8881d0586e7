/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! OpenAL bindings, resolved at runtime from the system's OpenAL library.
//!
//! The headers this mirrors are `AL/al.h`, `AL/alc.h` and `AL/efx.h` from
//! OpenAL Soft. Only the entry points the binding layer actually calls are
//! declared.
//!
//! This is separated out into its own package so that the raw C surface stays
//! in one place, apart from the error-checked wrappers built on top of it.

// This allows items in the crate to have the same names as the C API.
#![allow(non_snake_case)]

use libloading::Library;
use std::path::{Path, PathBuf};
use thiserror::Error;

// === alc.h ===

#[allow(dead_code)]
pub mod alc_types {
    use std::ffi;

    // TODO: If Rust ever stabilises a good way to do opaque types, use that
    // instead of a typedef of void.
    /// Opaque type.
    pub type ALCdevice = ffi::c_void;
    /// Opaque type.
    pub type ALCcontext = ffi::c_void;

    pub type ALCboolean = ffi::c_char;
    pub type ALCchar = ffi::c_char;
    pub type ALCint = ffi::c_int;
    pub type ALCuint = ffi::c_uint;
    pub type ALCsizei = ffi::c_int;
    pub type ALCenum = ffi::c_int;
    pub type ALCvoid = ffi::c_void;
}
use alc_types::*;

pub const ALC_FALSE: ALCboolean = 0;
pub const ALC_TRUE: ALCboolean = 1;

pub const ALC_NO_ERROR: ALCenum = 0;
pub const ALC_INVALID_DEVICE: ALCenum = 0xA001;
pub const ALC_INVALID_CONTEXT: ALCenum = 0xA002;
pub const ALC_INVALID_ENUM: ALCenum = 0xA003;
pub const ALC_INVALID_VALUE: ALCenum = 0xA004;
pub const ALC_OUT_OF_MEMORY: ALCenum = 0xA005;

pub const ALC_MAJOR_VERSION: ALCenum = 0x1000;
pub const ALC_MINOR_VERSION: ALCenum = 0x1001;

pub const ALC_FREQUENCY: ALCenum = 0x1007;
pub const ALC_REFRESH: ALCenum = 0x1008;
pub const ALC_SYNC: ALCenum = 0x1009;
pub const ALC_MONO_SOURCES: ALCenum = 0x1010;
pub const ALC_STEREO_SOURCES: ALCenum = 0x1011;

pub const ALC_DEFAULT_DEVICE_SPECIFIER: ALCenum = 0x1004;
pub const ALC_DEVICE_SPECIFIER: ALCenum = 0x1005;
pub const ALC_EXTENSIONS: ALCenum = 0x1006;
pub const ALC_CAPTURE_DEVICE_SPECIFIER: ALCenum = 0x310;
pub const ALC_CAPTURE_DEFAULT_DEVICE_SPECIFIER: ALCenum = 0x311;

// ALC_ENUMERATE_ALL_EXT
pub const ALC_DEFAULT_ALL_DEVICES_SPECIFIER: ALCenum = 0x1012;
pub const ALC_ALL_DEVICES_SPECIFIER: ALCenum = 0x1013;

// === al.h ===

#[allow(dead_code)]
pub mod al_types {
    use std::ffi;

    pub type ALboolean = ffi::c_char;
    pub type ALchar = ffi::c_char;
    pub type ALint = ffi::c_int;
    pub type ALuint = ffi::c_uint;
    pub type ALsizei = ffi::c_int;
    pub type ALenum = ffi::c_int;
    pub type ALfloat = ffi::c_float;
    pub type ALvoid = ffi::c_void;
}
use al_types::*;

pub const AL_NONE: ALint = 0;
pub const AL_FALSE: ALboolean = 0;
pub const AL_TRUE: ALboolean = 1;

pub const AL_SOURCE_RELATIVE: ALenum = 0x202;
pub const AL_CONE_INNER_ANGLE: ALenum = 0x1001;
pub const AL_CONE_OUTER_ANGLE: ALenum = 0x1002;
pub const AL_PITCH: ALenum = 0x1003;
pub const AL_POSITION: ALenum = 0x1004;
pub const AL_DIRECTION: ALenum = 0x1005;
pub const AL_VELOCITY: ALenum = 0x1006;
pub const AL_LOOPING: ALenum = 0x1007;
pub const AL_BUFFER: ALenum = 0x1009;
pub const AL_GAIN: ALenum = 0x100A;
pub const AL_MIN_GAIN: ALenum = 0x100D;
pub const AL_MAX_GAIN: ALenum = 0x100E;
pub const AL_ORIENTATION: ALenum = 0x100F;

pub const AL_SOURCE_STATE: ALenum = 0x1010;
pub const AL_INITIAL: ALenum = 0x1011;
pub const AL_PLAYING: ALenum = 0x1012;
pub const AL_PAUSED: ALenum = 0x1013;
pub const AL_STOPPED: ALenum = 0x1014;

pub const AL_BUFFERS_QUEUED: ALenum = 0x1015;
pub const AL_BUFFERS_PROCESSED: ALenum = 0x1016;

pub const AL_REFERENCE_DISTANCE: ALenum = 0x1020;
pub const AL_ROLLOFF_FACTOR: ALenum = 0x1021;
pub const AL_CONE_OUTER_GAIN: ALenum = 0x1022;
pub const AL_MAX_DISTANCE: ALenum = 0x1023;
pub const AL_SEC_OFFSET: ALenum = 0x1024;

pub const AL_FORMAT_MONO8: ALenum = 0x1100;
pub const AL_FORMAT_MONO16: ALenum = 0x1101;
pub const AL_FORMAT_STEREO8: ALenum = 0x1102;
pub const AL_FORMAT_STEREO16: ALenum = 0x1103;

pub const AL_NO_ERROR: ALenum = 0;
pub const AL_INVALID_NAME: ALenum = 0xA001;
pub const AL_INVALID_ENUM: ALenum = 0xA002;
pub const AL_INVALID_VALUE: ALenum = 0xA003;
pub const AL_INVALID_OPERATION: ALenum = 0xA004;
pub const AL_OUT_OF_MEMORY: ALenum = 0xA005;

pub const AL_VENDOR: ALenum = 0xB001;
pub const AL_VERSION: ALenum = 0xB002;
pub const AL_RENDERER: ALenum = 0xB003;
pub const AL_EXTENSIONS: ALenum = 0xB004;

pub const AL_DOPPLER_FACTOR: ALenum = 0xC000;
pub const AL_SPEED_OF_SOUND: ALenum = 0xC003;

pub const AL_DISTANCE_MODEL: ALenum = 0xD000;
pub const AL_INVERSE_DISTANCE: ALenum = 0xD001;
pub const AL_INVERSE_DISTANCE_CLAMPED: ALenum = 0xD002;
pub const AL_LINEAR_DISTANCE: ALenum = 0xD003;
pub const AL_LINEAR_DISTANCE_CLAMPED: ALenum = 0xD004;
pub const AL_EXPONENT_DISTANCE: ALenum = 0xD005;
pub const AL_EXPONENT_DISTANCE_CLAMPED: ALenum = 0xD006;

// === efx.h ===

pub const ALC_EXT_EFX_NAME: &str = "ALC_EXT_EFX";

pub const ALC_EFX_MAJOR_VERSION: ALCenum = 0x20001;
pub const ALC_EFX_MINOR_VERSION: ALCenum = 0x20002;
pub const ALC_MAX_AUXILIARY_SENDS: ALCenum = 0x20003;

pub const AL_DIRECT_FILTER: ALenum = 0x20005;
pub const AL_AUXILIARY_SEND_FILTER: ALenum = 0x20006;

pub const AL_REVERB_DENSITY: ALenum = 0x0001;
pub const AL_REVERB_DIFFUSION: ALenum = 0x0002;
pub const AL_REVERB_GAIN: ALenum = 0x0003;
pub const AL_REVERB_GAINHF: ALenum = 0x0004;
pub const AL_REVERB_DECAY_TIME: ALenum = 0x0005;
pub const AL_REVERB_DECAY_HFRATIO: ALenum = 0x0006;
pub const AL_REVERB_REFLECTIONS_GAIN: ALenum = 0x0007;
pub const AL_REVERB_REFLECTIONS_DELAY: ALenum = 0x0008;
pub const AL_REVERB_LATE_REVERB_GAIN: ALenum = 0x0009;
pub const AL_REVERB_LATE_REVERB_DELAY: ALenum = 0x000A;
pub const AL_REVERB_AIR_ABSORPTION_GAINHF: ALenum = 0x000B;
pub const AL_REVERB_ROOM_ROLLOFF_FACTOR: ALenum = 0x000C;
pub const AL_REVERB_DECAY_HFLIMIT: ALenum = 0x000D;

pub const AL_CHORUS_WAVEFORM: ALenum = 0x0001;
pub const AL_CHORUS_PHASE: ALenum = 0x0002;
pub const AL_CHORUS_RATE: ALenum = 0x0003;
pub const AL_CHORUS_DEPTH: ALenum = 0x0004;
pub const AL_CHORUS_FEEDBACK: ALenum = 0x0005;
pub const AL_CHORUS_DELAY: ALenum = 0x0006;

pub const AL_DISTORTION_EDGE: ALenum = 0x0001;
pub const AL_DISTORTION_GAIN: ALenum = 0x0002;
pub const AL_DISTORTION_LOWPASS_CUTOFF: ALenum = 0x0003;
pub const AL_DISTORTION_EQCENTER: ALenum = 0x0004;
pub const AL_DISTORTION_EQBANDWIDTH: ALenum = 0x0005;

pub const AL_ECHO_DELAY: ALenum = 0x0001;
pub const AL_ECHO_LRDELAY: ALenum = 0x0002;
pub const AL_ECHO_DAMPING: ALenum = 0x0003;
pub const AL_ECHO_FEEDBACK: ALenum = 0x0004;
pub const AL_ECHO_SPREAD: ALenum = 0x0005;

pub const AL_FLANGER_WAVEFORM: ALenum = 0x0001;
pub const AL_FLANGER_PHASE: ALenum = 0x0002;
pub const AL_FLANGER_RATE: ALenum = 0x0003;
pub const AL_FLANGER_DEPTH: ALenum = 0x0004;
pub const AL_FLANGER_FEEDBACK: ALenum = 0x0005;
pub const AL_FLANGER_DELAY: ALenum = 0x0006;

pub const AL_FREQUENCY_SHIFTER_FREQUENCY: ALenum = 0x0001;
pub const AL_FREQUENCY_SHIFTER_LEFT_DIRECTION: ALenum = 0x0002;
pub const AL_FREQUENCY_SHIFTER_RIGHT_DIRECTION: ALenum = 0x0003;

pub const AL_VOCAL_MORPHER_PHONEMEA: ALenum = 0x0001;
pub const AL_VOCAL_MORPHER_PHONEMEA_COARSE_TUNING: ALenum = 0x0002;
pub const AL_VOCAL_MORPHER_PHONEMEB: ALenum = 0x0003;
pub const AL_VOCAL_MORPHER_PHONEMEB_COARSE_TUNING: ALenum = 0x0004;
pub const AL_VOCAL_MORPHER_WAVEFORM: ALenum = 0x0005;
pub const AL_VOCAL_MORPHER_RATE: ALenum = 0x0006;

pub const AL_PITCH_SHIFTER_COARSE_TUNE: ALenum = 0x0001;
pub const AL_PITCH_SHIFTER_FINE_TUNE: ALenum = 0x0002;

pub const AL_RING_MODULATOR_FREQUENCY: ALenum = 0x0001;
pub const AL_RING_MODULATOR_HIGHPASS_CUTOFF: ALenum = 0x0002;
pub const AL_RING_MODULATOR_WAVEFORM: ALenum = 0x0003;

pub const AL_AUTOWAH_ATTACK_TIME: ALenum = 0x0001;
pub const AL_AUTOWAH_RELEASE_TIME: ALenum = 0x0002;
pub const AL_AUTOWAH_RESONANCE: ALenum = 0x0003;
pub const AL_AUTOWAH_PEAK_GAIN: ALenum = 0x0004;

pub const AL_COMPRESSOR_ONOFF: ALenum = 0x0001;

pub const AL_EQUALIZER_LOW_GAIN: ALenum = 0x0001;
pub const AL_EQUALIZER_LOW_CUTOFF: ALenum = 0x0002;
pub const AL_EQUALIZER_MID1_GAIN: ALenum = 0x0003;
pub const AL_EQUALIZER_MID1_CENTER: ALenum = 0x0004;
pub const AL_EQUALIZER_MID1_WIDTH: ALenum = 0x0005;
pub const AL_EQUALIZER_MID2_GAIN: ALenum = 0x0006;
pub const AL_EQUALIZER_MID2_CENTER: ALenum = 0x0007;
pub const AL_EQUALIZER_MID2_WIDTH: ALenum = 0x0008;
pub const AL_EQUALIZER_HIGH_GAIN: ALenum = 0x0009;
pub const AL_EQUALIZER_HIGH_CUTOFF: ALenum = 0x000A;

pub const AL_EFFECT_TYPE: ALenum = 0x8001;

pub const AL_EFFECT_NULL: ALint = 0x0000;
pub const AL_EFFECT_REVERB: ALint = 0x0001;
pub const AL_EFFECT_CHORUS: ALint = 0x0002;
pub const AL_EFFECT_DISTORTION: ALint = 0x0003;
pub const AL_EFFECT_ECHO: ALint = 0x0004;
pub const AL_EFFECT_FLANGER: ALint = 0x0005;
pub const AL_EFFECT_FREQUENCY_SHIFTER: ALint = 0x0006;
pub const AL_EFFECT_VOCAL_MORPHER: ALint = 0x0007;
pub const AL_EFFECT_PITCH_SHIFTER: ALint = 0x0008;
pub const AL_EFFECT_RING_MODULATOR: ALint = 0x0009;
pub const AL_EFFECT_AUTOWAH: ALint = 0x000A;
pub const AL_EFFECT_COMPRESSOR: ALint = 0x000B;
pub const AL_EFFECT_EQUALIZER: ALint = 0x000C;

pub const AL_EFFECTSLOT_EFFECT: ALenum = 0x0001;
pub const AL_EFFECTSLOT_GAIN: ALenum = 0x0002;
pub const AL_EFFECTSLOT_AUXILIARY_SEND_AUTO: ALenum = 0x0003;
pub const AL_EFFECTSLOT_NULL: ALint = 0x0000;

pub const AL_LOWPASS_GAIN: ALenum = 0x0001;
pub const AL_LOWPASS_GAINHF: ALenum = 0x0002;

pub const AL_HIGHPASS_GAIN: ALenum = 0x0001;
pub const AL_HIGHPASS_GAINLF: ALenum = 0x0002;

pub const AL_BANDPASS_GAIN: ALenum = 0x0001;
pub const AL_BANDPASS_GAINLF: ALenum = 0x0002;
pub const AL_BANDPASS_GAINHF: ALenum = 0x0003;

pub const AL_FILTER_TYPE: ALenum = 0x8001;

pub const AL_FILTER_NULL: ALint = 0x0000;
pub const AL_FILTER_LOWPASS: ALint = 0x0001;
pub const AL_FILTER_HIGHPASS: ALint = 0x0002;
pub const AL_FILTER_BANDPASS: ALint = 0x0003;

// === function tables ===

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't load {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("no OpenAL library was found (tried {})", tried.join(", "))]
    NotFound { tried: Vec<String> },
    #[error("the OpenAL library has no {name} symbol")]
    MissingSymbol {
        name: &'static str,
        source: libloading::Error,
    },
}

unsafe fn load_symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, LoadError> {
    library
        .get::<T>(name.as_bytes())
        .map(|symbol| *symbol)
        .map_err(|source| LoadError::MissingSymbol { name, source })
}

/// Declares a struct of C function pointers whose field names are the C
/// symbol names, plus a constructor resolving each one from a [Library].
macro_rules! function_table {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(pub fn $fn_name:ident($($param:ident: $param_ty:ty),*) $(-> $ret:ty)?;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name {
            $(pub $fn_name: unsafe extern "C" fn($($param_ty),*) $(-> $ret)?,)*
        }

        impl $name {
            /// Resolve every entry point of this table from `library`.
            ///
            /// # Safety
            ///
            /// `library` must be an OpenAL implementation exporting these
            /// symbols with their C signatures. The returned pointers are only
            /// valid while `library` stays loaded.
            pub unsafe fn load_from(library: &Library) -> Result<Self, LoadError> {
                Ok($name {
                    $($fn_name: load_symbol(library, stringify!($fn_name))?,)*
                })
            }
        }
    };
}

function_table! {
    /// Core `al.h` and `alc.h` entry points.
    pub struct Functions {
        pub fn alcOpenDevice(devicename: *const ALCchar) -> *mut ALCdevice;
        pub fn alcCloseDevice(device: *mut ALCdevice) -> ALCboolean;
        pub fn alcCreateContext(device: *mut ALCdevice, attrlist: *const ALCint) -> *mut ALCcontext;
        pub fn alcDestroyContext(context: *mut ALCcontext);
        pub fn alcMakeContextCurrent(context: *mut ALCcontext) -> ALCboolean;
        pub fn alcGetCurrentContext() -> *mut ALCcontext;
        pub fn alcProcessContext(context: *mut ALCcontext);
        pub fn alcSuspendContext(context: *mut ALCcontext);
        pub fn alcGetError(device: *mut ALCdevice) -> ALCenum;
        pub fn alcGetString(device: *mut ALCdevice, param: ALCenum) -> *const ALCchar;
        pub fn alcIsExtensionPresent(device: *mut ALCdevice, extname: *const ALCchar) -> ALCboolean;
        pub fn alcGetIntegerv(device: *mut ALCdevice, param: ALCenum, size: ALCsizei, values: *mut ALCint);

        pub fn alGetError() -> ALenum;
        pub fn alGetString(param: ALenum) -> *const ALchar;
        pub fn alIsExtensionPresent(extname: *const ALchar) -> ALboolean;
        pub fn alGetFloat(param: ALenum) -> ALfloat;
        pub fn alDopplerFactor(value: ALfloat);
        pub fn alSpeedOfSound(value: ALfloat);
        pub fn alDistanceModel(value: ALenum);

        pub fn alListenerf(param: ALenum, value: ALfloat);
        pub fn alListenerfv(param: ALenum, values: *const ALfloat);

        pub fn alGenSources(n: ALsizei, sources: *mut ALuint);
        pub fn alDeleteSources(n: ALsizei, sources: *const ALuint);
        pub fn alSourcef(source: ALuint, param: ALenum, value: ALfloat);
        pub fn alSourcefv(source: ALuint, param: ALenum, values: *const ALfloat);
        pub fn alSourcei(source: ALuint, param: ALenum, value: ALint);
        pub fn alSource3i(source: ALuint, param: ALenum, value1: ALint, value2: ALint, value3: ALint);
        pub fn alGetSourcef(source: ALuint, param: ALenum, value: *mut ALfloat);
        pub fn alGetSourcei(source: ALuint, param: ALenum, value: *mut ALint);
        pub fn alSourcePlay(source: ALuint);
        pub fn alSourcePause(source: ALuint);
        pub fn alSourceStop(source: ALuint);
        pub fn alSourceRewind(source: ALuint);
        pub fn alSourceQueueBuffers(source: ALuint, nb: ALsizei, buffers: *const ALuint);
        pub fn alSourceUnqueueBuffers(source: ALuint, nb: ALsizei, buffers: *mut ALuint);

        pub fn alGenBuffers(n: ALsizei, buffers: *mut ALuint);
        pub fn alDeleteBuffers(n: ALsizei, buffers: *const ALuint);
        pub fn alBufferData(buffer: ALuint, format: ALenum, data: *const ALvoid, size: ALsizei, samplerate: ALsizei);
    }
}

function_table! {
    /// `efx.h` entry points. These are only present when the implementation
    /// supports `ALC_EXT_EFX`.
    pub struct EfxFunctions {
        pub fn alGenEffects(n: ALsizei, effects: *mut ALuint);
        pub fn alDeleteEffects(n: ALsizei, effects: *const ALuint);
        pub fn alEffecti(effect: ALuint, param: ALenum, value: ALint);
        pub fn alEffectf(effect: ALuint, param: ALenum, value: ALfloat);

        pub fn alGenFilters(n: ALsizei, filters: *mut ALuint);
        pub fn alDeleteFilters(n: ALsizei, filters: *const ALuint);
        pub fn alFilteri(filter: ALuint, param: ALenum, value: ALint);
        pub fn alFilterf(filter: ALuint, param: ALenum, value: ALfloat);

        pub fn alGenAuxiliaryEffectSlots(n: ALsizei, slots: *mut ALuint);
        pub fn alDeleteAuxiliaryEffectSlots(n: ALsizei, slots: *const ALuint);
        pub fn alAuxiliaryEffectSloti(slot: ALuint, param: ALenum, value: ALint);
        pub fn alAuxiliaryEffectSlotf(slot: ALuint, param: ALenum, value: ALfloat);
    }
}

#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["OpenAL32.dll", "soft_oal.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &[
    "libopenal.1.dylib",
    "libopenal.dylib",
    "/System/Library/Frameworks/OpenAL.framework/OpenAL",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &["libopenal.so.1", "libopenal.so"];

/// A loaded OpenAL implementation.
pub struct OpenAl {
    pub fns: Functions,
    pub efx: Option<EfxFunctions>,
    // Must outlive the function pointers above, so it is dropped last.
    library: Option<Library>,
}

impl OpenAl {
    /// Load OpenAL from `path`, or if that is [None], from the first of the
    /// platform's usual library names that can be opened. Libraries next to
    /// the executable are preferred over system-wide ones.
    pub fn load(path: Option<&Path>) -> Result<OpenAl, LoadError> {
        let library = match path {
            Some(path) => unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
                path: path.to_owned(),
                source,
            })?,
            None => find_library()?,
        };
        // SAFETY: any library found under these names is an OpenAL
        // implementation, and `library` is kept alive alongside the pointers.
        unsafe {
            let fns = Functions::load_from(&library)?;
            let efx = EfxFunctions::load_from(&library).ok();
            Ok(OpenAl {
                fns,
                efx,
                library: Some(library),
            })
        }
    }

    /// Use function tables that don't come from a dynamically loaded library,
    /// e.g. a statically linked implementation.
    pub fn from_functions(fns: Functions, efx: Option<EfxFunctions>) -> OpenAl {
        OpenAl {
            fns,
            efx,
            library: None,
        }
    }

    pub fn is_dynamically_loaded(&self) -> bool {
        self.library.is_some()
    }
}

fn find_library() -> Result<Library, LoadError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_owned))
    {
        candidates.extend(LIBRARY_NAMES.iter().map(|name| exe_dir.join(name)));
    }
    candidates.extend(LIBRARY_NAMES.iter().map(PathBuf::from));

    for candidate in &candidates {
        if let Ok(library) = unsafe { Library::new(candidate) } {
            return Ok(library);
        }
    }
    Err(LoadError::NotFound {
        tried: candidates
            .iter()
            .map(|candidate| candidate.display().to_string())
            .collect(),
    })
}
