/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The error type returned by everything that talks to OpenAL.

use crate::audio::openal::LoadError;
use crate::audio::AudioFileError;
use crate::object::ObjectKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("couldn't load OpenAL: {0}")]
    Library(#[from] LoadError),
    #[error("a sound system already exists, only one may be created at a time")]
    AlreadySpawned,
    #[error("the device {0:?} couldn't be opened")]
    DeviceOpen(String),
    #[error("there is no open device named {0:?}")]
    UnknownDevice(String),
    #[error("the context {0:?} couldn't be created")]
    ContextCreate(String),
    #[error("there is no context named {0:?}")]
    UnknownContext(String),
    #[error("the context {0:?} couldn't be made current")]
    ContextCurrent(String),
    #[error("there is no current context")]
    NoContext,
    /// A native call failed. `message` is the driver's description of the
    /// error code.
    #[error("Object {object}: AL returned {message:?}")]
    Al {
        object: &'static str,
        message: String,
    },
    #[error("device {device:?}: ALC returned error {code:#x}")]
    Alc { device: String, code: i32 },
    #[error("{0} has already been destroyed")]
    Destroyed(ObjectKind),
    #[error("the EFX extension is not available")]
    EfxUnavailable,
    #[error("unsupported sound format: {channels} channel(s), {bits}-bit")]
    UnsupportedFormat { channels: u32, bits: u32 },
    #[error("auxiliary send {index} is out of range, the source has {count}")]
    InvalidSend { index: usize, count: usize },
    #[error("{0} bytes of PCM data is too much for one buffer")]
    DataTooLarge(usize),
    #[error("a sample rate of {0} Hz can't be passed to OpenAL")]
    InvalidFrequency(u32),
    #[error(transparent)]
    AudioFile(#[from] AudioFileError),
}
