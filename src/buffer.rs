/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! OpenAL buffers, which hold PCM data for sources to play.

use crate::audio::openal::*;
use crate::audio::Decoder;
use crate::error::SoundError;
use crate::object::{Destroy, ObjectHandle, ObjectKind, Registry};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Common sample rates, in Hz.
pub const FREQ_8KHZ: u32 = 8000;
pub const FREQ_11KHZ: u32 = 11025;
pub const FREQ_16KHZ: u32 = 16000;
pub const FREQ_22KHZ: u32 = 22050;
pub const FREQ_32KHZ: u32 = 32000;
pub const FREQ_44KHZ: u32 = 44100;
pub const FREQ_48KHZ: u32 = 48000;

/// The PCM layouts core OpenAL understands. 8-bit samples are unsigned,
/// 16-bit samples are signed and native-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
}

impl SoundFormat {
    /// The `AL_FORMAT_*` value.
    pub fn al_value(self) -> ALenum {
        match self {
            SoundFormat::Mono8 => AL_FORMAT_MONO8,
            SoundFormat::Mono16 => AL_FORMAT_MONO16,
            SoundFormat::Stereo8 => AL_FORMAT_STEREO8,
            SoundFormat::Stereo16 => AL_FORMAT_STEREO16,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            SoundFormat::Mono8 | SoundFormat::Stereo8 => 8,
            SoundFormat::Mono16 | SoundFormat::Stereo16 => 16,
        }
    }

    pub fn channels(self) -> u32 {
        match self {
            SoundFormat::Mono8 | SoundFormat::Mono16 => 1,
            SoundFormat::Stereo8 | SoundFormat::Stereo16 => 2,
        }
    }

    /// Bytes per sample frame (one sample for each channel).
    pub fn frame_size(self) -> u32 {
        self.channels() * self.bits() / 8
    }

    pub fn from_channels_and_bits(channels: u32, bits: u32) -> Result<SoundFormat, SoundError> {
        match (channels, bits) {
            (1, 8) => Ok(SoundFormat::Mono8),
            (1, 16) => Ok(SoundFormat::Mono16),
            (2, 8) => Ok(SoundFormat::Stereo8),
            (2, 16) => Ok(SoundFormat::Stereo16),
            _ => Err(SoundError::UnsupportedFormat { channels, bits }),
        }
    }
}

impl fmt::Display for SoundFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = if self.channels() == 1 {
            "Mono"
        } else {
            "Stereo"
        };
        write!(f, "{} {}-bit", channels, self.bits())
    }
}

/// Handle to an OpenAL buffer. Clones refer to the same buffer.
///
/// Sources keep a clone of every buffer bound or queued on them, so a buffer
/// is never freed by dropping handles while a source still uses it.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

struct BufferInner {
    handle: ObjectHandle,
    state: Mutex<BufferState>,
}

struct BufferState {
    format: SoundFormat,
    frequency: u32,
    size: usize,
}

impl Destroy for BufferInner {
    fn destroy(&self) -> Result<(), SoundError> {
        self.handle
            .release(|api, id| unsafe { (api.fns().alDeleteBuffers)(1, &id) })
            .map(|_| ())
    }
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log!("Couldn't free buffer {}: {}", self.handle.id(), err);
        }
    }
}

impl Buffer {
    pub(crate) fn new(api: &Arc<Api>, registry: &Arc<Registry>) -> Result<Buffer, SoundError> {
        Ok(Buffer::new_many(api, registry, 1)?.remove(0))
    }

    /// Allocate `count` buffers with one `alGenBuffers` call.
    pub(crate) fn new_many(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        count: usize,
    ) -> Result<Vec<Buffer>, SoundError> {
        let n = ALsizei::try_from(count).map_err(|_| SoundError::DataTooLarge(count))?;
        let mut ids: Vec<ALuint> = vec![0; count];
        api.clear_error();
        unsafe { (api.fns().alGenBuffers)(n, ids.as_mut_ptr()) };
        api.error_check(ObjectKind::Buffer.name())?;

        Ok(ids
            .into_iter()
            .map(|id| {
                let handle =
                    ObjectHandle::allocate(api, registry, ObjectKind::Buffer, |_| Ok(id));
                handle.map(|handle| {
                    let inner = Arc::new(BufferInner {
                        handle,
                        state: Mutex::new(BufferState {
                            format: SoundFormat::Mono8,
                            frequency: FREQ_11KHZ,
                            size: 0,
                        }),
                    });
                    let weak: Weak<dyn Destroy> = Arc::downgrade(&inner) as _;
                    inner.handle.register(weak);
                    Buffer { inner }
                })
            })
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Allocate a buffer and fill it with everything `decoder` produces.
    pub(crate) fn from_decoder(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        decoder: &mut Decoder,
    ) -> Result<Buffer, SoundError> {
        let buffer = Buffer::new(api, registry)?;
        buffer.load_from_decoder(decoder)?;
        Ok(buffer)
    }

    pub fn id(&self) -> ALuint {
        self.inner.handle.id()
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.handle.is_allocated()
    }

    /// Free the native buffer. Does nothing if it was already freed. Fails if
    /// the buffer is still attached to a source.
    pub fn destroy(&self) -> Result<(), SoundError> {
        self.inner.destroy()
    }

    pub(crate) fn attachable_id(&self) -> Result<ALuint, SoundError> {
        self.inner.handle.check_allocated()
    }

    pub fn format(&self) -> SoundFormat {
        self.inner.state.lock().format
    }

    /// Set the format used by the next [Self::load_pcm_data].
    pub fn set_format(&self, format: SoundFormat) {
        self.inner.state.lock().format = format;
    }

    pub fn set_format_by_channels_and_bits(
        &self,
        channels: u32,
        bits: u32,
    ) -> Result<(), SoundError> {
        self.set_format(SoundFormat::from_channels_and_bits(channels, bits)?);
        Ok(())
    }

    pub fn frequency(&self) -> u32 {
        self.inner.state.lock().frequency
    }

    /// Set the sample rate used by the next [Self::load_pcm_data].
    pub fn set_frequency(&self, frequency: u32) {
        self.inner.state.lock().frequency = frequency;
    }

    /// Size in bytes of the data last loaded.
    pub fn size(&self) -> usize {
        self.inner.state.lock().size
    }

    /// Upload PCM data in the current format and frequency.
    pub fn load_pcm_data(&self, data: &[u8]) -> Result<(), SoundError> {
        let size = ALsizei::try_from(data.len()).map_err(|_| SoundError::DataTooLarge(data.len()))?;
        let mut state = self.inner.state.lock();
        let format = state.format.al_value();
        let frequency = ALsizei::try_from(state.frequency)
            .map_err(|_| SoundError::InvalidFrequency(state.frequency))?;
        self.inner.handle.call(|fns, id| unsafe {
            (fns.alBufferData)(id, format, data.as_ptr().cast(), size, frequency)
        })?;
        state.size = data.len();
        Ok(())
    }

    /// Take the format and frequency from `decoder`, then decode all of its
    /// remaining data into this buffer.
    pub fn load_from_decoder(&self, decoder: &mut Decoder) -> Result<(), SoundError> {
        let pcm_format = decoder.pcm_format();
        let format = SoundFormat::from_channels_and_bits(pcm_format.channels, pcm_format.bits)?;

        let data = decoder.read_to_end()?;
        self.set_format(format);
        self.set_frequency(pcm_format.sample_rate);
        self.load_pcm_data(&data)
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Buffer")
            .field("id", &self.id())
            .field("format", &state.format)
            .field("frequency", &state.frequency)
            .field("size", &state.size)
            .finish()
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        write!(
            f,
            "Buffer {} {} {}Hz {} bytes",
            self.id(),
            state.format,
            state.frequency,
            state.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::testing;

    #[test]
    fn format_from_channels_and_bits() {
        assert_eq!(
            SoundFormat::from_channels_and_bits(2, 16).unwrap(),
            SoundFormat::Stereo16
        );
        assert_eq!(
            SoundFormat::from_channels_and_bits(1, 8).unwrap(),
            SoundFormat::Mono8
        );
        assert!(matches!(
            SoundFormat::from_channels_and_bits(6, 16),
            Err(SoundError::UnsupportedFormat {
                channels: 6,
                bits: 16
            })
        ));
        assert!(SoundFormat::from_channels_and_bits(1, 24).is_err());
        assert_eq!(SoundFormat::Stereo16.frame_size(), 4);
    }

    #[test]
    fn defaults_and_display() {
        let system = testing::system();
        let buffer = system.create_buffer().unwrap();
        assert_eq!(buffer.format(), SoundFormat::Mono8);
        assert_eq!(buffer.frequency(), FREQ_11KHZ);
        assert_eq!(buffer.size(), 0);
        assert_eq!(
            buffer.to_string(),
            format!("Buffer {} Mono 8-bit 11025Hz 0 bytes", buffer.id())
        );
    }

    #[test]
    fn load_pcm_data_uses_current_format() {
        let system = testing::system();
        let buffer = system.create_buffer().unwrap();
        buffer.set_format_by_channels_and_bits(2, 16).unwrap();
        buffer.set_frequency(FREQ_44KHZ);
        buffer.load_pcm_data(&[0; 400]).unwrap();

        assert_eq!(buffer.size(), 400);
        assert_eq!(
            testing::buffer_data(buffer.id()),
            Some((AL_FORMAT_STEREO16, 400, 44100))
        );
    }

    #[test]
    fn out_of_range_frequency_is_rejected() {
        let system = testing::system();
        let buffer = system.create_buffer().unwrap();
        buffer.set_frequency(u32::MAX);
        assert!(matches!(
            buffer.load_pcm_data(&[0; 16]),
            Err(SoundError::InvalidFrequency(u32::MAX))
        ));
        assert_eq!(testing::buffer_data(buffer.id()), None);
        assert_eq!(buffer.size(), 0);

        buffer.set_frequency(FREQ_48KHZ);
        buffer.load_pcm_data(&[0; 16]).unwrap();
        assert_eq!(
            testing::buffer_data(buffer.id()),
            Some((AL_FORMAT_MONO8, 16, 48000))
        );
    }

    #[test]
    fn create_many() {
        let system = testing::system();
        let buffers = system.create_buffers(3).unwrap();
        assert_eq!(buffers.len(), 3);
        assert_ne!(buffers[0].id(), buffers[1].id());
        assert!(buffers
            .iter()
            .all(|buffer| testing::is_live(ObjectKind::Buffer, buffer.id())));
    }

    #[test]
    fn dropping_the_last_handle_frees_it() {
        let system = testing::system();
        let buffer = system.create_buffer().unwrap();
        let id = buffer.id();
        let clone = buffer.clone();
        drop(buffer);
        assert!(testing::is_live(ObjectKind::Buffer, id));
        drop(clone);
        assert!(!testing::is_live(ObjectKind::Buffer, id));
    }

    #[test]
    fn from_decoder() {
        let system = testing::system();
        let wav = testing::wav_bytes(2, 16, 22050, 5000);
        let file = AudioFile::from_bytes("tone.wav", wav).unwrap();
        let mut decoder = file.decoder().unwrap();
        let buffer = system.create_buffer_from_decoder(&mut decoder).unwrap();

        assert_eq!(buffer.format(), SoundFormat::Stereo16);
        assert_eq!(buffer.frequency(), 22050);
        assert_eq!(buffer.size(), 5000 * 4);
        assert_eq!(
            testing::buffer_data(buffer.id()),
            Some((AL_FORMAT_STEREO16, 5000 * 4, 22050))
        );
    }

    #[test]
    fn native_errors_carry_the_driver_message() {
        let system = testing::system();
        let buffer = system.create_buffer().unwrap();
        testing::fail_next_call(AL_OUT_OF_MEMORY);
        let err = buffer.load_pcm_data(&[0; 16]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Object Buffer: AL returned \"Out of Memory\""
        );
        assert_eq!(buffer.size(), 0);
    }
}
