/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The sound system: devices, contexts, global AL state, and the factory for
//! every object.
//!
//! Only one [System] can exist at a time, because the current OpenAL context
//! is process-wide state. Devices and contexts are addressed by name; the ones
//! opened by [System::new] are both called `"Default"`.

use crate::audio::openal::*;
use crate::audio::{AudioFile, Decoder};
use crate::buffer::Buffer;
use crate::effect::{
    AnyEffect, Autowah, Chorus, Compressor, Distortion, Echo, Effect, EffectType, Equalizer,
    Flanger, FrequencyShifter, PitchShifter, Reverb, RingModulator, VocalMorpher,
};
use crate::effect_slot::EffectSlot;
use crate::error::SoundError;
use crate::filter::{AnyFilter, BandPass, Filter, FilterType, HighPass, LowPass};
use crate::listener::Listener;
use crate::object::{ContextPtr, Registry};
use crate::options::Options;
use crate::source::{Source, SourceInner};
use parking_lot::Mutex;
use std::ffi::CString;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Name of the device and context opened by [System::new].
pub const DEFAULT_NAME: &str = "Default";

static SPAWNED: AtomicBool = AtomicBool::new(false);

/// How sources are attenuated with distance, i.e. `alDistanceModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceModel {
    None,
    Inverse,
    #[default]
    InverseClamped,
    Linear,
    LinearClamped,
    Exponent,
    ExponentClamped,
}

impl DistanceModel {
    pub const ALL: [DistanceModel; 7] = [
        DistanceModel::None,
        DistanceModel::Inverse,
        DistanceModel::InverseClamped,
        DistanceModel::Linear,
        DistanceModel::LinearClamped,
        DistanceModel::Exponent,
        DistanceModel::ExponentClamped,
    ];

    pub fn al_value(self) -> ALenum {
        match self {
            DistanceModel::None => AL_NONE,
            DistanceModel::Inverse => AL_INVERSE_DISTANCE,
            DistanceModel::InverseClamped => AL_INVERSE_DISTANCE_CLAMPED,
            DistanceModel::Linear => AL_LINEAR_DISTANCE,
            DistanceModel::LinearClamped => AL_LINEAR_DISTANCE_CLAMPED,
            DistanceModel::Exponent => AL_EXPONENT_DISTANCE,
            DistanceModel::ExponentClamped => AL_EXPONENT_DISTANCE_CLAMPED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DistanceModel::None => "none",
            DistanceModel::Inverse => "inverse",
            DistanceModel::InverseClamped => "inverse-clamped",
            DistanceModel::Linear => "linear",
            DistanceModel::LinearClamped => "linear-clamped",
            DistanceModel::Exponent => "exponent",
            DistanceModel::ExponentClamped => "exponent-clamped",
        }
    }

    pub fn from_name(name: &str) -> Option<DistanceModel> {
        DistanceModel::ALL
            .into_iter()
            .find(|model| model.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for DistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes for `alcCreateContext`. [None] leaves the choice to the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextAttributes {
    pub frequency: Option<u32>,
    pub refresh: Option<u32>,
    pub sync: bool,
    pub mono_sources: Option<u32>,
    pub stereo_sources: Option<u32>,
    /// Only honored by devices with the EFX extension.
    pub max_auxiliary_sends: Option<u32>,
}

impl ContextAttributes {
    pub fn from_options(options: &Options) -> ContextAttributes {
        ContextAttributes {
            frequency: options.frequency,
            refresh: options.refresh,
            sync: options.sync,
            mono_sources: options.mono_sources,
            stereo_sources: options.stereo_sources,
            max_auxiliary_sends: Some(options.aux_sends),
        }
    }

    /// The zero-terminated key/value list.
    pub fn to_list(&self) -> Vec<ALCint> {
        let mut list = Vec::new();
        let mut push = |key: ALCenum, value: Option<u32>| {
            if let Some(value) = value {
                list.push(key);
                list.push(value.min(ALCint::MAX as u32) as ALCint);
            }
        };
        push(ALC_FREQUENCY, self.frequency);
        push(ALC_REFRESH, self.refresh);
        push(ALC_SYNC, self.sync.then_some(1));
        push(ALC_MONO_SOURCES, self.mono_sources);
        push(ALC_STEREO_SOURCES, self.stereo_sources);
        push(ALC_MAX_AUXILIARY_SENDS, self.max_auxiliary_sends);
        list.push(0);
        list
    }
}

#[derive(Clone, Copy)]
struct DevicePtr(*mut ALCdevice);
// SAFETY: ALC device handles may be used from any thread.
unsafe impl Send for DevicePtr {}
unsafe impl Sync for DevicePtr {}

struct Device {
    name: String,
    raw: DevicePtr,
    has_efx: bool,
}

/// An ALC context, and the sources created while it was current.
pub(crate) struct Context {
    name: String,
    device_name: String,
    raw: ContextPtr,
    device: DevicePtr,
    /// Number of auxiliary sends each new source gets.
    pub(crate) aux_sends: usize,
    distance_model: Mutex<DistanceModel>,
    pub(crate) sources: Mutex<Vec<Weak<SourceInner>>>,
}

/// Generates factories for typed effects or filters.
macro_rules! typed_factories {
    ($base:ident, $kind:ident, $wrap:ident: $($(#[$meta:meta])* $fn_name:ident -> $ty:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(&self) -> Result<$ty, SoundError> {
                let object = $base::new(&self.api, &self.registry, $kind::$ty)?;
                Ok($ty::$wrap(object))
            }
        )*
    };
}

/// The sound system. See the module documentation.
pub struct System {
    api: Arc<Api>,
    registry: Arc<Registry>,
    devices: Mutex<Vec<Device>>,
    contexts: Mutex<Vec<Arc<Context>>>,
    current: Mutex<Option<Arc<Context>>>,
    listener: Listener,
    aux_sends: usize,
}

impl System {
    /// Load OpenAL, open the configured device and make a context on it
    /// current, both named [DEFAULT_NAME].
    pub fn new(options: &Options) -> Result<System, SoundError> {
        let al = OpenAl::load(options.library.as_deref())?;
        log_dbg!("Loaded OpenAL");
        System::from_library(al, options)
    }

    /// Like [Self::new], but with an already loaded implementation.
    pub fn from_library(al: OpenAl, options: &Options) -> Result<System, SoundError> {
        if SPAWNED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SoundError::AlreadySpawned);
        }
        let api = Arc::new(Api::new(al));
        // From here on, dropping the system on failure undoes everything,
        // including the SPAWNED flag.
        let system = System {
            listener: Listener::new(&api),
            api,
            registry: Arc::new(Registry::default()),
            devices: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
            current: Mutex::new(None),
            aux_sends: options.aux_sends as usize,
        };

        system.create_device(DEFAULT_NAME, options.device.as_deref())?;
        system.create_context(
            DEFAULT_NAME,
            DEFAULT_NAME,
            &ContextAttributes::from_options(options),
        )?;
        system.make_context_current(DEFAULT_NAME)?;
        system.set_distance_model(options.distance_model)?;
        if let Some(factor) = options.doppler_factor {
            system.set_doppler_factor(factor)?;
        }
        if let Some(speed) = options.speed_of_sound {
            system.set_speed_of_sound(speed)?;
        }

        log_dbg!(
            "Sound system started: {} {} ({})",
            system.vendor_name()?,
            system.renderer_name()?,
            system.version_name()?
        );
        Ok(system)
    }

    // === devices and contexts ===

    /// Open the output device called `specifier` ([None] for the default one)
    /// and refer to it as `name` from now on.
    pub fn create_device(&self, name: &str, specifier: Option<&str>) -> Result<(), SoundError> {
        let mut devices = self.devices.lock();
        if devices.iter().any(|device| device.name == name) {
            return Err(SoundError::DeviceOpen(name.to_string()));
        }
        let specifier_c = specifier
            .map(CString::new)
            .transpose()
            .map_err(|_| SoundError::DeviceOpen(name.to_string()))?;
        let raw = unsafe {
            (self.api.fns().alcOpenDevice)(
                specifier_c
                    .as_ref()
                    .map_or(std::ptr::null(), |specifier| specifier.as_ptr()),
            )
        };
        if raw.is_null() {
            return Err(SoundError::DeviceOpen(
                specifier.unwrap_or(name).to_string(),
            ));
        }
        let has_efx = self.api.has_efx() && self.api.alc_is_extension_present(raw, ALC_EXT_EFX_NAME);
        log_dbg!(
            "Opened device {:?} ({}), EFX: {}",
            name,
            self.api
                .alc_get_string(raw, ALC_DEVICE_SPECIFIER)
                .unwrap_or_default(),
            has_efx
        );
        devices.push(Device {
            name: name.to_string(),
            raw: DevicePtr(raw),
            has_efx,
        });
        Ok(())
    }

    /// Create a context called `name` on the device called `device`. The
    /// auxiliary send count is only requested if the device supports EFX.
    pub fn create_context(
        &self,
        device: &str,
        name: &str,
        attributes: &ContextAttributes,
    ) -> Result<(), SoundError> {
        let devices = self.devices.lock();
        let device = devices
            .iter()
            .find(|candidate| candidate.name == device)
            .ok_or_else(|| SoundError::UnknownDevice(device.to_string()))?;
        let mut contexts = self.contexts.lock();
        if contexts.iter().any(|context| context.name == name) {
            return Err(SoundError::ContextCreate(name.to_string()));
        }

        let mut attributes = attributes.clone();
        if !device.has_efx {
            attributes.max_auxiliary_sends = None;
        }
        let list = attributes.to_list();
        let raw = unsafe { (self.api.fns().alcCreateContext)(device.raw.0, list.as_ptr()) };
        if raw.is_null() {
            self.api.alc_error_check(device.raw.0, &device.name)?;
            return Err(SoundError::ContextCreate(name.to_string()));
        }

        let aux_sends = if device.has_efx {
            let max = self.api.alc_get_integer(device.raw.0, ALC_MAX_AUXILIARY_SENDS);
            self.aux_sends.min(max.max(0) as usize)
        } else {
            0
        };
        log_dbg!(
            "Created context {:?} on device {:?}, {} auxiliary sends",
            name,
            device.name,
            aux_sends
        );
        contexts.push(Arc::new(Context {
            name: name.to_string(),
            device_name: device.name.clone(),
            raw: ContextPtr(raw),
            device: device.raw,
            aux_sends,
            distance_model: Mutex::new(DistanceModel::default()),
            sources: Mutex::new(Vec::new()),
        }));
        Ok(())
    }

    /// Make the context called `name` current. The listener is per context,
    /// so the [Listener]'s mirrored state is sent to the new one.
    pub fn make_context_current(&self, name: &str) -> Result<(), SoundError> {
        let context = self
            .contexts
            .lock()
            .iter()
            .find(|context| context.name == name)
            .cloned()
            .ok_or_else(|| SoundError::UnknownContext(name.to_string()))?;
        if !self.api.make_context_current(context.raw.0) {
            return Err(SoundError::ContextCurrent(name.to_string()));
        }
        log_dbg!("Context {:?} is now current", name);
        *self.current.lock() = Some(context);
        self.listener.reset()
    }

    /// Suspend the current context, then leave no context current.
    pub fn nullify_current_context(&self) {
        let Some(context) = self.current.lock().take() else {
            return;
        };
        unsafe {
            (self.api.fns().alcSuspendContext)(context.raw.0);
        }
        self.api.make_context_current(std::ptr::null_mut());
        log_dbg!("Context {:?} is no longer current", context.name);
    }

    pub fn suspend_current_context(&self) -> Result<(), SoundError> {
        let context = self.current_context()?;
        unsafe { (self.api.fns().alcSuspendContext)(context.raw.0) };
        Ok(())
    }

    pub fn process_current_context(&self) -> Result<(), SoundError> {
        let context = self.current_context()?;
        unsafe { (self.api.fns().alcProcessContext)(context.raw.0) };
        Ok(())
    }

    /// Name of the current context, if any.
    pub fn current_context_name(&self) -> Option<String> {
        self.current.lock().as_ref().map(|context| context.name.clone())
    }

    /// Name of the device of the current context, if any.
    pub fn current_device_name(&self) -> Option<String> {
        self.current
            .lock()
            .as_ref()
            .map(|context| context.device_name.clone())
    }

    fn current_context(&self) -> Result<Arc<Context>, SoundError> {
        self.current.lock().clone().ok_or(SoundError::NoContext)
    }

    fn enumerates_all(&self) -> bool {
        self.api
            .alc_is_extension_present(std::ptr::null_mut(), "ALC_ENUMERATE_ALL_EXT")
    }

    /// Names of the available output devices.
    pub fn device_names(&self) -> Vec<String> {
        let param = if self.enumerates_all() {
            ALC_ALL_DEVICES_SPECIFIER
        } else {
            ALC_DEVICE_SPECIFIER
        };
        self.api.alc_get_string_list(std::ptr::null_mut(), param)
    }

    /// Names of the available capture devices.
    pub fn capture_device_names(&self) -> Vec<String> {
        self.api
            .alc_get_string_list(std::ptr::null_mut(), ALC_CAPTURE_DEVICE_SPECIFIER)
    }

    pub fn default_device_name(&self) -> Option<String> {
        let param = if self.enumerates_all() {
            ALC_DEFAULT_ALL_DEVICES_SPECIFIER
        } else {
            ALC_DEFAULT_DEVICE_SPECIFIER
        };
        self.api.alc_get_string(std::ptr::null_mut(), param)
    }

    // === factories ===

    /// Create a source in the current context.
    pub fn create_source(&self, auto_velocity: bool) -> Result<Source, SoundError> {
        let context = self.current_context()?;
        Source::new(&self.api, &self.registry, &context, auto_velocity)
    }

    /// The live sources created in the current context.
    pub fn sources_in_current_context(&self) -> Result<Vec<Source>, SoundError> {
        let context = self.current_context()?;
        let sources = context.sources.lock();
        Ok(sources
            .iter()
            .filter_map(Weak::upgrade)
            .map(Source::from_inner)
            .collect())
    }

    pub fn create_buffer(&self) -> Result<Buffer, SoundError> {
        Buffer::new(&self.api, &self.registry)
    }

    pub fn create_buffers(&self, count: usize) -> Result<Vec<Buffer>, SoundError> {
        Buffer::new_many(&self.api, &self.registry, count)
    }

    /// Create a buffer holding everything `decoder` has left to decode.
    pub fn create_buffer_from_decoder(&self, decoder: &mut Decoder) -> Result<Buffer, SoundError> {
        Buffer::from_decoder(&self.api, &self.registry, decoder)
    }

    /// Create a buffer holding the decoded contents of an audio file.
    pub fn create_buffer_from_file(&self, path: &Path) -> Result<Buffer, SoundError> {
        let file = AudioFile::open(path)?;
        let mut decoder = file.decoder()?;
        self.create_buffer_from_decoder(&mut decoder)
    }

    pub fn create_effect_slot(&self) -> Result<EffectSlot, SoundError> {
        EffectSlot::new(&self.api, &self.registry)
    }

    /// Create an effect of any type, with every parameter at its default.
    pub fn create_effect(&self, effect_type: EffectType) -> Result<AnyEffect, SoundError> {
        let effect = Effect::new(&self.api, &self.registry, effect_type)?;
        Ok(AnyEffect::from_effect(effect))
    }

    typed_factories! {
        Effect, EffectType, from_effect:
        create_autowah -> Autowah;
        create_chorus -> Chorus;
        create_compressor -> Compressor;
        create_distortion -> Distortion;
        create_echo -> Echo;
        create_equalizer -> Equalizer;
        create_flanger -> Flanger;
        create_frequency_shifter -> FrequencyShifter;
        create_pitch_shifter -> PitchShifter;
        create_reverb -> Reverb;
        create_ring_modulator -> RingModulator;
        create_vocal_morpher -> VocalMorpher;
    }

    /// Create a filter of any type, with every parameter at its default.
    pub fn create_filter(&self, filter_type: FilterType) -> Result<AnyFilter, SoundError> {
        let filter = Filter::new(&self.api, &self.registry, filter_type)?;
        Ok(AnyFilter::from_filter(filter))
    }

    typed_factories! {
        Filter, FilterType, from_filter:
        create_low_pass -> LowPass;
        create_high_pass -> HighPass;
        create_band_pass -> BandPass;
    }

    // === global state ===

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Make a call on the current context, with error checking.
    fn call<T>(&self, f: impl FnOnce(&Functions) -> T) -> Result<T, SoundError> {
        self.current_context()?;
        self.api.clear_error();
        let result = f(self.api.fns());
        self.api.error_check("System")?;
        Ok(result)
    }

    pub fn renderer_name(&self) -> Result<String, SoundError> {
        self.api.get_string(AL_RENDERER)
    }

    pub fn version_name(&self) -> Result<String, SoundError> {
        self.api.get_string(AL_VERSION)
    }

    pub fn vendor_name(&self) -> Result<String, SoundError> {
        self.api.get_string(AL_VENDOR)
    }

    /// The AL extensions of the current context.
    pub fn extensions(&self) -> Result<Vec<String>, SoundError> {
        Ok(self
            .api
            .get_string(AL_EXTENSIONS)?
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect())
    }

    /// Check for an AL extension, or an ALC extension (`ALC_` prefix) of the
    /// current device.
    pub fn is_extension_present(&self, name: &str) -> Result<bool, SoundError> {
        let context = self.current_context()?;
        if name.starts_with("ALC_") {
            Ok(self.api.alc_is_extension_present(context.device.0, name))
        } else {
            Ok(self.api.is_extension_present(name))
        }
    }

    /// Whether EFX objects can be created for the current device.
    pub fn is_efx_available(&self) -> bool {
        self.current_context()
            .map(|context| {
                self.api.has_efx()
                    && self
                        .api
                        .alc_is_extension_present(context.device.0, ALC_EXT_EFX_NAME)
            })
            .unwrap_or(false)
    }

    /// Number of auxiliary sends new sources in the current context get.
    pub fn max_auxiliary_sends(&self) -> Result<usize, SoundError> {
        Ok(self.current_context()?.aux_sends)
    }

    pub fn doppler_factor(&self) -> Result<f32, SoundError> {
        self.call(|fns| unsafe { (fns.alGetFloat)(AL_DOPPLER_FACTOR) })
    }

    /// Negative values become 0, which disables the doppler effect.
    pub fn set_doppler_factor(&self, factor: f32) -> Result<(), SoundError> {
        let factor = factor.max(0.0);
        self.call(|fns| unsafe { (fns.alDopplerFactor)(factor) })
    }

    pub fn speed_of_sound(&self) -> Result<f32, SoundError> {
        self.call(|fns| unsafe { (fns.alGetFloat)(AL_SPEED_OF_SOUND) })
    }

    /// In units per second. Must be positive.
    pub fn set_speed_of_sound(&self, speed: f32) -> Result<(), SoundError> {
        self.call(|fns| unsafe { (fns.alSpeedOfSound)(speed) })
    }

    /// The distance model of the current context.
    pub fn distance_model(&self) -> Result<DistanceModel, SoundError> {
        Ok(*self.current_context()?.distance_model.lock())
    }

    pub fn set_distance_model(&self, model: DistanceModel) -> Result<(), SoundError> {
        let context = self.current_context()?;
        let mut current = context.distance_model.lock();
        self.call(|fns| unsafe { (fns.alDistanceModel)(model.al_value()) })?;
        *current = model;
        Ok(())
    }

    /// Number of live objects of every kind.
    pub fn object_count(&self) -> usize {
        self.registry.len()
    }

    /// Free every object, then destroy every context and close every device.
    /// Handles still held afterwards report that they aren't allocated.
    /// Teardown carries on past failures; the first one is returned. Calling
    /// this again does nothing.
    pub fn shutdown(&self) -> Result<(), SoundError> {
        // Each object makes its own context current while it is deleted.
        let result = self.registry.destroy_all();

        self.current.lock().take();
        self.api.make_context_current(std::ptr::null_mut());
        for context in self.contexts.lock().drain(..) {
            unsafe { (self.api.fns().alcDestroyContext)(context.raw.0) };
            log_dbg!("Destroyed context {:?}", context.name);
        }
        for device in self.devices.lock().drain(..) {
            if unsafe { (self.api.fns().alcCloseDevice)(device.raw.0) } != ALC_TRUE {
                log!("Couldn't close device {:?}", device.name);
            }
            log_dbg!("Closed device {:?}", device.name);
        }
        result
    }
}

impl Drop for System {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log!("Error during sound system shutdown: {}", err);
        }
        SPAWNED.store(false, Ordering::SeqCst);
    }
}
