/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! A fake OpenAL driver for unit tests.
//!
//! The entry points record what they are told in a global [Driver] and enforce
//! the handful of native rules the wrappers rely on: names must be live,
//! attached buffers can't be deleted, only processed buffers can be unqueued,
//! and so on. Like a real implementation, sources and effect slots are named
//! per context and everything else per device, so each namespace counts from
//! 1. The inspection helpers look in the namespaces of the current context.
//! Tests that create a [System] hold a lock for the lifetime of the system, so
//! the global state is never shared between two tests.

#![allow(clippy::missing_safety_doc)]

use crate::audio::openal::*;
use crate::object::ObjectKind;
use crate::options::Options;
use crate::system::System;
use parking_lot::{const_mutex, Mutex, MutexGuard};
use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::ops::Deref;

static SERIAL: Mutex<()> = const_mutex(());
static DRIVER: Mutex<Option<Driver>> = const_mutex(None);

const MAX_AUX_SENDS: ALCint = 4;
const DEVICE_NAMES: &[u8] = b"Fake Device\0Other Device\0\0";

#[derive(Default)]
struct FakeObject {
    ints: HashMap<ALenum, ALint>,
    floats: HashMap<ALenum, f32>,
    vectors: HashMap<ALenum, Vec<f32>>,
    sends: HashMap<ALint, (ALint, ALint)>,
    queue: VecDeque<ALuint>,
    processed: usize,
    state: ALint,
    data: Option<(ALenum, usize, i32)>,
}

/// A context or device handle, which is also the namespace of the object
/// names allocated in it. 0 when no context is current.
type Scope = usize;

struct Driver {
    efx: bool,
    next_handle: usize,
    next_ids: HashMap<(Scope, ObjectKind), ALuint>,
    error: ALenum,
    fail_next: Option<ALenum>,
    objects: HashMap<(Scope, ObjectKind, ALuint), FakeObject>,
    /// Keyed by context.
    listener: HashMap<(Scope, ALenum), Vec<f32>>,
    doppler_factor: f32,
    speed_of_sound: f32,
    distance_model: ALenum,
    devices: Vec<usize>,
    /// Context to device.
    contexts: HashMap<usize, usize>,
    current_context: usize,
    last_attributes: Vec<ALCint>,
}

impl Driver {
    fn new(efx: bool) -> Driver {
        Driver {
            efx,
            next_handle: 1,
            next_ids: HashMap::new(),
            error: AL_NO_ERROR,
            fail_next: None,
            objects: HashMap::new(),
            listener: HashMap::new(),
            doppler_factor: 1.0,
            speed_of_sound: 343.3,
            distance_model: AL_INVERSE_DISTANCE_CLAMPED,
            devices: Vec::new(),
            contexts: HashMap::new(),
            current_context: 0,
            last_attributes: Vec::new(),
        }
    }

    fn set_error(&mut self, code: ALenum) {
        if self.error == AL_NO_ERROR {
            self.error = code;
        }
    }

    /// Returns `false` if the call was made to fail with [fail_next_call].
    fn begin_call(&mut self) -> bool {
        match self.fail_next.take() {
            Some(code) => {
                self.set_error(code);
                false
            }
            None => true,
        }
    }

    fn next_handle(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Where names of `kind` live from the point of view of the current
    /// context.
    fn scope(&self, kind: ObjectKind) -> Scope {
        match kind {
            ObjectKind::Source | ObjectKind::EffectSlot => self.current_context,
            ObjectKind::Effect | ObjectKind::Filter | ObjectKind::Buffer => self
                .contexts
                .get(&self.current_context)
                .copied()
                .unwrap_or(0),
        }
    }

    fn key(&self, kind: ObjectKind, id: ALuint) -> (Scope, ObjectKind, ALuint) {
        (self.scope(kind), kind, id)
    }

    fn is_live(&self, kind: ObjectKind, id: ALuint) -> bool {
        self.objects.contains_key(&self.key(kind, id))
    }

    /// Whether a source in any context of the current device uses the buffer.
    fn is_buffer_attached(&self, id: ALuint) -> bool {
        let device = self.scope(ObjectKind::Buffer);
        self.objects.iter().any(|((scope, kind, _), object)| {
            *kind == ObjectKind::Source
                && self.contexts.get(scope) == Some(&device)
                && (object.ints.get(&AL_BUFFER) == Some(&(id as ALint))
                    || object.queue.contains(&id))
        })
    }

    fn generate(&mut self, kind: ObjectKind, n: ALsizei, out: *mut ALuint) {
        if !self.begin_call() {
            return;
        }
        let scope = self.scope(kind);
        if scope == 0 {
            return self.set_error(AL_INVALID_OPERATION);
        }
        for i in 0..n.max(0) as usize {
            let next = self.next_ids.entry((scope, kind)).or_insert(1);
            let id = *next;
            *next += 1;
            let object = FakeObject {
                state: AL_INITIAL,
                ..FakeObject::default()
            };
            self.objects.insert((scope, kind, id), object);
            unsafe { *out.add(i) = id };
        }
    }

    fn delete(&mut self, kind: ObjectKind, n: ALsizei, ids: *const ALuint) {
        if !self.begin_call() {
            return;
        }
        let ids = unsafe { std::slice::from_raw_parts(ids, n.max(0) as usize) };
        if ids.iter().any(|&id| id != 0 && !self.is_live(kind, id)) {
            return self.set_error(AL_INVALID_NAME);
        }
        if kind == ObjectKind::Buffer && ids.iter().any(|&id| self.is_buffer_attached(id)) {
            return self.set_error(AL_INVALID_OPERATION);
        }
        for &id in ids {
            let key = self.key(kind, id);
            self.objects.remove(&key);
        }
    }

    /// Apply `f` to a live object, or set `AL_INVALID_NAME`.
    fn with_object(&mut self, kind: ObjectKind, id: ALuint, f: impl FnOnce(&mut FakeObject)) {
        if !self.begin_call() {
            return;
        }
        let key = self.key(kind, id);
        match self.objects.get_mut(&key) {
            Some(object) => f(object),
            None => self.set_error(AL_INVALID_NAME),
        }
    }

    /// Check that `id` names a live object of `kind` or is 0.
    fn check_reference(&mut self, kind: ObjectKind, id: ALint) -> bool {
        if id == 0 || self.is_live(kind, id as ALuint) {
            true
        } else {
            self.set_error(AL_INVALID_VALUE);
            false
        }
    }
}

fn driver() -> parking_lot::MappedMutexGuard<'static, Driver> {
    MutexGuard::map(DRIVER.lock(), |driver| {
        driver.get_or_insert_with(|| Driver::new(true))
    })
}

// === entry points ===

unsafe extern "C" fn alc_open_device(name: *const ALCchar) -> *mut ALCdevice {
    if !name.is_null() {
        let name = CStr::from_ptr(name).to_bytes();
        if !DEVICE_NAMES
            .split(|&byte| byte == 0)
            .any(|known| !known.is_empty() && known == name)
        {
            return std::ptr::null_mut();
        }
    }
    let mut driver = driver();
    let handle = 0x1000 + driver.next_handle();
    driver.devices.push(handle);
    handle as *mut ALCdevice
}

unsafe extern "C" fn alc_close_device(device: *mut ALCdevice) -> ALCboolean {
    let mut driver = driver();
    let before = driver.devices.len();
    driver.devices.retain(|&handle| handle != device as usize);
    if driver.devices.len() == before {
        ALC_FALSE
    } else {
        ALC_TRUE
    }
}

unsafe extern "C" fn alc_create_context(
    device: *mut ALCdevice,
    attributes: *const ALCint,
) -> *mut ALCcontext {
    let mut list = Vec::new();
    if !attributes.is_null() {
        let mut i = 0;
        loop {
            let key = *attributes.add(i);
            list.push(key);
            if key == 0 {
                break;
            }
            list.push(*attributes.add(i + 1));
            i += 2;
        }
    }
    let mut driver = driver();
    driver.last_attributes = list;
    let handle = 0x2000 + driver.next_handle();
    driver.contexts.insert(handle, device as usize);
    handle as *mut ALCcontext
}

unsafe extern "C" fn alc_destroy_context(context: *mut ALCcontext) {
    let mut driver = driver();
    let context = context as usize;
    driver.contexts.remove(&context);
    if driver.current_context == context {
        driver.current_context = 0;
    }
}

unsafe extern "C" fn alc_make_context_current(context: *mut ALCcontext) -> ALCboolean {
    let mut driver = driver();
    let context = context as usize;
    if context == 0 || driver.contexts.contains_key(&context) {
        driver.current_context = context;
        ALC_TRUE
    } else {
        ALC_FALSE
    }
}

unsafe extern "C" fn alc_get_current_context() -> *mut ALCcontext {
    driver().current_context as *mut ALCcontext
}

unsafe extern "C" fn alc_process_context(_context: *mut ALCcontext) {}

unsafe extern "C" fn alc_suspend_context(_context: *mut ALCcontext) {}

unsafe extern "C" fn alc_get_error(_device: *mut ALCdevice) -> ALCenum {
    ALC_NO_ERROR
}

unsafe extern "C" fn alc_get_string(device: *mut ALCdevice, param: ALCenum) -> *const ALCchar {
    let value: &'static [u8] = match param {
        ALC_DEVICE_SPECIFIER | ALC_ALL_DEVICES_SPECIFIER if device.is_null() => DEVICE_NAMES,
        ALC_DEVICE_SPECIFIER | ALC_ALL_DEVICES_SPECIFIER => b"Fake Device\0\0",
        ALC_DEFAULT_DEVICE_SPECIFIER | ALC_DEFAULT_ALL_DEVICES_SPECIFIER => b"Fake Device\0\0",
        ALC_CAPTURE_DEVICE_SPECIFIER => b"Fake Microphone\0\0",
        ALC_EXTENSIONS => b"ALC_EXT_EFX ALC_ENUMERATE_ALL_EXT\0",
        _ => return std::ptr::null(),
    };
    value.as_ptr().cast()
}

unsafe extern "C" fn alc_is_extension_present(
    _device: *mut ALCdevice,
    name: *const ALCchar,
) -> ALCboolean {
    match CStr::from_ptr(name).to_bytes() {
        b"ALC_EXT_EFX" => driver().efx as ALCboolean,
        b"ALC_ENUMERATE_ALL_EXT" => ALC_TRUE,
        _ => ALC_FALSE,
    }
}

unsafe extern "C" fn alc_get_integerv(
    _device: *mut ALCdevice,
    param: ALCenum,
    size: ALCsizei,
    values: *mut ALCint,
) {
    if size < 1 {
        return;
    }
    *values = match param {
        ALC_MAX_AUXILIARY_SENDS if driver().efx => MAX_AUX_SENDS,
        ALC_MAJOR_VERSION | ALC_MINOR_VERSION => 1,
        _ => 0,
    };
}

unsafe extern "C" fn al_get_error() -> ALenum {
    std::mem::replace(&mut driver().error, AL_NO_ERROR)
}

unsafe extern "C" fn al_get_string(param: ALenum) -> *const ALchar {
    let value: &'static [u8] = match param {
        AL_NO_ERROR => b"No Error\0",
        AL_INVALID_NAME => b"Invalid Name\0",
        AL_INVALID_ENUM => b"Invalid Enum\0",
        AL_INVALID_VALUE => b"Invalid Value\0",
        AL_INVALID_OPERATION => b"Invalid Operation\0",
        AL_OUT_OF_MEMORY => b"Out of Memory\0",
        AL_VENDOR => b"oal test driver\0",
        AL_VERSION => b"1.1\0",
        AL_RENDERER => b"Fake Renderer\0",
        AL_EXTENSIONS => b"AL_EXT_OFFSET AL_EXT_LINEAR_DISTANCE AL_EXT_EXPONENT_DISTANCE\0",
        _ => {
            driver().set_error(AL_INVALID_ENUM);
            return std::ptr::null();
        }
    };
    value.as_ptr().cast()
}

unsafe extern "C" fn al_is_extension_present(name: *const ALchar) -> ALboolean {
    let name = CStr::from_ptr(name).to_bytes();
    b"AL_EXT_OFFSET AL_EXT_LINEAR_DISTANCE AL_EXT_EXPONENT_DISTANCE"
        .split(|&byte| byte == b' ')
        .any(|known| known == name) as ALboolean
}

unsafe extern "C" fn al_get_float(param: ALenum) -> ALfloat {
    let mut driver = driver();
    match param {
        AL_DOPPLER_FACTOR => driver.doppler_factor,
        AL_SPEED_OF_SOUND => driver.speed_of_sound,
        _ => {
            driver.set_error(AL_INVALID_ENUM);
            0.0
        }
    }
}

unsafe extern "C" fn al_doppler_factor(value: ALfloat) {
    let mut driver = driver();
    if !driver.begin_call() {
        return;
    }
    if value < 0.0 {
        driver.set_error(AL_INVALID_VALUE);
    } else {
        driver.doppler_factor = value;
    }
}

unsafe extern "C" fn al_speed_of_sound(value: ALfloat) {
    let mut driver = driver();
    if !driver.begin_call() {
        return;
    }
    if value <= 0.0 {
        driver.set_error(AL_INVALID_VALUE);
    } else {
        driver.speed_of_sound = value;
    }
}

unsafe extern "C" fn al_distance_model(value: ALenum) {
    let mut driver = driver();
    if !driver.begin_call() {
        return;
    }
    let known = value == AL_NONE || (AL_INVERSE_DISTANCE..=AL_EXPONENT_DISTANCE_CLAMPED).contains(&value);
    if known {
        driver.distance_model = value;
    } else {
        driver.set_error(AL_INVALID_VALUE);
    }
}

unsafe extern "C" fn al_listenerf(param: ALenum, value: ALfloat) {
    let mut driver = driver();
    if driver.begin_call() {
        let context = driver.current_context;
        driver.listener.insert((context, param), vec![value]);
    }
}

unsafe extern "C" fn al_listenerfv(param: ALenum, values: *const ALfloat) {
    let count = if param == AL_ORIENTATION { 6 } else { 3 };
    let values = std::slice::from_raw_parts(values, count).to_vec();
    let mut driver = driver();
    if driver.begin_call() {
        let context = driver.current_context;
        driver.listener.insert((context, param), values);
    }
}

unsafe extern "C" fn al_gen_sources(n: ALsizei, ids: *mut ALuint) {
    driver().generate(ObjectKind::Source, n, ids);
}

unsafe extern "C" fn al_delete_sources(n: ALsizei, ids: *const ALuint) {
    driver().delete(ObjectKind::Source, n, ids);
}

unsafe extern "C" fn al_sourcef(id: ALuint, param: ALenum, value: ALfloat) {
    driver().with_object(ObjectKind::Source, id, |source| {
        source.floats.insert(param, value);
    });
}

unsafe extern "C" fn al_sourcefv(id: ALuint, param: ALenum, values: *const ALfloat) {
    let values = std::slice::from_raw_parts(values, 3).to_vec();
    driver().with_object(ObjectKind::Source, id, |source| {
        source.vectors.insert(param, values);
    });
}

unsafe extern "C" fn al_sourcei(id: ALuint, param: ALenum, value: ALint) {
    let mut driver = driver();
    let reference_ok = match param {
        AL_BUFFER => driver.check_reference(ObjectKind::Buffer, value),
        AL_DIRECT_FILTER => driver.check_reference(ObjectKind::Filter, value),
        _ => true,
    };
    if !reference_ok {
        return;
    }
    let mut invalid_operation = false;
    driver.with_object(ObjectKind::Source, id, |source| {
        if param == AL_BUFFER {
            if source.state == AL_PLAYING || source.state == AL_PAUSED {
                invalid_operation = true;
                return;
            }
            source.queue.clear();
            source.processed = 0;
        }
        source.ints.insert(param, value);
    });
    if invalid_operation {
        driver.set_error(AL_INVALID_OPERATION);
    }
}

unsafe extern "C" fn al_source3i(id: ALuint, param: ALenum, v1: ALint, v2: ALint, v3: ALint) {
    let mut driver = driver();
    if param != AL_AUXILIARY_SEND_FILTER {
        return driver.set_error(AL_INVALID_ENUM);
    }
    if !(0..MAX_AUX_SENDS).contains(&v2)
        || !driver.check_reference(ObjectKind::EffectSlot, v1)
        || !driver.check_reference(ObjectKind::Filter, v3)
    {
        return driver.set_error(AL_INVALID_VALUE);
    }
    driver.with_object(ObjectKind::Source, id, |source| {
        source.sends.insert(v2, (v1, v3));
    });
}

unsafe extern "C" fn al_get_sourcef(id: ALuint, param: ALenum, value: *mut ALfloat) {
    driver().with_object(ObjectKind::Source, id, |source| {
        *value = source.floats.get(&param).copied().unwrap_or(0.0);
    });
}

unsafe extern "C" fn al_get_sourcei(id: ALuint, param: ALenum, value: *mut ALint) {
    driver().with_object(ObjectKind::Source, id, |source| {
        *value = match param {
            AL_SOURCE_STATE => source.state,
            AL_BUFFERS_QUEUED => source.queue.len() as ALint,
            AL_BUFFERS_PROCESSED => source.processed as ALint,
            _ => source.ints.get(&param).copied().unwrap_or(0),
        };
    });
}

unsafe extern "C" fn al_source_play(id: ALuint) {
    driver().with_object(ObjectKind::Source, id, |source| {
        source.state = AL_PLAYING;
        source.processed = 0;
    });
}

unsafe extern "C" fn al_source_pause(id: ALuint) {
    driver().with_object(ObjectKind::Source, id, |source| {
        if source.state == AL_PLAYING {
            source.state = AL_PAUSED;
        }
    });
}

unsafe extern "C" fn al_source_stop(id: ALuint) {
    driver().with_object(ObjectKind::Source, id, |source| {
        source.state = AL_STOPPED;
        source.processed = source.queue.len();
    });
}

unsafe extern "C" fn al_source_rewind(id: ALuint) {
    driver().with_object(ObjectKind::Source, id, |source| {
        source.state = AL_INITIAL;
        source.processed = 0;
    });
}

unsafe extern "C" fn al_source_queue_buffers(id: ALuint, n: ALsizei, ids: *const ALuint) {
    let ids = std::slice::from_raw_parts(ids, n.max(0) as usize).to_vec();
    let mut driver = driver();
    if ids.iter().any(|&buffer| !driver.is_live(ObjectKind::Buffer, buffer)) {
        return driver.set_error(AL_INVALID_NAME);
    }
    let mut invalid_operation = false;
    driver.with_object(ObjectKind::Source, id, |source| {
        if source.ints.get(&AL_BUFFER).copied().unwrap_or(0) != 0 {
            invalid_operation = true;
            return;
        }
        source.queue.extend(ids);
    });
    if invalid_operation {
        driver.set_error(AL_INVALID_OPERATION);
    }
}

unsafe extern "C" fn al_source_unqueue_buffers(id: ALuint, n: ALsizei, ids: *mut ALuint) {
    let mut driver = driver();
    let mut invalid_value = false;
    driver.with_object(ObjectKind::Source, id, |source| {
        let n = n.max(0) as usize;
        if n > source.processed {
            invalid_value = true;
            return;
        }
        for i in 0..n {
            if let Some(buffer) = source.queue.pop_front() {
                *ids.add(i) = buffer;
            }
        }
        source.processed -= n;
    });
    if invalid_value {
        driver.set_error(AL_INVALID_VALUE);
    }
}

unsafe extern "C" fn al_gen_buffers(n: ALsizei, ids: *mut ALuint) {
    driver().generate(ObjectKind::Buffer, n, ids);
}

unsafe extern "C" fn al_delete_buffers(n: ALsizei, ids: *const ALuint) {
    driver().delete(ObjectKind::Buffer, n, ids);
}

unsafe extern "C" fn al_buffer_data(
    id: ALuint,
    format: ALenum,
    _data: *const ALvoid,
    size: ALsizei,
    frequency: ALsizei,
) {
    driver().with_object(ObjectKind::Buffer, id, |buffer| {
        buffer.data = Some((format, size as usize, frequency));
    });
}

unsafe extern "C" fn al_gen_effects(n: ALsizei, ids: *mut ALuint) {
    driver().generate(ObjectKind::Effect, n, ids);
}

unsafe extern "C" fn al_delete_effects(n: ALsizei, ids: *const ALuint) {
    driver().delete(ObjectKind::Effect, n, ids);
}

unsafe extern "C" fn al_effecti(id: ALuint, param: ALenum, value: ALint) {
    driver().with_object(ObjectKind::Effect, id, |effect| {
        effect.ints.insert(param, value);
    });
}

unsafe extern "C" fn al_effectf(id: ALuint, param: ALenum, value: ALfloat) {
    driver().with_object(ObjectKind::Effect, id, |effect| {
        effect.floats.insert(param, value);
    });
}

unsafe extern "C" fn al_gen_filters(n: ALsizei, ids: *mut ALuint) {
    driver().generate(ObjectKind::Filter, n, ids);
}

unsafe extern "C" fn al_delete_filters(n: ALsizei, ids: *const ALuint) {
    driver().delete(ObjectKind::Filter, n, ids);
}

unsafe extern "C" fn al_filteri(id: ALuint, param: ALenum, value: ALint) {
    driver().with_object(ObjectKind::Filter, id, |filter| {
        filter.ints.insert(param, value);
    });
}

unsafe extern "C" fn al_filterf(id: ALuint, param: ALenum, value: ALfloat) {
    driver().with_object(ObjectKind::Filter, id, |filter| {
        filter.floats.insert(param, value);
    });
}

unsafe extern "C" fn al_gen_auxiliary_effect_slots(n: ALsizei, ids: *mut ALuint) {
    driver().generate(ObjectKind::EffectSlot, n, ids);
}

unsafe extern "C" fn al_delete_auxiliary_effect_slots(n: ALsizei, ids: *const ALuint) {
    driver().delete(ObjectKind::EffectSlot, n, ids);
}

unsafe extern "C" fn al_auxiliary_effect_sloti(id: ALuint, param: ALenum, value: ALint) {
    let mut driver = driver();
    if param == AL_EFFECTSLOT_EFFECT && !driver.check_reference(ObjectKind::Effect, value) {
        return;
    }
    driver.with_object(ObjectKind::EffectSlot, id, |slot| {
        slot.ints.insert(param, value);
    });
}

unsafe extern "C" fn al_auxiliary_effect_slotf(id: ALuint, param: ALenum, value: ALfloat) {
    driver().with_object(ObjectKind::EffectSlot, id, |slot| {
        slot.floats.insert(param, value);
    });
}

/// The fake driver's function tables, as if loaded from a library.
pub fn fake_library(efx: bool) -> OpenAl {
    let fns = Functions {
        alcOpenDevice: alc_open_device,
        alcCloseDevice: alc_close_device,
        alcCreateContext: alc_create_context,
        alcDestroyContext: alc_destroy_context,
        alcMakeContextCurrent: alc_make_context_current,
        alcGetCurrentContext: alc_get_current_context,
        alcProcessContext: alc_process_context,
        alcSuspendContext: alc_suspend_context,
        alcGetError: alc_get_error,
        alcGetString: alc_get_string,
        alcIsExtensionPresent: alc_is_extension_present,
        alcGetIntegerv: alc_get_integerv,
        alGetError: al_get_error,
        alGetString: al_get_string,
        alIsExtensionPresent: al_is_extension_present,
        alGetFloat: al_get_float,
        alDopplerFactor: al_doppler_factor,
        alSpeedOfSound: al_speed_of_sound,
        alDistanceModel: al_distance_model,
        alListenerf: al_listenerf,
        alListenerfv: al_listenerfv,
        alGenSources: al_gen_sources,
        alDeleteSources: al_delete_sources,
        alSourcef: al_sourcef,
        alSourcefv: al_sourcefv,
        alSourcei: al_sourcei,
        alSource3i: al_source3i,
        alGetSourcef: al_get_sourcef,
        alGetSourcei: al_get_sourcei,
        alSourcePlay: al_source_play,
        alSourcePause: al_source_pause,
        alSourceStop: al_source_stop,
        alSourceRewind: al_source_rewind,
        alSourceQueueBuffers: al_source_queue_buffers,
        alSourceUnqueueBuffers: al_source_unqueue_buffers,
        alGenBuffers: al_gen_buffers,
        alDeleteBuffers: al_delete_buffers,
        alBufferData: al_buffer_data,
    };
    let efx = efx.then_some(EfxFunctions {
        alGenEffects: al_gen_effects,
        alDeleteEffects: al_delete_effects,
        alEffecti: al_effecti,
        alEffectf: al_effectf,
        alGenFilters: al_gen_filters,
        alDeleteFilters: al_delete_filters,
        alFilteri: al_filteri,
        alFilterf: al_filterf,
        alGenAuxiliaryEffectSlots: al_gen_auxiliary_effect_slots,
        alDeleteAuxiliaryEffectSlots: al_delete_auxiliary_effect_slots,
        alAuxiliaryEffectSloti: al_auxiliary_effect_sloti,
        alAuxiliaryEffectSlotf: al_auxiliary_effect_slotf,
    });
    OpenAl::from_functions(fns, efx)
}

// === setup ===

/// A [System] on the fake driver. Holds the test lock until dropped.
pub struct TestSystem {
    // Dropped before the lock is released.
    system: System,
    _serial: MutexGuard<'static, ()>,
}

impl Deref for TestSystem {
    type Target = System;

    fn deref(&self) -> &System {
        &self.system
    }
}

fn start(options: &Options, efx: bool) -> TestSystem {
    let serial = SERIAL.lock();
    *DRIVER.lock() = Some(Driver::new(efx));
    let system = System::from_library(fake_library(efx), options).unwrap();
    TestSystem {
        system,
        _serial: serial,
    }
}

pub fn system() -> TestSystem {
    start(&Options::default(), true)
}

pub fn system_with(options: &Options) -> TestSystem {
    start(options, true)
}

pub fn system_without_efx() -> TestSystem {
    start(&Options::default(), false)
}

// === inspection ===

pub fn is_live(kind: ObjectKind, id: ALuint) -> bool {
    driver().is_live(kind, id)
}

pub fn int(kind: ObjectKind, id: ALuint, param: ALenum) -> Option<ALint> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(kind, id))
        .and_then(|object| object.ints.get(&param).copied())
}

pub fn float(kind: ObjectKind, id: ALuint, param: ALenum) -> Option<f32> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(kind, id))
        .and_then(|object| object.floats.get(&param).copied())
}

pub fn vector(kind: ObjectKind, id: ALuint, param: ALenum) -> Option<Vec<f32>> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(kind, id))
        .and_then(|object| object.vectors.get(&param).cloned())
}

/// The (effect slot, filter) pair of a source's auxiliary send.
pub fn send(source: ALuint, index: ALint) -> Option<(ALint, ALint)> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(ObjectKind::Source, source))
        .and_then(|object| object.sends.get(&index).copied())
}

pub fn queue(source: ALuint) -> Vec<ALuint> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(ObjectKind::Source, source))
        .map(|object| object.queue.iter().copied().collect())
        .unwrap_or_default()
}

pub fn source_state(source: ALuint) -> Option<ALint> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(ObjectKind::Source, source))
        .map(|object| object.state)
}

/// Pretend playback has finished `count` more queued buffers.
pub fn mark_processed(source: ALuint, count: usize) {
    let mut driver = driver();
    let key = driver.key(ObjectKind::Source, source);
    if let Some(object) = driver.objects.get_mut(&key) {
        object.processed = (object.processed + count).min(object.queue.len());
    }
}

/// The (format, size, frequency) last passed to `alBufferData`.
pub fn buffer_data(buffer: ALuint) -> Option<(ALenum, usize, i32)> {
    let driver = driver();
    driver
        .objects
        .get(&driver.key(ObjectKind::Buffer, buffer))
        .and_then(|object| object.data)
}

/// What the current context's listener was last told about `param`.
pub fn listener_vector(param: ALenum) -> Option<Vec<f32>> {
    let driver = driver();
    driver
        .listener
        .get(&(driver.current_context, param))
        .cloned()
}

pub fn distance_model() -> ALenum {
    driver().distance_model
}

pub fn last_attributes() -> Vec<ALCint> {
    driver().last_attributes.clone()
}

pub fn open_device_count() -> usize {
    driver().devices.len()
}

/// Live objects in every context and device.
pub fn live_object_count() -> usize {
    driver().objects.len()
}

/// Make the next driver call that does anything fail with `code`.
pub fn fail_next_call(code: ALenum) {
    driver().fail_next = Some(code);
}

/// A WAV file of a sine wave.
pub fn wav_bytes(channels: u16, bits: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(std::io::Cursor::new(&mut bytes), spec).unwrap();
        for frame in 0..frames {
            let phase = frame as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32;
            for _ in 0..channels {
                match bits {
                    8 => writer.write_sample((phase.sin() * 100.0) as i8).unwrap(),
                    _ => writer.write_sample((phase.sin() * 20000.0) as i16).unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}
