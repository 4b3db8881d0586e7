/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! OpenAL sources.
//!
//! A source plays either a single bound buffer or a FIFO queue of buffers
//! (for streaming), never both. The wrapper mirrors the binding and queue,
//! so buffers stay alive while the source refers to them. Queue operations
//! are serialized by the source's state lock, so a streaming thread can share
//! a source with the thread that owns it.
//!
//! Auxiliary sends route the source through [EffectSlot]s, each with an
//! optional wet [Filter]. The dry path can have a filter of its own.

use crate::audio::openal::*;
use crate::buffer::Buffer;
use crate::effect_slot::EffectSlot;
use crate::error::SoundError;
use crate::filter::Filter;
use crate::object::{Destroy, ObjectHandle, ObjectKind, Registry};
use crate::system::Context;
use glam::Vec3;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Playback state of a source, as reported by `AL_SOURCE_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Never played, or rewound.
    Initial,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    fn from_al(value: ALint) -> PlaybackState {
        match value {
            AL_PLAYING => PlaybackState::Playing,
            AL_PAUSED => PlaybackState::Paused,
            AL_STOPPED => PlaybackState::Stopped,
            _ => PlaybackState::Initial,
        }
    }
}

/// Receives events from a [Source]. Every method does nothing by default, so
/// implementors only override what they care about.
#[allow(unused_variables)]
pub trait SourceListener: Send + Sync {
    fn source_played(&self, source: &Source) {}
    fn source_paused(&self, source: &Source) {}
    fn source_rewound(&self, source: &Source) {}
    fn source_stopped(&self, source: &Source) {}
    fn source_buffer_enqueued(&self, source: &Source, buffer: &Buffer) {}
    fn source_buffer_dequeued(&self, source: &Source, buffer: &Buffer) {}
}

enum Event {
    Played,
    Paused,
    Rewound,
    Stopped,
    Enqueued(Buffer),
    Dequeued(Buffer),
}

/// Handle to an OpenAL source. Clones refer to the same source.
#[derive(Clone)]
pub struct Source {
    inner: Arc<SourceInner>,
}

pub(crate) struct SourceInner {
    handle: ObjectHandle,
    context: Weak<Context>,
    state: Mutex<SourceState>,
    listeners: Mutex<Vec<Arc<dyn SourceListener>>>,
}

#[derive(Default)]
struct AuxSend {
    slot: Option<EffectSlot>,
    filter: Option<Filter>,
}

struct SourceState {
    position: Vec3,
    velocity: Vec3,
    direction: Vec3,
    pitch: f32,
    gain: f32,
    min_gain: f32,
    max_gain: f32,
    rolloff_factor: f32,
    reference_distance: f32,
    max_distance: f32,
    inner_cone_angle: f32,
    outer_cone_angle: f32,
    outer_cone_gain: f32,
    looping: bool,
    relative: bool,
    auto_velocity: bool,

    buffer: Option<Buffer>,
    queue: VecDeque<Buffer>,
    sends: Vec<AuxSend>,
    dry_filter: Option<Filter>,
}

impl SourceInner {
    fn set_float(&self, param: ALenum, value: f32) -> Result<(), SoundError> {
        self.handle
            .call(|fns, id| unsafe { (fns.alSourcef)(id, param, value) })
    }

    fn set_vector(&self, param: ALenum, value: Vec3) -> Result<(), SoundError> {
        let values = value.to_array();
        self.handle
            .call(|fns, id| unsafe { (fns.alSourcefv)(id, param, values.as_ptr()) })
    }

    fn set_int(&self, param: ALenum, value: ALint) -> Result<(), SoundError> {
        self.handle
            .call(|fns, id| unsafe { (fns.alSourcei)(id, param, value) })
    }

    fn get_int(&self, param: ALenum) -> Result<ALint, SoundError> {
        let mut value = 0;
        self.handle
            .call(|fns, id| unsafe { (fns.alGetSourcei)(id, param, &mut value) })?;
        Ok(value)
    }

    fn playback_state(&self) -> Result<PlaybackState, SoundError> {
        self.get_int(AL_SOURCE_STATE).map(PlaybackState::from_al)
    }

    fn send_aux(
        &self,
        index: usize,
        slot: Option<&EffectSlot>,
        filter: Option<&Filter>,
    ) -> Result<(), SoundError> {
        let slot_id = match slot {
            Some(slot) => slot.attachable_id()? as ALint,
            None => AL_EFFECTSLOT_NULL,
        };
        let filter_id = match filter {
            Some(filter) => filter.attachable_id()? as ALint,
            None => AL_FILTER_NULL,
        };
        self.handle.call(|fns, id| unsafe {
            (fns.alSource3i)(
                id,
                AL_AUXILIARY_SEND_FILTER,
                slot_id,
                index as ALint,
                filter_id,
            )
        })
    }

    fn unqueue_one(&self) -> Result<(), SoundError> {
        let mut unqueued: ALuint = 0;
        self.handle
            .call(|fns, id| unsafe { (fns.alSourceUnqueueBuffers)(id, 1, &mut unqueued) })
    }

    /// Remove every queued buffer, natively and from the mirror. Queued
    /// buffers can only be unqueued once processed, so a source that isn't
    /// playing is cleared all at once by unbinding.
    fn dequeue_all_locked(&self, state: &mut SourceState) -> Result<Vec<Buffer>, SoundError> {
        if state.queue.is_empty() {
            return Ok(Vec::new());
        }
        match self.playback_state()? {
            PlaybackState::Playing | PlaybackState::Paused => {
                let mut dequeued = Vec::with_capacity(state.queue.len());
                while let Some(buffer) = state.queue.front().cloned() {
                    self.unqueue_one()?;
                    state.queue.pop_front();
                    dequeued.push(buffer);
                }
                Ok(dequeued)
            }
            PlaybackState::Initial | PlaybackState::Stopped => {
                self.set_int(AL_BUFFER, AL_NONE)?;
                Ok(state.queue.drain(..).collect())
            }
        }
    }

    /// Stop, detach everything, and delete the native source, without firing
    /// events. Used for implicit teardown.
    fn teardown(&self) -> Result<bool, SoundError> {
        if !self.handle.is_allocated() {
            return Ok(false);
        }
        {
            let mut state = self.state.lock();
            if self.playback_state()? == PlaybackState::Playing {
                self.handle
                    .call(|fns, id| unsafe { (fns.alSourceStop)(id) })?;
            }
            if state.buffer.is_some() || !state.queue.is_empty() {
                self.set_int(AL_BUFFER, AL_NONE)?;
            }
            state.buffer = None;
            state.queue.clear();
            state.dry_filter = None;
            for send in &mut state.sends {
                *send = AuxSend::default();
            }
        }
        if let Some(context) = self.context.upgrade() {
            let this: *const SourceInner = self;
            context
                .sources
                .lock()
                .retain(|source| !std::ptr::eq(source.as_ptr(), this));
        }
        self.handle
            .release(|api, id| unsafe { (api.fns().alDeleteSources)(1, &id) })
    }
}

impl Destroy for SourceInner {
    fn destroy(&self) -> Result<(), SoundError> {
        self.teardown().map(|_| ())
    }
}

impl Drop for SourceInner {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            log!("Couldn't free source {}: {}", self.handle.id(), err);
        }
    }
}

impl Source {
    pub(crate) fn new(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        context: &Arc<Context>,
        auto_velocity: bool,
    ) -> Result<Source, SoundError> {
        let handle = ObjectHandle::allocate(api, registry, ObjectKind::Source, |api| {
            let mut id = 0;
            unsafe { (api.fns().alGenSources)(1, &mut id) };
            Ok(id)
        })?;
        let inner = Arc::new(SourceInner {
            handle,
            context: Arc::downgrade(context),
            state: Mutex::new(SourceState {
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                direction: Vec3::ZERO,
                pitch: 1.0,
                gain: 1.0,
                min_gain: 0.0,
                max_gain: 1.0,
                rolloff_factor: 1.0,
                reference_distance: 1.0,
                max_distance: f32::MAX,
                inner_cone_angle: 360.0,
                outer_cone_angle: 360.0,
                outer_cone_gain: 0.0,
                looping: false,
                relative: false,
                auto_velocity,
                buffer: None,
                queue: VecDeque::new(),
                sends: (0..context.aux_sends).map(|_| AuxSend::default()).collect(),
                dry_filter: None,
            }),
            listeners: Mutex::new(Vec::new()),
        });
        let weak: Weak<dyn Destroy> = Arc::downgrade(&inner) as _;
        inner.handle.register(weak);
        context.sources.lock().push(Arc::downgrade(&inner));

        let source = Source { inner };
        source.reset()?;
        Ok(source)
    }

    pub(crate) fn from_inner(inner: Arc<SourceInner>) -> Source {
        Source { inner }
    }

    pub(crate) fn is_in_context(&self, context: &Context) -> bool {
        std::ptr::eq(self.inner.context.as_ptr(), context)
    }

    pub fn id(&self) -> ALuint {
        self.inner.handle.id()
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.handle.is_allocated()
    }

    fn fire(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.inner.listeners.lock().clone();
        for event in &events {
            for listener in &listeners {
                match event {
                    Event::Played => listener.source_played(self),
                    Event::Paused => listener.source_paused(self),
                    Event::Rewound => listener.source_rewound(self),
                    Event::Stopped => listener.source_stopped(self),
                    Event::Enqueued(buffer) => listener.source_buffer_enqueued(self, buffer),
                    Event::Dequeued(buffer) => listener.source_buffer_dequeued(self, buffer),
                }
            }
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SourceListener>) {
        self.inner.listeners.lock().push(listener);
    }

    /// Remove a listener previously added with [Self::add_listener]. Returns
    /// `false` if it wasn't registered.
    pub fn remove_listener(&self, listener: &Arc<dyn SourceListener>) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|existing| {
            !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(listener))
        });
        listeners.len() != before
    }

    pub fn remove_all_listeners(&self) {
        self.inner.listeners.lock().clear();
    }

    /// Restore every property to its default and detach all buffers, effect
    /// slots and filters.
    pub fn reset(&self) -> Result<(), SoundError> {
        self.set_position(Vec3::ZERO)?;
        self.set_velocity(Vec3::ZERO)?;
        self.set_direction(Vec3::ZERO)?;
        self.set_looping(false)?;
        self.set_relative(false)?;
        self.set_pitch(1.0)?;
        self.set_gain(1.0)?;
        self.set_rolloff_factor(1.0)?;
        self.set_min_gain(0.0)?;
        self.set_max_gain(1.0)?;
        self.set_reference_distance(1.0)?;
        self.set_max_distance(f32::MAX)?;
        self.set_inner_cone_angle(360.0)?;
        self.set_outer_cone_angle(360.0)?;
        self.set_outer_cone_gain(0.0)?;
        self.clear_effect_slots()?;
        self.set_dry_filter(None)?;
        self.set_buffer(None)
    }

    // === spatial properties ===

    pub fn position(&self) -> Vec3 {
        self.inner.state.lock().position
    }

    /// Move the source. With auto velocity on, the velocity becomes the
    /// difference from the previous position.
    pub fn set_position(&self, position: Vec3) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        if state.auto_velocity {
            let velocity = position - state.position;
            self.inner.set_vector(AL_VELOCITY, velocity)?;
            state.velocity = velocity;
        }
        self.inner.set_vector(AL_POSITION, position)?;
        state.position = position;
        Ok(())
    }

    pub fn velocity(&self) -> Vec3 {
        self.inner.state.lock().velocity
    }

    pub fn set_velocity(&self, velocity: Vec3) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner.set_vector(AL_VELOCITY, velocity)?;
        state.velocity = velocity;
        Ok(())
    }

    /// The direction of the sound cone. A zero vector means the source is
    /// omnidirectional.
    pub fn direction(&self) -> Vec3 {
        self.inner.state.lock().direction
    }

    pub fn set_direction(&self, direction: Vec3) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner.set_vector(AL_DIRECTION, direction)?;
        state.direction = direction;
        Ok(())
    }

    pub fn is_auto_velocity(&self) -> bool {
        self.inner.state.lock().auto_velocity
    }

    pub fn set_auto_velocity(&self, auto_velocity: bool) {
        self.inner.state.lock().auto_velocity = auto_velocity;
    }

    /// Whether position, velocity and direction are relative to the
    /// listener.
    pub fn is_relative(&self) -> bool {
        self.inner.state.lock().relative
    }

    pub fn set_relative(&self, relative: bool) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner
            .set_int(AL_SOURCE_RELATIVE, ALint::from(relative))?;
        state.relative = relative;
        Ok(())
    }

    // === scalar properties ===

    fn set_scalar(
        &self,
        param: ALenum,
        value: f32,
        field: impl FnOnce(&mut SourceState) -> &mut f32,
    ) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner.set_float(param, value)?;
        *field(&mut state) = value;
        Ok(())
    }

    pub fn pitch(&self) -> f32 {
        self.inner.state.lock().pitch
    }

    /// Set the pitch multiplier. Negative values become 0.
    pub fn set_pitch(&self, pitch: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_PITCH, pitch.max(0.0), |state| &mut state.pitch)
    }

    /// Set the pitch as a shift in semitones, where 12 is an octave up.
    pub fn set_pitch_semitones(&self, semitones: f32) -> Result<(), SoundError> {
        self.set_pitch_cents(semitones * 100.0)
    }

    /// Set the pitch as a shift in cents, where 1200 is an octave up.
    pub fn set_pitch_cents(&self, cents: f32) -> Result<(), SoundError> {
        self.set_pitch(2f32.powf(cents / 1200.0))
    }

    pub fn gain(&self) -> f32 {
        self.inner.state.lock().gain
    }

    /// Clamped to 0 to 1.
    pub fn set_gain(&self, gain: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_GAIN, gain.clamp(0.0, 1.0), |state| &mut state.gain)
    }

    pub fn min_gain(&self) -> f32 {
        self.inner.state.lock().min_gain
    }

    /// Clamped to 0 to 1.
    pub fn set_min_gain(&self, gain: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_MIN_GAIN, gain.clamp(0.0, 1.0), |state| {
            &mut state.min_gain
        })
    }

    pub fn max_gain(&self) -> f32 {
        self.inner.state.lock().max_gain
    }

    /// Clamped to 0 to 1.
    pub fn set_max_gain(&self, gain: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_MAX_GAIN, gain.clamp(0.0, 1.0), |state| {
            &mut state.max_gain
        })
    }

    pub fn rolloff_factor(&self) -> f32 {
        self.inner.state.lock().rolloff_factor
    }

    pub fn set_rolloff_factor(&self, rolloff: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_ROLLOFF_FACTOR, rolloff.max(0.0), |state| {
            &mut state.rolloff_factor
        })
    }

    pub fn reference_distance(&self) -> f32 {
        self.inner.state.lock().reference_distance
    }

    /// Distance at which the gain is unattenuated. Negative values become 0.
    pub fn set_reference_distance(&self, distance: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_REFERENCE_DISTANCE, distance.max(0.0), |state| {
            &mut state.reference_distance
        })
    }

    pub fn max_distance(&self) -> f32 {
        self.inner.state.lock().max_distance
    }

    /// Distance beyond which the source is no longer attenuated. Negative
    /// values become 0.
    pub fn set_max_distance(&self, distance: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_MAX_DISTANCE, distance.max(0.0), |state| {
            &mut state.max_distance
        })
    }

    pub fn inner_cone_angle(&self) -> f32 {
        self.inner.state.lock().inner_cone_angle
    }

    /// In degrees, clamped to 0 to 360.
    pub fn set_inner_cone_angle(&self, degrees: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_CONE_INNER_ANGLE, degrees.clamp(0.0, 360.0), |state| {
            &mut state.inner_cone_angle
        })
    }

    pub fn outer_cone_angle(&self) -> f32 {
        self.inner.state.lock().outer_cone_angle
    }

    /// In degrees, clamped to 0 to 360.
    pub fn set_outer_cone_angle(&self, degrees: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_CONE_OUTER_ANGLE, degrees.clamp(0.0, 360.0), |state| {
            &mut state.outer_cone_angle
        })
    }

    pub fn outer_cone_gain(&self) -> f32 {
        self.inner.state.lock().outer_cone_gain
    }

    /// Gain outside the outer cone, clamped to 0 to 1.
    pub fn set_outer_cone_gain(&self, gain: f32) -> Result<(), SoundError> {
        self.set_scalar(AL_CONE_OUTER_GAIN, gain.clamp(0.0, 1.0), |state| {
            &mut state.outer_cone_gain
        })
    }

    pub fn is_looping(&self) -> bool {
        self.inner.state.lock().looping
    }

    pub fn set_looping(&self, looping: bool) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner.set_int(AL_LOOPING, ALint::from(looping))?;
        state.looping = looping;
        Ok(())
    }

    /// Playback position within the current buffer (or queue), in seconds.
    pub fn offset_seconds(&self) -> Result<f32, SoundError> {
        let mut value = 0.0;
        self.inner
            .handle
            .call(|fns, id| unsafe { (fns.alGetSourcef)(id, AL_SEC_OFFSET, &mut value) })?;
        Ok(value)
    }

    pub fn set_offset_seconds(&self, seconds: f32) -> Result<(), SoundError> {
        self.inner.set_float(AL_SEC_OFFSET, seconds.max(0.0))
    }

    // === filters and effect slots ===

    pub fn dry_filter(&self) -> Option<Filter> {
        self.inner.state.lock().dry_filter.clone()
    }

    /// Filter the direct (non-effect) path, or remove the filter with
    /// [None].
    pub fn set_dry_filter(&self, filter: Option<&Filter>) -> Result<(), SoundError> {
        let filter_id = match filter {
            Some(filter) => filter.attachable_id()? as ALint,
            None => AL_FILTER_NULL,
        };
        let mut state = self.inner.state.lock();
        self.inner.set_int(AL_DIRECT_FILTER, filter_id)?;
        state.dry_filter = filter.cloned();
        Ok(())
    }

    /// Number of auxiliary sends this source has.
    pub fn effect_slot_count(&self) -> usize {
        self.inner.state.lock().sends.len()
    }

    pub fn effect_slot(&self, index: usize) -> Option<EffectSlot> {
        let state = self.inner.state.lock();
        state.sends.get(index).and_then(|send| send.slot.clone())
    }

    pub fn effect_slot_filter(&self, index: usize) -> Option<Filter> {
        let state = self.inner.state.lock();
        state.sends.get(index).and_then(|send| send.filter.clone())
    }

    /// Route auxiliary send `index` to `slot` (or nowhere), through an
    /// optional wet `filter`.
    pub fn set_effect_slot(
        &self,
        index: usize,
        slot: Option<&EffectSlot>,
        filter: Option<&Filter>,
    ) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        let count = state.sends.len();
        if index >= count {
            return Err(SoundError::InvalidSend { index, count });
        }
        self.inner.send_aux(index, slot, filter)?;
        state.sends[index] = AuxSend {
            slot: slot.cloned(),
            filter: filter.cloned(),
        };
        Ok(())
    }

    /// Change only the wet filter of auxiliary send `index`.
    pub fn set_effect_slot_filter(
        &self,
        index: usize,
        filter: Option<&Filter>,
    ) -> Result<(), SoundError> {
        let slot = self.effect_slot(index);
        self.set_effect_slot(index, slot.as_ref(), filter)
    }

    /// Disconnect every auxiliary send.
    pub fn clear_effect_slots(&self) -> Result<(), SoundError> {
        for index in 0..self.effect_slot_count() {
            self.set_effect_slot(index, None, None)?;
        }
        Ok(())
    }

    // === buffers ===

    /// The singly-bound buffer, if any.
    pub fn buffer(&self) -> Option<Buffer> {
        self.inner.state.lock().buffer.clone()
    }

    /// Bind a single buffer, or unbind with [None]. Any queued buffers are
    /// dequeued first.
    pub fn set_buffer(&self, buffer: Option<&Buffer>) -> Result<(), SoundError> {
        let buffer_id = match buffer {
            Some(buffer) => buffer.attachable_id()? as ALint,
            None => AL_NONE,
        };
        let dequeued = {
            let mut state = self.inner.state.lock();
            let dequeued = self.inner.dequeue_all_locked(&mut state)?;
            self.inner.set_int(AL_BUFFER, buffer_id)?;
            state.buffer = buffer.cloned();
            dequeued
        };
        self.fire(dequeued.into_iter().map(Event::Dequeued).collect());
        Ok(())
    }

    /// Whether a buffer is bound or queued.
    pub fn is_bound_to_a_buffer(&self) -> bool {
        let state = self.inner.state.lock();
        state.buffer.is_some() || !state.queue.is_empty()
    }

    /// Append a buffer to the queue. A singly-bound buffer is unbound first.
    pub fn enqueue_buffer(&self, buffer: &Buffer) -> Result<(), SoundError> {
        let buffer_id = buffer.attachable_id()?;
        {
            let mut state = self.inner.state.lock();
            if state.buffer.is_some() {
                self.inner.set_int(AL_BUFFER, AL_NONE)?;
                state.buffer = None;
            }
            self.inner.handle.call(|fns, id| unsafe {
                (fns.alSourceQueueBuffers)(id, 1, &buffer_id)
            })?;
            state.queue.push_back(buffer.clone());
        }
        self.fire(vec![Event::Enqueued(buffer.clone())]);
        Ok(())
    }

    pub fn enqueue_buffers<'a>(
        &self,
        buffers: impl IntoIterator<Item = &'a Buffer>,
    ) -> Result<(), SoundError> {
        for buffer in buffers {
            self.enqueue_buffer(buffer)?;
        }
        Ok(())
    }

    /// Remove the buffer at the head of the queue. Only buffers that have
    /// finished playing can be unqueued; this doesn't check the play state,
    /// so that is reported as an AL error.
    pub fn dequeue_buffer(&self) -> Result<Option<Buffer>, SoundError> {
        let buffer = {
            let mut state = self.inner.state.lock();
            if state.queue.is_empty() {
                return Ok(None);
            }
            self.inner.unqueue_one()?;
            state.queue.pop_front()
        };
        if let Some(buffer) = &buffer {
            self.fire(vec![Event::Dequeued(buffer.clone())]);
        }
        Ok(buffer)
    }

    /// Remove every queued buffer, returning them in queue order.
    pub fn dequeue_all_buffers(&self) -> Result<Vec<Buffer>, SoundError> {
        let dequeued = {
            let mut state = self.inner.state.lock();
            self.inner.dequeue_all_locked(&mut state)?
        };
        self.fire(dequeued.iter().cloned().map(Event::Dequeued).collect());
        Ok(dequeued)
    }

    /// Remove the buffers that have finished playing, for refilling.
    pub fn dequeue_processed_buffers(&self) -> Result<Vec<Buffer>, SoundError> {
        let dequeued = {
            let mut state = self.inner.state.lock();
            let processed = self.inner.get_int(AL_BUFFERS_PROCESSED)?;
            let mut dequeued = Vec::new();
            for _ in 0..processed {
                if state.queue.is_empty() {
                    break;
                }
                self.inner.unqueue_one()?;
                dequeued.extend(state.queue.pop_front());
            }
            dequeued
        };
        self.fire(dequeued.iter().cloned().map(Event::Dequeued).collect());
        Ok(dequeued)
    }

    /// The buffer at the head of the queue.
    pub fn peek_buffer(&self) -> Option<Buffer> {
        self.inner.state.lock().queue.front().cloned()
    }

    /// The mirrored queue, head first.
    pub fn queued_buffers(&self) -> Vec<Buffer> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }

    /// `AL_BUFFERS_QUEUED`.
    pub fn queued_buffer_count(&self) -> Result<usize, SoundError> {
        Ok(self.inner.get_int(AL_BUFFERS_QUEUED)?.max(0) as usize)
    }

    /// `AL_BUFFERS_PROCESSED`: how many queued buffers have finished playing.
    pub fn processed_buffer_count(&self) -> Result<usize, SoundError> {
        Ok(self.inner.get_int(AL_BUFFERS_PROCESSED)?.max(0) as usize)
    }

    // === playback ===

    pub fn playback_state(&self) -> Result<PlaybackState, SoundError> {
        self.inner.playback_state()
    }

    pub fn is_playing(&self) -> Result<bool, SoundError> {
        Ok(self.playback_state()? == PlaybackState::Playing)
    }

    pub fn is_paused(&self) -> Result<bool, SoundError> {
        Ok(self.playback_state()? == PlaybackState::Paused)
    }

    pub fn is_stopped(&self) -> Result<bool, SoundError> {
        Ok(self.playback_state()? == PlaybackState::Stopped)
    }

    /// Whether the source has never played, or was rewound.
    pub fn is_ready(&self) -> Result<bool, SoundError> {
        Ok(self.playback_state()? == PlaybackState::Initial)
    }

    /// Start playing. Does nothing if no buffer is bound or queued.
    pub fn play(&self) -> Result<(), SoundError> {
        if !self.is_bound_to_a_buffer() {
            return Ok(());
        }
        self.inner
            .handle
            .call(|fns, id| unsafe { (fns.alSourcePlay)(id) })?;
        self.fire(vec![Event::Played]);
        Ok(())
    }

    /// Pause. Does nothing if no buffer is bound or queued.
    pub fn pause(&self) -> Result<(), SoundError> {
        if !self.is_bound_to_a_buffer() {
            return Ok(());
        }
        self.inner
            .handle
            .call(|fns, id| unsafe { (fns.alSourcePause)(id) })?;
        self.fire(vec![Event::Paused]);
        Ok(())
    }

    /// Go back to the initial state. Does nothing if no buffer is bound or
    /// queued.
    pub fn rewind(&self) -> Result<(), SoundError> {
        if !self.is_bound_to_a_buffer() {
            return Ok(());
        }
        self.inner
            .handle
            .call(|fns, id| unsafe { (fns.alSourceRewind)(id) })?;
        self.fire(vec![Event::Rewound]);
        Ok(())
    }

    /// Stop. Does nothing if no buffer is bound or queued, and only notifies
    /// listeners if the source wasn't already stopped.
    pub fn stop(&self) -> Result<(), SoundError> {
        if !self.is_bound_to_a_buffer() {
            return Ok(());
        }
        let was_stopped = self.is_stopped()?;
        self.inner
            .handle
            .call(|fns, id| unsafe { (fns.alSourceStop)(id) })?;
        if !was_stopped {
            self.fire(vec![Event::Stopped]);
        }
        Ok(())
    }

    /// Block the calling thread until the source is no longer playing.
    pub fn wait_for_end(&self) -> Result<(), SoundError> {
        while self.is_playing()? {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    /// Stop the source, dequeue its buffers, and free it. Listeners are
    /// notified of the stop and of each dequeued buffer. The buffers
    /// themselves are not destroyed. Does nothing if already freed.
    pub fn destroy(&self) -> Result<(), SoundError> {
        if !self.is_allocated() {
            return Ok(());
        }
        if self.is_playing()? {
            self.stop()?;
        }
        self.dequeue_all_buffers()?;
        self.inner.teardown().map(|_| ())
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Source {}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Source")
            .field("id", &self.id())
            .field("buffer", &state.buffer)
            .field("queue", &state.queue)
            .finish()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        write!(f, "Source {}", self.id())?;
        if let Some(buffer) = &state.buffer {
            write!(f, " {}", buffer)
        } else {
            write!(f, " [")?;
            for (i, buffer) in state.queue.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", buffer)?;
            }
            write!(f, "]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SourceListener for Recorder {
        fn source_played(&self, _: &Source) {
            self.events.lock().push("played".to_string());
        }
        fn source_paused(&self, _: &Source) {
            self.events.lock().push("paused".to_string());
        }
        fn source_rewound(&self, _: &Source) {
            self.events.lock().push("rewound".to_string());
        }
        fn source_stopped(&self, _: &Source) {
            self.events.lock().push("stopped".to_string());
        }
        fn source_buffer_enqueued(&self, _: &Source, buffer: &Buffer) {
            self.events.lock().push(format!("enqueued {}", buffer.id()));
        }
        fn source_buffer_dequeued(&self, _: &Source, buffer: &Buffer) {
            self.events.lock().push(format!("dequeued {}", buffer.id()));
        }
    }

    #[test]
    fn defaults_are_sent_on_creation() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let id = source.id();
        assert_eq!(testing::float(ObjectKind::Source, id, AL_PITCH), Some(1.0));
        assert_eq!(
            testing::float(ObjectKind::Source, id, AL_MAX_DISTANCE),
            Some(f32::MAX)
        );
        assert_eq!(
            testing::float(ObjectKind::Source, id, AL_CONE_OUTER_ANGLE),
            Some(360.0)
        );
        assert_eq!(
            testing::vector(ObjectKind::Source, id, AL_DIRECTION),
            Some(vec![0.0, 0.0, 0.0])
        );
        assert_eq!(testing::int(ObjectKind::Source, id, AL_LOOPING), Some(0));
        assert_eq!(source.effect_slot_count(), 2);
        assert_eq!(source.playback_state().unwrap(), PlaybackState::Initial);
    }

    #[test]
    fn setters_clamp() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        source.set_gain(1.5).unwrap();
        source.set_min_gain(-1.0).unwrap();
        source.set_pitch(-2.0).unwrap();
        source.set_max_distance(-10.0).unwrap();
        source.set_outer_cone_angle(400.0).unwrap();

        assert_eq!(source.gain(), 1.0);
        assert_eq!(source.min_gain(), 0.0);
        assert_eq!(source.pitch(), 0.0);
        assert_eq!(source.max_distance(), 0.0);
        assert_eq!(source.outer_cone_angle(), 360.0);
        assert_eq!(
            testing::float(ObjectKind::Source, source.id(), AL_GAIN),
            Some(1.0)
        );
    }

    #[test]
    fn pitch_in_semitones_and_cents() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        source.set_pitch_semitones(12.0).unwrap();
        assert!((source.pitch() - 2.0).abs() < 1e-6);
        source.set_pitch_cents(-1200.0).unwrap();
        assert!((source.pitch() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn auto_velocity() {
        let system = testing::system();
        let source = system.create_source(true).unwrap();
        source.set_position(Vec3::new(1.0, 1.0, 1.0)).unwrap();
        source.set_position(Vec3::new(4.0, 1.0, -1.0)).unwrap();
        assert_eq!(source.velocity(), Vec3::new(3.0, 0.0, -2.0));
        assert_eq!(
            testing::vector(ObjectKind::Source, source.id(), AL_VELOCITY),
            Some(vec![3.0, 0.0, -2.0])
        );
    }

    #[test]
    fn buffer_and_queue_are_exclusive() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffers = system.create_buffers(3).unwrap();

        source.set_buffer(Some(&buffers[0])).unwrap();
        assert_eq!(source.buffer().as_ref(), Some(&buffers[0]));

        source.enqueue_buffers(&buffers[1..]).unwrap();
        assert_eq!(source.buffer(), None);
        assert_eq!(source.queued_buffers(), buffers[1..].to_vec());
        assert_eq!(
            testing::queue(source.id()),
            vec![buffers[1].id(), buffers[2].id()]
        );
        assert_eq!(source.queued_buffer_count().unwrap(), 2);

        source.set_buffer(Some(&buffers[0])).unwrap();
        assert!(source.queued_buffers().is_empty());
        assert!(testing::queue(source.id()).is_empty());
        assert_eq!(
            testing::int(ObjectKind::Source, source.id(), AL_BUFFER),
            Some(buffers[0].id() as ALint)
        );
    }

    #[test]
    fn dequeue_in_fifo_order() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffers = system.create_buffers(3).unwrap();
        source.enqueue_buffers(&buffers).unwrap();
        assert_eq!(source.peek_buffer().as_ref(), Some(&buffers[0]));

        source.play().unwrap();
        source.stop().unwrap();
        assert_eq!(source.processed_buffer_count().unwrap(), 3);

        assert_eq!(source.dequeue_buffer().unwrap().as_ref(), Some(&buffers[0]));
        assert_eq!(
            source.dequeue_all_buffers().unwrap(),
            buffers[1..].to_vec()
        );
        assert_eq!(source.dequeue_buffer().unwrap(), None);
        assert!(!source.is_bound_to_a_buffer());
    }

    #[test]
    fn unprocessed_buffers_cannot_be_dequeued_one_by_one() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffer = system.create_buffer().unwrap();
        source.enqueue_buffer(&buffer).unwrap();
        source.play().unwrap();

        let err = source.dequeue_buffer().unwrap_err();
        assert!(matches!(err, SoundError::Al { object: "Source", .. }));
        assert_eq!(source.queued_buffers(), vec![buffer]);
    }

    #[test]
    fn streaming_refill() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffers = system.create_buffers(3).unwrap();
        source.enqueue_buffers(&buffers).unwrap();
        source.play().unwrap();

        testing::mark_processed(source.id(), 2);
        let processed = source.dequeue_processed_buffers().unwrap();
        assert_eq!(processed, buffers[..2].to_vec());
        assert_eq!(source.queued_buffers(), vec![buffers[2].clone()]);

        source.enqueue_buffers(&processed).unwrap();
        assert_eq!(
            testing::queue(source.id()),
            vec![buffers[2].id(), buffers[0].id(), buffers[1].id()]
        );
    }

    #[test]
    fn playback_requires_a_buffer() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let recorder = Arc::new(Recorder::default());
        source.add_listener(recorder.clone());

        source.play().unwrap();
        assert!(source.is_ready().unwrap());
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn events() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffer = system.create_buffer().unwrap();
        let recorder = Arc::new(Recorder::default());
        source.add_listener(recorder.clone());

        source.enqueue_buffer(&buffer).unwrap();
        source.play().unwrap();
        assert!(source.is_playing().unwrap());
        assert_eq!(testing::source_state(source.id()), Some(AL_PLAYING));
        source.pause().unwrap();
        assert!(source.is_paused().unwrap());
        source.stop().unwrap();
        source.stop().unwrap();
        source.rewind().unwrap();
        source.dequeue_all_buffers().unwrap();

        let id = buffer.id();
        assert_eq!(
            *recorder.events.lock(),
            vec![
                format!("enqueued {}", id),
                "played".to_string(),
                "paused".to_string(),
                "stopped".to_string(),
                "rewound".to_string(),
                format!("dequeued {}", id),
            ]
        );

        let listener: Arc<dyn SourceListener> = recorder.clone();
        assert!(source.remove_listener(&listener));
        assert!(!source.remove_listener(&listener));
        source.set_buffer(Some(&buffer)).unwrap();
        source.play().unwrap();
        assert_eq!(recorder.events.lock().len(), 6);
    }

    #[test]
    fn sends_and_filters() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let slot = system.create_effect_slot().unwrap();
        let wet = system.create_low_pass().unwrap();
        let dry = system.create_high_pass().unwrap();

        source
            .set_effect_slot(1, Some(&slot), Some(wet.as_ref()))
            .unwrap();
        source.set_dry_filter(Some(dry.as_ref())).unwrap();

        assert_eq!(source.effect_slot(1).as_ref(), Some(&slot));
        assert_eq!(source.effect_slot_filter(1).as_ref(), Some(wet.as_ref()));
        assert_eq!(
            testing::send(source.id(), 1),
            Some((slot.id() as ALint, wet.as_ref().id() as ALint))
        );
        assert_eq!(
            testing::int(ObjectKind::Source, source.id(), AL_DIRECT_FILTER),
            Some(dry.as_ref().id() as ALint)
        );

        source.set_effect_slot_filter(1, None).unwrap();
        assert_eq!(testing::send(source.id(), 1), Some((slot.id() as ALint, 0)));

        assert!(matches!(
            source.set_effect_slot(2, Some(&slot), None),
            Err(SoundError::InvalidSend { index: 2, count: 2 })
        ));

        source.reset().unwrap();
        assert_eq!(source.effect_slot(1), None);
        assert_eq!(source.dry_filter(), None);
        assert_eq!(testing::send(source.id(), 1), Some((0, 0)));
    }

    #[test]
    fn no_sends_without_efx() {
        let system = testing::system_without_efx();
        let source = system.create_source(false).unwrap();
        assert_eq!(source.effect_slot_count(), 0);
    }

    #[test]
    fn attached_buffers_stay_alive() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffer = system.create_buffer().unwrap();
        let id = buffer.id();
        source.set_buffer(Some(&buffer)).unwrap();
        drop(buffer);
        assert!(testing::is_live(ObjectKind::Buffer, id));

        assert!(source.buffer().unwrap().destroy().is_err());

        source.set_buffer(None).unwrap();
        assert!(!testing::is_live(ObjectKind::Buffer, id));
    }

    #[test]
    fn destroy_detaches_without_freeing_buffers() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        let buffers = system.create_buffers(2).unwrap();
        let recorder = Arc::new(Recorder::default());
        source.add_listener(recorder.clone());
        source.enqueue_buffers(&buffers).unwrap();
        source.play().unwrap();
        recorder.events.lock().clear();

        source.destroy().unwrap();
        assert!(!source.is_allocated());
        assert!(!testing::is_live(ObjectKind::Source, source.id()));
        assert!(buffers.iter().all(|buffer| buffer.is_allocated()));
        assert_eq!(recorder.events.lock()[0], "stopped");
        assert_eq!(recorder.events.lock().len(), 3);
        assert!(system.sources_in_current_context().unwrap().is_empty());

        source.destroy().unwrap();
        assert!(matches!(
            source.set_gain(0.5),
            Err(SoundError::Destroyed(ObjectKind::Source))
        ));
    }

    #[test]
    fn display() {
        let system = testing::system();
        let source = system.create_source(false).unwrap();
        assert_eq!(source.to_string(), format!("Source {} []", source.id()));
        let buffer = system.create_buffer().unwrap();
        source.set_buffer(Some(&buffer)).unwrap();
        assert_eq!(
            source.to_string(),
            format!("Source {} {}", source.id(), buffer)
        );
    }
}
