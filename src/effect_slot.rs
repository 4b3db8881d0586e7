/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! EFX auxiliary effect slots. A slot holds at most one effect, and sources
//! feed it through their auxiliary sends.

use crate::audio::openal::*;
use crate::effect::Effect;
use crate::error::SoundError;
use crate::object::{Destroy, ObjectHandle, ObjectKind, Registry};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Handle to an auxiliary effect slot. Clones refer to the same slot.
#[derive(Clone)]
pub struct EffectSlot {
    inner: Arc<EffectSlotInner>,
}

struct EffectSlotInner {
    handle: ObjectHandle,
    state: Mutex<EffectSlotState>,
}

struct EffectSlotState {
    effect: Option<Effect>,
    gain: f32,
    auto_send: bool,
}

impl Destroy for EffectSlotInner {
    fn destroy(&self) -> Result<(), SoundError> {
        let released = self.handle.release(|api, id| {
            if let Ok(efx) = api.efx() {
                unsafe { (efx.alDeleteAuxiliaryEffectSlots)(1, &id) };
            }
        })?;
        if released {
            self.state.lock().effect = None;
        }
        Ok(())
    }
}

impl Drop for EffectSlotInner {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log!("Couldn't free effect slot {}: {}", self.handle.id(), err);
        }
    }
}

impl EffectSlot {
    pub(crate) fn new(api: &Arc<Api>, registry: &Arc<Registry>) -> Result<EffectSlot, SoundError> {
        let handle = ObjectHandle::allocate(api, registry, ObjectKind::EffectSlot, |api| {
            let efx = api.efx()?;
            let mut id = 0;
            unsafe { (efx.alGenAuxiliaryEffectSlots)(1, &mut id) };
            Ok(id)
        })?;
        let inner = Arc::new(EffectSlotInner {
            handle,
            state: Mutex::new(EffectSlotState {
                effect: None,
                gain: 1.0,
                auto_send: true,
            }),
        });
        let weak: Weak<dyn Destroy> = Arc::downgrade(&inner) as _;
        inner.handle.register(weak);
        Ok(EffectSlot { inner })
    }

    pub fn id(&self) -> ALuint {
        self.inner.handle.id()
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.handle.is_allocated()
    }

    /// Free the native slot. Does nothing if it was already freed. The effect
    /// it held is not destroyed.
    pub fn destroy(&self) -> Result<(), SoundError> {
        self.inner.destroy()
    }

    pub(crate) fn attachable_id(&self) -> Result<ALuint, SoundError> {
        self.inner.handle.check_allocated()
    }

    /// Load an effect into this slot, or empty it with [None]. The slot takes
    /// a copy of the effect's current parameters.
    pub fn set_effect(&self, effect: Option<&Effect>) -> Result<(), SoundError> {
        let effect_id = match effect {
            Some(effect) => {
                if !effect.is_allocated() {
                    return Err(SoundError::Destroyed(ObjectKind::Effect));
                }
                effect.id() as ALint
            }
            None => AL_EFFECT_NULL,
        };
        let mut state = self.inner.state.lock();
        self.inner.handle.call_efx(|efx, id| unsafe {
            (efx.alAuxiliaryEffectSloti)(id, AL_EFFECTSLOT_EFFECT, effect_id)
        })?;
        state.effect = effect.cloned();
        Ok(())
    }

    pub fn effect(&self) -> Option<Effect> {
        self.inner.state.lock().effect.clone()
    }

    /// Empty the slot, returning the effect it held.
    pub fn remove_effect(&self) -> Result<Option<Effect>, SoundError> {
        let previous = self.effect();
        self.set_effect(None)?;
        Ok(previous)
    }

    pub fn gain(&self) -> f32 {
        self.inner.state.lock().gain
    }

    /// Set the output gain of the slot, clamped to 0 to 1.
    pub fn set_gain(&self, gain: f32) -> Result<(), SoundError> {
        let gain = gain.clamp(0.0, 1.0);
        let mut state = self.inner.state.lock();
        self.inner.handle.call_efx(|efx, id| unsafe {
            (efx.alAuxiliaryEffectSlotf)(id, AL_EFFECTSLOT_GAIN, gain)
        })?;
        state.gain = gain;
        Ok(())
    }

    /// Whether the effect's output is adjusted automatically for the source's
    /// distance and orientation.
    pub fn is_auto_send(&self) -> bool {
        self.inner.state.lock().auto_send
    }

    pub fn set_auto_send(&self, auto_send: bool) -> Result<(), SoundError> {
        let mut state = self.inner.state.lock();
        self.inner.handle.call_efx(|efx, id| unsafe {
            (efx.alAuxiliaryEffectSloti)(
                id,
                AL_EFFECTSLOT_AUXILIARY_SEND_AUTO,
                ALint::from(auto_send),
            )
        })?;
        state.auto_send = auto_send;
        Ok(())
    }
}

impl PartialEq for EffectSlot {
    fn eq(&self, other: &EffectSlot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EffectSlot {}

impl fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectSlot")
            .field("id", &self.id())
            .field("effect", &self.effect())
            .finish()
    }
}

impl fmt::Display for EffectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effect() {
            Some(effect) => write!(f, "EffectSlot {} ({})", self.id(), effect),
            None => write!(f, "EffectSlot {} (empty)", self.id()),
        }
    }
}
