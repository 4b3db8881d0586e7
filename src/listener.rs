/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The listener of the current context.

use crate::audio::openal::*;
use crate::error::SoundError;
use glam::Vec3;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct Listener {
    api: Arc<Api>,
    state: Mutex<ListenerState>,
}

struct ListenerState {
    position: Vec3,
    velocity: Vec3,
    facing: Vec3,
    top: Vec3,
    gain: f32,
    auto_velocity: bool,
}

impl Listener {
    /// The initial state is only mirrored. [Self::reset] sends it once a
    /// context is current.
    pub(crate) fn new(api: &Arc<Api>) -> Listener {
        Listener {
            api: Arc::clone(api),
            state: Mutex::new(ListenerState {
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                facing: Vec3::Z,
                top: Vec3::Y,
                gain: 1.0,
                auto_velocity: false,
            }),
        }
    }

    /// Send the mirrored state to the current context again, e.g. after
    /// switching contexts.
    pub fn reset(&self) -> Result<(), SoundError> {
        let state = self.state.lock();
        self.send_vector(AL_POSITION, state.position)?;
        self.send_vector(AL_VELOCITY, state.velocity)?;
        self.send_orientation(state.facing, state.top)?;
        self.send_float(AL_GAIN, state.gain)
    }

    fn send_float(&self, param: ALenum, value: f32) -> Result<(), SoundError> {
        self.api.clear_error();
        unsafe { (self.api.fns().alListenerf)(param, value) };
        self.api.error_check("Listener")
    }

    fn send_vector(&self, param: ALenum, value: Vec3) -> Result<(), SoundError> {
        let values = value.to_array();
        self.api.clear_error();
        unsafe { (self.api.fns().alListenerfv)(param, values.as_ptr()) };
        self.api.error_check("Listener")
    }

    fn send_orientation(&self, facing: Vec3, top: Vec3) -> Result<(), SoundError> {
        let values = [facing.x, facing.y, facing.z, top.x, top.y, top.z];
        self.api.clear_error();
        unsafe { (self.api.fns().alListenerfv)(AL_ORIENTATION, values.as_ptr()) };
        self.api.error_check("Listener")
    }

    pub fn position(&self) -> Vec3 {
        self.state.lock().position
    }

    /// Move the listener. With auto velocity on, the velocity becomes the
    /// difference from the previous position.
    pub fn set_position(&self, position: Vec3) -> Result<(), SoundError> {
        let mut state = self.state.lock();
        if state.auto_velocity {
            let velocity = position - state.position;
            self.send_vector(AL_VELOCITY, velocity)?;
            state.velocity = velocity;
        }
        self.send_vector(AL_POSITION, position)?;
        state.position = position;
        Ok(())
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.lock().velocity
    }

    pub fn set_velocity(&self, velocity: Vec3) -> Result<(), SoundError> {
        let mut state = self.state.lock();
        self.send_vector(AL_VELOCITY, velocity)?;
        state.velocity = velocity;
        Ok(())
    }

    /// The direction the listener looks in.
    pub fn facing(&self) -> Vec3 {
        self.state.lock().facing
    }

    pub fn set_facing(&self, facing: Vec3) -> Result<(), SoundError> {
        let mut state = self.state.lock();
        self.send_orientation(facing, state.top)?;
        state.facing = facing;
        Ok(())
    }

    /// The listener's "up" direction.
    pub fn top(&self) -> Vec3 {
        self.state.lock().top
    }

    pub fn set_top(&self, top: Vec3) -> Result<(), SoundError> {
        let mut state = self.state.lock();
        self.send_orientation(state.facing, top)?;
        state.top = top;
        Ok(())
    }

    pub fn set_orientation(&self, facing: Vec3, top: Vec3) -> Result<(), SoundError> {
        let mut state = self.state.lock();
        self.send_orientation(facing, top)?;
        state.facing = facing;
        state.top = top;
        Ok(())
    }

    pub fn gain(&self) -> f32 {
        self.state.lock().gain
    }

    /// Set the master gain. Negative values become 0.
    pub fn set_gain(&self, gain: f32) -> Result<(), SoundError> {
        let gain = gain.max(0.0);
        let mut state = self.state.lock();
        self.send_float(AL_GAIN, gain)?;
        state.gain = gain;
        Ok(())
    }

    pub fn is_auto_velocity(&self) -> bool {
        self.state.lock().auto_velocity
    }

    pub fn set_auto_velocity(&self, auto_velocity: bool) {
        self.state.lock().auto_velocity = auto_velocity;
    }
}
