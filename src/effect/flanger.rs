/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Flanger, a chorus with a much shorter delay and more feedback.

use super::{typed_effect, Effect, Waveform};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const WAVEFORM: IntParam = IntParam::new(AL_FLANGER_WAVEFORM, 0, 1, Waveform::Triangle as ALint);
const PHASE: IntParam = IntParam::new(AL_FLANGER_PHASE, -180, 180, 0);
const RATE: FloatParam = FloatParam::new(AL_FLANGER_RATE, 0.0, 10.0, 0.27);
const DEPTH: FloatParam = FloatParam::new(AL_FLANGER_DEPTH, 0.0, 1.0, 1.0);
const FEEDBACK: FloatParam = FloatParam::new(AL_FLANGER_FEEDBACK, -1.0, 1.0, -0.5);
const DELAY: FloatParam = FloatParam::new(AL_FLANGER_DELAY, 0.0, 0.004, 0.002);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[RATE, DEPTH, FEEDBACK, DELAY];
pub(super) const INT_PARAMS: &[IntParam] = &[WAVEFORM, PHASE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flanger(Effect);
typed_effect!(Flanger);

impl Flanger {
    pub fn waveform(&self) -> Waveform {
        Waveform::from_al(self.0.int(&WAVEFORM))
    }

    pub fn set_waveform(&self, waveform: Waveform) -> Result<(), SoundError> {
        self.0.set_int(&WAVEFORM, waveform as ALint)
    }

    pub fn phase(&self) -> ALint {
        self.0.int(&PHASE)
    }

    pub fn set_phase(&self, degrees: ALint) -> Result<(), SoundError> {
        self.0.set_int(&PHASE, degrees)
    }

    float_params! {
        rate, set_rate: RATE;
        depth, set_depth: DEPTH;
        feedback, set_feedback: FEEDBACK;
        /// Average delay in seconds, 0 to 0.004.
        delay, set_delay: DELAY;
    }
}
