/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Chorus, which mixes in delayed copies of the signal with a modulated delay
//! time.

use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const WAVEFORM: IntParam = IntParam::new(AL_CHORUS_WAVEFORM, 0, 1, Waveform::Triangle as ALint);
const PHASE: IntParam = IntParam::new(AL_CHORUS_PHASE, -180, 180, 90);
const RATE: FloatParam = FloatParam::new(AL_CHORUS_RATE, 0.0, 10.0, 1.1);
const DEPTH: FloatParam = FloatParam::new(AL_CHORUS_DEPTH, 0.0, 1.0, 0.1);
const FEEDBACK: FloatParam = FloatParam::new(AL_CHORUS_FEEDBACK, -1.0, 1.0, 0.25);
const DELAY: FloatParam = FloatParam::new(AL_CHORUS_DELAY, 0.0, 0.016, 0.016);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[RATE, DEPTH, FEEDBACK, DELAY];
pub(super) const INT_PARAMS: &[IntParam] = &[WAVEFORM, PHASE];

/// Modulation waveform of [Chorus] and [super::Flanger].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine = 0,
    Triangle = 1,
}

impl Waveform {
    pub(super) fn from_al(value: ALint) -> Waveform {
        if value == Waveform::Sine as ALint {
            Waveform::Sine
        } else {
            Waveform::Triangle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chorus(Effect);
typed_effect!(Chorus);

impl Chorus {
    pub fn waveform(&self) -> Waveform {
        Waveform::from_al(self.0.int(&WAVEFORM))
    }

    pub fn set_waveform(&self, waveform: Waveform) -> Result<(), SoundError> {
        self.0.set_int(&WAVEFORM, waveform as ALint)
    }

    /// Phase difference between the left and right modulation, in degrees
    /// (-180 to 180).
    pub fn phase(&self) -> ALint {
        self.0.int(&PHASE)
    }

    pub fn set_phase(&self, degrees: ALint) -> Result<(), SoundError> {
        self.0.set_int(&PHASE, degrees)
    }

    float_params! {
        /// Modulation rate in Hz, 0 to 10.
        rate, set_rate: RATE;
        depth, set_depth: DEPTH;
        feedback, set_feedback: FEEDBACK;
        /// Average delay in seconds, 0 to 0.016.
        delay, set_delay: DELAY;
    }
}
