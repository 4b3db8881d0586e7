/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The standard (non-EAX) reverb.

use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const DENSITY: FloatParam = FloatParam::new(AL_REVERB_DENSITY, 0.0, 1.0, 1.0);
const DIFFUSION: FloatParam = FloatParam::new(AL_REVERB_DIFFUSION, 0.0, 1.0, 1.0);
const GAIN: FloatParam = FloatParam::new(AL_REVERB_GAIN, 0.0, 1.0, 0.32);
const GAIN_HF: FloatParam = FloatParam::new(AL_REVERB_GAINHF, 0.0, 1.0, 0.89);
const DECAY_TIME: FloatParam = FloatParam::new(AL_REVERB_DECAY_TIME, 0.1, 20.0, 1.49);
const DECAY_HF_RATIO: FloatParam = FloatParam::new(AL_REVERB_DECAY_HFRATIO, 0.1, 2.0, 0.83);
const REFLECTIONS_GAIN: FloatParam =
    FloatParam::new(AL_REVERB_REFLECTIONS_GAIN, 0.0, 3.16, 0.05);
const REFLECTIONS_DELAY: FloatParam =
    FloatParam::new(AL_REVERB_REFLECTIONS_DELAY, 0.0, 0.3, 0.007);
const LATE_REVERB_GAIN: FloatParam = FloatParam::new(AL_REVERB_LATE_REVERB_GAIN, 0.0, 10.0, 1.26);
const LATE_REVERB_DELAY: FloatParam =
    FloatParam::new(AL_REVERB_LATE_REVERB_DELAY, 0.0, 0.1, 0.011);
const AIR_ABSORPTION_GAIN_HF: FloatParam =
    FloatParam::new(AL_REVERB_AIR_ABSORPTION_GAINHF, 0.892, 1.0, 0.994);
const ROOM_ROLLOFF_FACTOR: FloatParam =
    FloatParam::new(AL_REVERB_ROOM_ROLLOFF_FACTOR, 0.0, 10.0, 0.0);
const DECAY_HF_LIMIT: IntParam = IntParam::boolean(AL_REVERB_DECAY_HFLIMIT, true);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[
    DENSITY,
    DIFFUSION,
    GAIN,
    GAIN_HF,
    DECAY_TIME,
    DECAY_HF_RATIO,
    REFLECTIONS_GAIN,
    REFLECTIONS_DELAY,
    LATE_REVERB_GAIN,
    LATE_REVERB_DELAY,
    AIR_ABSORPTION_GAIN_HF,
    ROOM_ROLLOFF_FACTOR,
];
pub(super) const INT_PARAMS: &[IntParam] = &[DECAY_HF_LIMIT];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reverb(Effect);
typed_effect!(Reverb);

impl Reverb {
    float_params! {
        /// Modal density of the reverb, 0 to 1.
        density, set_density: DENSITY;
        /// Echo density of the reverb decay, 0 to 1.
        diffusion, set_diffusion: DIFFUSION;
        /// Master volume of the reflected sound, 0 to 1.
        gain, set_gain: GAIN;
        /// High frequency attenuation of the reflected sound, 0 to 1.
        gain_hf, set_gain_hf: GAIN_HF;
        /// Decay time in seconds, 0.1 to 20.
        decay_time, set_decay_time: DECAY_TIME;
        /// Ratio of high frequency to low frequency decay time, 0.1 to 2.
        decay_hf_ratio, set_decay_hf_ratio: DECAY_HF_RATIO;
        /// Volume of the initial reflections, 0 to 3.16.
        reflections_gain, set_reflections_gain: REFLECTIONS_GAIN;
        /// Delay in seconds between the direct sound and the first
        /// reflection, 0 to 0.3.
        reflections_delay, set_reflections_delay: REFLECTIONS_DELAY;
        /// Volume of the late reverb, 0 to 10.
        late_reverb_gain, set_late_reverb_gain: LATE_REVERB_GAIN;
        /// Delay in seconds between the first reflection and the late
        /// reverb, 0 to 0.1.
        late_reverb_delay, set_late_reverb_delay: LATE_REVERB_DELAY;
        air_absorption_gain_hf, set_air_absorption_gain_hf: AIR_ABSORPTION_GAIN_HF;
        room_rolloff_factor, set_room_rolloff_factor: ROOM_ROLLOFF_FACTOR;
    }

    /// Whether high frequency decay is limited by air absorption.
    pub fn decay_hf_limit(&self) -> bool {
        self.0.bool(&DECAY_HF_LIMIT)
    }

    pub fn set_decay_hf_limit(&self, value: bool) -> Result<(), SoundError> {
        self.0.set_bool(&DECAY_HF_LIMIT, value)
    }
}
