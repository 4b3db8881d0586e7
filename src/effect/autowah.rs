/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const ATTACK_TIME: FloatParam = FloatParam::new(AL_AUTOWAH_ATTACK_TIME, 0.0001, 1.0, 0.06);
const RELEASE_TIME: FloatParam = FloatParam::new(AL_AUTOWAH_RELEASE_TIME, 0.0001, 1.0, 0.06);
const RESONANCE: FloatParam = FloatParam::new(AL_AUTOWAH_RESONANCE, 2.0, 1000.0, 1000.0);
const PEAK_GAIN: FloatParam = FloatParam::new(AL_AUTOWAH_PEAK_GAIN, 0.00003, 31621.0, 11.22);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[ATTACK_TIME, RELEASE_TIME, RESONANCE, PEAK_GAIN];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autowah(Effect);
typed_effect!(Autowah);

impl Autowah {
    float_params! {
        /// Attack time in seconds, 0.0001 to 1.
        attack_time, set_attack_time: ATTACK_TIME;
        /// Release time in seconds, 0.0001 to 1.
        release_time, set_release_time: RELEASE_TIME;
        resonance, set_resonance: RESONANCE;
        peak_gain, set_peak_gain: PEAK_GAIN;
    }
}
