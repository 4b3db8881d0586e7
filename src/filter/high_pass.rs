/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_filter, Filter};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const GAIN: FloatParam = FloatParam::new(AL_HIGHPASS_GAIN, 0.0, 1.0, 1.0);
const GAIN_LF: FloatParam = FloatParam::new(AL_HIGHPASS_GAINLF, 0.0, 1.0, 1.0);

pub(super) const PARAMS: &[FloatParam] = &[GAIN, GAIN_LF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighPass(pub(super) Filter);
typed_filter!(HighPass);

impl HighPass {
    float_params! {
        gain, set_gain: GAIN;
        /// Gain of low frequencies, 0 to 1.
        gain_lf, set_gain_lf: GAIN_LF;
    }
}
