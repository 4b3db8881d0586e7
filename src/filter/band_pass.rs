/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_filter, Filter};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const GAIN: FloatParam = FloatParam::new(AL_BANDPASS_GAIN, 0.0, 1.0, 1.0);
const GAIN_LF: FloatParam = FloatParam::new(AL_BANDPASS_GAINLF, 0.0, 1.0, 1.0);
const GAIN_HF: FloatParam = FloatParam::new(AL_BANDPASS_GAINHF, 0.0, 1.0, 1.0);

pub(super) const PARAMS: &[FloatParam] = &[GAIN, GAIN_LF, GAIN_HF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPass(pub(super) Filter);
typed_filter!(BandPass);

impl BandPass {
    float_params! {
        gain, set_gain: GAIN;
        gain_lf, set_gain_lf: GAIN_LF;
        gain_hf, set_gain_hf: GAIN_HF;
    }
}
