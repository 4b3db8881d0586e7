/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const EDGE: FloatParam = FloatParam::new(AL_DISTORTION_EDGE, 0.0, 1.0, 0.2);
const GAIN: FloatParam = FloatParam::new(AL_DISTORTION_GAIN, 0.01, 1.0, 0.05);
const LOWPASS_CUTOFF: FloatParam =
    FloatParam::new(AL_DISTORTION_LOWPASS_CUTOFF, 80.0, 24000.0, 8000.0);
const EQ_CENTER: FloatParam = FloatParam::new(AL_DISTORTION_EQCENTER, 80.0, 24000.0, 3600.0);
const EQ_BANDWIDTH: FloatParam =
    FloatParam::new(AL_DISTORTION_EQBANDWIDTH, 80.0, 24000.0, 3600.0);

pub(super) const FLOAT_PARAMS: &[FloatParam] =
    &[EDGE, GAIN, LOWPASS_CUTOFF, EQ_CENTER, EQ_BANDWIDTH];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distortion(Effect);
typed_effect!(Distortion);

impl Distortion {
    float_params! {
        /// Shape of the distortion, 0 to 1. Higher is harsher.
        edge, set_edge: EDGE;
        gain, set_gain: GAIN;
        /// Cutoff in Hz of the low-pass filter applied before distorting.
        lowpass_cutoff, set_lowpass_cutoff: LOWPASS_CUTOFF;
        /// Center frequency in Hz of the post-distortion band-pass.
        eq_center, set_eq_center: EQ_CENTER;
        eq_bandwidth, set_eq_bandwidth: EQ_BANDWIDTH;
    }
}
