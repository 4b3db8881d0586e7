/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Four-band equalizer: a low shelf, two peaking mid bands, and a high shelf.

use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const LOW_GAIN: FloatParam = FloatParam::new(AL_EQUALIZER_LOW_GAIN, 0.126, 7.943, 1.0);
const LOW_CUTOFF: FloatParam = FloatParam::new(AL_EQUALIZER_LOW_CUTOFF, 50.0, 800.0, 200.0);
const MID1_GAIN: FloatParam = FloatParam::new(AL_EQUALIZER_MID1_GAIN, 0.126, 7.943, 1.0);
const MID1_CENTER: FloatParam = FloatParam::new(AL_EQUALIZER_MID1_CENTER, 200.0, 3000.0, 500.0);
const MID1_WIDTH: FloatParam = FloatParam::new(AL_EQUALIZER_MID1_WIDTH, 0.01, 1.0, 1.0);
const MID2_GAIN: FloatParam = FloatParam::new(AL_EQUALIZER_MID2_GAIN, 0.126, 7.943, 1.0);
const MID2_CENTER: FloatParam =
    FloatParam::new(AL_EQUALIZER_MID2_CENTER, 1000.0, 8000.0, 3000.0);
const MID2_WIDTH: FloatParam = FloatParam::new(AL_EQUALIZER_MID2_WIDTH, 0.01, 1.0, 1.0);
const HIGH_GAIN: FloatParam = FloatParam::new(AL_EQUALIZER_HIGH_GAIN, 0.126, 7.943, 1.0);
const HIGH_CUTOFF: FloatParam =
    FloatParam::new(AL_EQUALIZER_HIGH_CUTOFF, 4000.0, 16000.0, 6000.0);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[
    LOW_GAIN,
    LOW_CUTOFF,
    MID1_GAIN,
    MID1_CENTER,
    MID1_WIDTH,
    MID2_GAIN,
    MID2_CENTER,
    MID2_WIDTH,
    HIGH_GAIN,
    HIGH_CUTOFF,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equalizer(Effect);
typed_effect!(Equalizer);

impl Equalizer {
    float_params! {
        low_gain, set_low_gain: LOW_GAIN;
        /// Low shelf cutoff in Hz, 50 to 800.
        low_cutoff, set_low_cutoff: LOW_CUTOFF;
        mid1_gain, set_mid1_gain: MID1_GAIN;
        mid1_center, set_mid1_center: MID1_CENTER;
        /// Width of the first mid band in octaves, 0.01 to 1.
        mid1_width, set_mid1_width: MID1_WIDTH;
        mid2_gain, set_mid2_gain: MID2_GAIN;
        mid2_center, set_mid2_center: MID2_CENTER;
        mid2_width, set_mid2_width: MID2_WIDTH;
        high_gain, set_high_gain: HIGH_GAIN;
        /// High shelf cutoff in Hz, 4000 to 16000.
        high_cutoff, set_high_cutoff: HIGH_CUTOFF;
    }
}
