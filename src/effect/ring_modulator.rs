/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const FREQUENCY: FloatParam = FloatParam::new(AL_RING_MODULATOR_FREQUENCY, 0.0, 8000.0, 440.0);
const HIGHPASS_CUTOFF: FloatParam =
    FloatParam::new(AL_RING_MODULATOR_HIGHPASS_CUTOFF, 0.0, 24000.0, 800.0);
const WAVEFORM: IntParam = IntParam::new(
    AL_RING_MODULATOR_WAVEFORM,
    0,
    2,
    RingModulatorWaveform::Sine as ALint,
);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[FREQUENCY, HIGHPASS_CUTOFF];
pub(super) const INT_PARAMS: &[IntParam] = &[WAVEFORM];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingModulatorWaveform {
    Sine = 0,
    Sawtooth = 1,
    Square = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingModulator(Effect);
typed_effect!(RingModulator);

impl RingModulator {
    float_params! {
        /// Carrier frequency in Hz, 0 to 8000.
        frequency, set_frequency: FREQUENCY;
        highpass_cutoff, set_highpass_cutoff: HIGHPASS_CUTOFF;
    }

    pub fn waveform(&self) -> RingModulatorWaveform {
        match self.0.int(&WAVEFORM) {
            1 => RingModulatorWaveform::Sawtooth,
            2 => RingModulatorWaveform::Square,
            _ => RingModulatorWaveform::Sine,
        }
    }

    pub fn set_waveform(&self, waveform: RingModulatorWaveform) -> Result<(), SoundError> {
        self.0.set_int(&WAVEFORM, waveform as ALint)
    }
}
