/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Vocal morpher, a pair of formant filters that morph between two phonemes.

use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const PHONEME_A: IntParam = IntParam::new(AL_VOCAL_MORPHER_PHONEMEA, 0, 29, Phoneme::A as ALint);
const PHONEME_A_COARSE_TUNING: IntParam =
    IntParam::new(AL_VOCAL_MORPHER_PHONEMEA_COARSE_TUNING, -24, 24, 0);
const PHONEME_B: IntParam = IntParam::new(AL_VOCAL_MORPHER_PHONEMEB, 0, 29, Phoneme::Er as ALint);
const PHONEME_B_COARSE_TUNING: IntParam =
    IntParam::new(AL_VOCAL_MORPHER_PHONEMEB_COARSE_TUNING, -24, 24, 0);
const WAVEFORM: IntParam = IntParam::new(
    AL_VOCAL_MORPHER_WAVEFORM,
    0,
    2,
    VocalMorpherWaveform::Sine as ALint,
);
const RATE: FloatParam = FloatParam::new(AL_VOCAL_MORPHER_RATE, 0.0, 10.0, 1.41);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[RATE];
pub(super) const INT_PARAMS: &[IntParam] = &[
    PHONEME_A,
    PHONEME_A_COARSE_TUNING,
    PHONEME_B,
    PHONEME_B_COARSE_TUNING,
    WAVEFORM,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phoneme {
    A = 0,
    E,
    I,
    O,
    U,
    Aa,
    Ae,
    Ah,
    Ao,
    Eh,
    Er,
    Ih,
    Iy,
    Uh,
    Uw,
    B,
    D,
    F,
    G,
    J,
    K,
    L,
    M,
    N,
    P,
    R,
    S,
    T,
    V,
    Z,
}

impl Phoneme {
    pub const ALL: [Phoneme; 30] = [
        Phoneme::A,
        Phoneme::E,
        Phoneme::I,
        Phoneme::O,
        Phoneme::U,
        Phoneme::Aa,
        Phoneme::Ae,
        Phoneme::Ah,
        Phoneme::Ao,
        Phoneme::Eh,
        Phoneme::Er,
        Phoneme::Ih,
        Phoneme::Iy,
        Phoneme::Uh,
        Phoneme::Uw,
        Phoneme::B,
        Phoneme::D,
        Phoneme::F,
        Phoneme::G,
        Phoneme::J,
        Phoneme::K,
        Phoneme::L,
        Phoneme::M,
        Phoneme::N,
        Phoneme::P,
        Phoneme::R,
        Phoneme::S,
        Phoneme::T,
        Phoneme::V,
        Phoneme::Z,
    ];

    fn from_al(value: ALint) -> Phoneme {
        usize::try_from(value)
            .ok()
            .and_then(|index| Phoneme::ALL.get(index).copied())
            .unwrap_or(Phoneme::A)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocalMorpherWaveform {
    Sine = 0,
    Triangle = 1,
    Sawtooth = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocalMorpher(Effect);
typed_effect!(VocalMorpher);

impl VocalMorpher {
    pub fn phoneme_a(&self) -> Phoneme {
        Phoneme::from_al(self.0.int(&PHONEME_A))
    }

    pub fn set_phoneme_a(&self, phoneme: Phoneme) -> Result<(), SoundError> {
        self.0.set_int(&PHONEME_A, phoneme as ALint)
    }

    /// Tuning of phoneme A in semitones, -24 to 24.
    pub fn phoneme_a_coarse_tuning(&self) -> ALint {
        self.0.int(&PHONEME_A_COARSE_TUNING)
    }

    pub fn set_phoneme_a_coarse_tuning(&self, semitones: ALint) -> Result<(), SoundError> {
        self.0.set_int(&PHONEME_A_COARSE_TUNING, semitones)
    }

    pub fn phoneme_b(&self) -> Phoneme {
        Phoneme::from_al(self.0.int(&PHONEME_B))
    }

    pub fn set_phoneme_b(&self, phoneme: Phoneme) -> Result<(), SoundError> {
        self.0.set_int(&PHONEME_B, phoneme as ALint)
    }

    pub fn phoneme_b_coarse_tuning(&self) -> ALint {
        self.0.int(&PHONEME_B_COARSE_TUNING)
    }

    pub fn set_phoneme_b_coarse_tuning(&self, semitones: ALint) -> Result<(), SoundError> {
        self.0.set_int(&PHONEME_B_COARSE_TUNING, semitones)
    }

    pub fn waveform(&self) -> VocalMorpherWaveform {
        match self.0.int(&WAVEFORM) {
            1 => VocalMorpherWaveform::Triangle,
            2 => VocalMorpherWaveform::Sawtooth,
            _ => VocalMorpherWaveform::Sine,
        }
    }

    pub fn set_waveform(&self, waveform: VocalMorpherWaveform) -> Result<(), SoundError> {
        self.0.set_int(&WAVEFORM, waveform as ALint)
    }

    float_params! {
        /// Morph rate in Hz, 0 to 10.
        rate, set_rate: RATE;
    }
}
