/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::IntParam;

const COARSE_TUNE: IntParam = IntParam::new(AL_PITCH_SHIFTER_COARSE_TUNE, -12, 12, 12);
const FINE_TUNE: IntParam = IntParam::new(AL_PITCH_SHIFTER_FINE_TUNE, -50, 50, 0);

pub(super) const INT_PARAMS: &[IntParam] = &[COARSE_TUNE, FINE_TUNE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchShifter(Effect);
typed_effect!(PitchShifter);

impl PitchShifter {
    /// Shift in semitones, -12 to 12.
    pub fn coarse_tune(&self) -> ALint {
        self.0.int(&COARSE_TUNE)
    }

    pub fn set_coarse_tune(&self, semitones: ALint) -> Result<(), SoundError> {
        self.0.set_int(&COARSE_TUNE, semitones)
    }

    /// Shift in cents, -50 to 50.
    pub fn fine_tune(&self) -> ALint {
        self.0.int(&FINE_TUNE)
    }

    pub fn set_fine_tune(&self, cents: ALint) -> Result<(), SoundError> {
        self.0.set_int(&FINE_TUNE, cents)
    }
}
