/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::{float_params, FloatParam, IntParam};

const FREQUENCY: FloatParam = FloatParam::new(AL_FREQUENCY_SHIFTER_FREQUENCY, 0.0, 24000.0, 0.0);
const LEFT_DIRECTION: IntParam = IntParam::new(
    AL_FREQUENCY_SHIFTER_LEFT_DIRECTION,
    0,
    2,
    ShiftDirection::Down as ALint,
);
const RIGHT_DIRECTION: IntParam = IntParam::new(
    AL_FREQUENCY_SHIFTER_RIGHT_DIRECTION,
    0,
    2,
    ShiftDirection::Down as ALint,
);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[FREQUENCY];
pub(super) const INT_PARAMS: &[IntParam] = &[LEFT_DIRECTION, RIGHT_DIRECTION];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Down = 0,
    Up = 1,
    Off = 2,
}

impl ShiftDirection {
    fn from_al(value: ALint) -> ShiftDirection {
        match value {
            1 => ShiftDirection::Up,
            2 => ShiftDirection::Off,
            _ => ShiftDirection::Down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyShifter(Effect);
typed_effect!(FrequencyShifter);

impl FrequencyShifter {
    float_params! {
        /// Shift amount in Hz, 0 to 24000.
        frequency, set_frequency: FREQUENCY;
    }

    pub fn left_direction(&self) -> ShiftDirection {
        ShiftDirection::from_al(self.0.int(&LEFT_DIRECTION))
    }

    pub fn set_left_direction(&self, direction: ShiftDirection) -> Result<(), SoundError> {
        self.0.set_int(&LEFT_DIRECTION, direction as ALint)
    }

    pub fn right_direction(&self) -> ShiftDirection {
        ShiftDirection::from_al(self.0.int(&RIGHT_DIRECTION))
    }

    pub fn set_right_direction(&self, direction: ShiftDirection) -> Result<(), SoundError> {
        self.0.set_int(&RIGHT_DIRECTION, direction as ALint)
    }
}
