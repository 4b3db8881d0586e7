/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::error::SoundError;
use crate::param::IntParam;

const ON_OFF: IntParam = IntParam::boolean(AL_COMPRESSOR_ONOFF, true);

pub(super) const INT_PARAMS: &[IntParam] = &[ON_OFF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressor(Effect);
typed_effect!(Compressor);

impl Compressor {
    pub fn is_enabled(&self) -> bool {
        self.0.bool(&ON_OFF)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), SoundError> {
        self.0.set_bool(&ON_OFF, enabled)
    }
}
