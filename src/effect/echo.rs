/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
use super::{typed_effect, Effect};
use crate::audio::openal::*;
use crate::param::{float_params, FloatParam};

const DELAY: FloatParam = FloatParam::new(AL_ECHO_DELAY, 0.0, 0.207, 0.1);
const LR_DELAY: FloatParam = FloatParam::new(AL_ECHO_LRDELAY, 0.0, 0.404, 0.1);
const DAMPING: FloatParam = FloatParam::new(AL_ECHO_DAMPING, 0.0, 0.99, 0.5);
const FEEDBACK: FloatParam = FloatParam::new(AL_ECHO_FEEDBACK, 0.0, 1.0, 0.5);
const SPREAD: FloatParam = FloatParam::new(AL_ECHO_SPREAD, -1.0, 1.0, -1.0);

pub(super) const FLOAT_PARAMS: &[FloatParam] = &[DELAY, LR_DELAY, DAMPING, FEEDBACK, SPREAD];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo(Effect);
typed_effect!(Echo);

impl Echo {
    float_params! {
        /// Delay in seconds of the first echo, 0 to 0.207.
        delay, set_delay: DELAY;
        /// Delay in seconds between the first and second echo, 0 to 0.404.
        lr_delay, set_lr_delay: LR_DELAY;
        damping, set_damping: DAMPING;
        feedback, set_feedback: FEEDBACK;
        /// Stereo spread of the echoes, -1 (left) to 1 (right).
        spread, set_spread: SPREAD;
    }
}
