/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Descriptions of EFX effect and filter parameters, with the ranges and
//! defaults from the EFX specification.

use crate::audio::openal::{ALenum, ALint};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FloatParam {
    pub param: ALenum,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl FloatParam {
    pub const fn new(param: ALenum, min: f32, max: f32, default: f32) -> FloatParam {
        FloatParam {
            param,
            min,
            max,
            default,
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IntParam {
    pub param: ALenum,
    pub min: ALint,
    pub max: ALint,
    pub default: ALint,
}

impl IntParam {
    pub const fn new(param: ALenum, min: ALint, max: ALint, default: ALint) -> IntParam {
        IntParam {
            param,
            min,
            max,
            default,
        }
    }

    /// A boolean parameter, `AL_TRUE` or `AL_FALSE`.
    pub const fn boolean(param: ALenum, default: bool) -> IntParam {
        IntParam::new(param, 0, 1, default as ALint)
    }

    pub fn clamp(&self, value: ALint) -> ALint {
        value.clamp(self.min, self.max)
    }
}

/// The last value successfully sent for each parameter of an effect or filter.
#[derive(Default)]
pub(crate) struct ParamValues {
    floats: Mutex<HashMap<ALenum, f32>>,
    ints: Mutex<HashMap<ALenum, ALint>>,
}

impl ParamValues {
    pub fn float(&self, param: &FloatParam) -> f32 {
        self.floats
            .lock()
            .get(&param.param)
            .copied()
            .unwrap_or(param.default)
    }

    pub fn set_float(&self, param: &FloatParam, value: f32) {
        self.floats.lock().insert(param.param, value);
    }

    pub fn int(&self, param: &IntParam) -> ALint {
        self.ints
            .lock()
            .get(&param.param)
            .copied()
            .unwrap_or(param.default)
    }

    pub fn set_int(&self, param: &IntParam, value: ALint) {
        self.ints.lock().insert(param.param, value);
    }
}

/// Defines getter/setter pairs for [FloatParam]s on a newtype around an effect
/// or filter handle.
macro_rules! float_params {
    ($($(#[$meta:meta])* $getter:ident, $setter:ident: $param:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $getter(&self) -> f32 {
                self.0.float(&$param)
            }

            $(#[$meta])*
            ///
            /// The value is clamped to the parameter's valid range.
            pub fn $setter(&self, value: f32) -> Result<(), $crate::error::SoundError> {
                self.0.set_float(&$param, value)
            }
        )*
    };
}
pub(crate) use float_params;
