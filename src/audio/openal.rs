/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! OpenAL bindings (resolved at runtime via [oal_openal_wrapper]) and
//! error-checked access to them.
//!
//! OpenAL reports errors through a sticky per-context error code, so every
//! wrapped call goes through the same sequence: [Api::clear_error], the call
//! itself, then [Api::error_check].

pub use oal_openal_wrapper::al_types::*;
pub use oal_openal_wrapper::alc_types::*;
pub use oal_openal_wrapper::*;

use crate::error::SoundError;
use std::ffi::{CStr, CString};

/// Upper bound on how many stale error codes [Api::clear_error] will drain.
/// Some implementations keep returning an error while no context is current.
const MAX_STALE_ERRORS: usize = 64;

/// The loaded OpenAL implementation, shared by every object of a
/// [crate::System].
pub struct Api {
    al: OpenAl,
}

impl Api {
    pub fn new(al: OpenAl) -> Api {
        Api { al }
    }

    pub fn fns(&self) -> &Functions {
        &self.al.fns
    }

    pub fn has_efx(&self) -> bool {
        self.al.efx.is_some()
    }

    pub fn efx(&self) -> Result<&EfxFunctions, SoundError> {
        self.al.efx.as_ref().ok_or(SoundError::EfxUnavailable)
    }

    pub fn current_context(&self) -> *mut ALCcontext {
        unsafe { (self.fns().alcGetCurrentContext)() }
    }

    /// `alcMakeContextCurrent`. Null leaves no context current.
    pub fn make_context_current(&self, context: *mut ALCcontext) -> bool {
        unsafe { (self.fns().alcMakeContextCurrent)(context) == ALC_TRUE }
    }

    /// Discard any error left over from previous calls.
    pub fn clear_error(&self) {
        for _ in 0..MAX_STALE_ERRORS {
            if unsafe { (self.fns().alGetError)() } == AL_NO_ERROR {
                return;
            }
        }
        log_dbg!("alGetError never returned AL_NO_ERROR, giving up");
    }

    /// Poll the AL error code and turn it into a [SoundError::Al] on behalf of
    /// `object`.
    pub fn error_check(&self, object: &'static str) -> Result<(), SoundError> {
        let code = unsafe { (self.fns().alGetError)() };
        if code == AL_NO_ERROR {
            return Ok(());
        }
        let message = self.error_string(code);
        log_dbg!("{} error {:#x}: {}", object, code, message);
        Err(SoundError::Al { object, message })
    }

    /// Poll the ALC error code of `device`.
    pub fn alc_error_check(
        &self,
        device: *mut ALCdevice,
        device_name: &str,
    ) -> Result<(), SoundError> {
        let code = unsafe { (self.fns().alcGetError)(device) };
        if code == ALC_NO_ERROR {
            return Ok(());
        }
        Err(SoundError::Alc {
            device: device_name.to_string(),
            code,
        })
    }

    fn error_string(&self, code: ALenum) -> String {
        let message = unsafe { (self.fns().alGetString)(code) };
        if message.is_null() {
            format!("unknown error {:#x}", code)
        } else {
            unsafe { CStr::from_ptr(message) }
                .to_string_lossy()
                .into_owned()
        }
    }

    /// `alGetString` for one of the informational strings (`AL_VENDOR` etc.)
    pub fn get_string(&self, param: ALenum) -> Result<String, SoundError> {
        self.clear_error();
        let value = unsafe { (self.fns().alGetString)(param) };
        self.error_check("System")?;
        if value.is_null() {
            return Ok(String::new());
        }
        Ok(unsafe { CStr::from_ptr(value) }
            .to_string_lossy()
            .into_owned())
    }

    /// `alcGetString` for a parameter that returns a single string.
    pub fn alc_get_string(&self, device: *mut ALCdevice, param: ALCenum) -> Option<String> {
        let value = unsafe { (self.fns().alcGetString)(device, param) };
        if value.is_null() {
            return None;
        }
        Some(
            unsafe { CStr::from_ptr(value) }
                .to_string_lossy()
                .into_owned(),
        )
    }

    /// `alcGetString` for a parameter that returns a list of strings, each
    /// terminated by a NUL, with an extra NUL after the last one.
    pub fn alc_get_string_list(&self, device: *mut ALCdevice, param: ALCenum) -> Vec<String> {
        let value = unsafe { (self.fns().alcGetString)(device, param) };
        if value.is_null() {
            return Vec::new();
        }
        unsafe { parse_string_list(value) }
    }

    pub fn alc_is_extension_present(&self, device: *mut ALCdevice, name: &str) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        unsafe { (self.fns().alcIsExtensionPresent)(device, name.as_ptr()) == ALC_TRUE }
    }

    pub fn alc_get_integer(&self, device: *mut ALCdevice, param: ALCenum) -> ALCint {
        let mut value: ALCint = 0;
        unsafe { (self.fns().alcGetIntegerv)(device, param, 1, &mut value) };
        value
    }

    pub fn is_extension_present(&self, name: &str) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        unsafe { (self.fns().alIsExtensionPresent)(name.as_ptr()) == AL_TRUE }
    }
}

/// Split a double-NUL-terminated string list.
///
/// # Safety
///
/// `list` must point to a sequence of NUL-terminated strings ending with an
/// empty string.
unsafe fn parse_string_list(mut list: *const ALCchar) -> Vec<String> {
    let mut strings = Vec::new();
    loop {
        let string = CStr::from_ptr(list);
        let len = string.to_bytes().len();
        if len == 0 {
            return strings;
        }
        strings.push(string.to_string_lossy().into_owned());
        list = list.add(len + 1);
    }
}
