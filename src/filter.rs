/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! EFX filters, used on a source's direct path or on its auxiliary sends.
//!
//! Like effects, a filter's parameters are copied when it is attached to a
//! source, so it has to be attached again after changing them.

mod band_pass;
mod high_pass;
mod low_pass;

pub use band_pass::BandPass;
pub use high_pass::HighPass;
pub use low_pass::LowPass;

use crate::audio::openal::*;
use crate::error::SoundError;
use crate::object::{Destroy, ObjectHandle, ObjectKind, Registry};
use crate::param::{FloatParam, ParamValues};
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
}

impl FilterType {
    pub const ALL: [FilterType; 3] = [FilterType::LowPass, FilterType::HighPass, FilterType::BandPass];

    /// The `AL_FILTER_*` value.
    pub fn al_value(self) -> ALint {
        match self {
            FilterType::LowPass => AL_FILTER_LOWPASS,
            FilterType::HighPass => AL_FILTER_HIGHPASS,
            FilterType::BandPass => AL_FILTER_BANDPASS,
        }
    }

    fn params(self) -> &'static [FloatParam] {
        match self {
            FilterType::LowPass => low_pass::PARAMS,
            FilterType::HighPass => high_pass::PARAMS,
            FilterType::BandPass => band_pass::PARAMS,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterType::LowPass => "low-pass",
            FilterType::HighPass => "high-pass",
            FilterType::BandPass => "band-pass",
        })
    }
}

/// Handle to an EFX filter object. Clones refer to the same filter.
#[derive(Clone)]
pub struct Filter {
    inner: Arc<FilterInner>,
}

struct FilterInner {
    handle: ObjectHandle,
    filter_type: FilterType,
    values: ParamValues,
}

impl Destroy for FilterInner {
    fn destroy(&self) -> Result<(), SoundError> {
        self.handle
            .release(|api, id| {
                if let Ok(efx) = api.efx() {
                    unsafe { (efx.alDeleteFilters)(1, &id) };
                }
            })
            .map(|_| ())
    }
}

impl Drop for FilterInner {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log!("Couldn't free filter {}: {}", self.handle.id(), err);
        }
    }
}

impl Filter {
    pub(crate) fn new(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        filter_type: FilterType,
    ) -> Result<Filter, SoundError> {
        let handle = ObjectHandle::allocate(api, registry, ObjectKind::Filter, |api| {
            let efx = api.efx()?;
            let mut id = 0;
            unsafe { (efx.alGenFilters)(1, &mut id) };
            Ok(id)
        })?;
        let inner = Arc::new(FilterInner {
            handle,
            filter_type,
            values: ParamValues::default(),
        });
        let weak: Weak<dyn Destroy> = Arc::downgrade(&inner) as _;
        inner.handle.register(weak);

        let filter = Filter { inner };
        let al_type = filter_type.al_value();
        filter
            .inner
            .handle
            .call_efx(|efx, id| unsafe { (efx.alFilteri)(id, AL_FILTER_TYPE, al_type) })?;
        for param in filter_type.params() {
            filter.set_float(param, param.default)?;
        }
        Ok(filter)
    }

    pub fn id(&self) -> ALuint {
        self.inner.handle.id()
    }

    pub fn filter_type(&self) -> FilterType {
        self.inner.filter_type
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.handle.is_allocated()
    }

    /// Free the native filter. Does nothing if it was already freed.
    pub fn destroy(&self) -> Result<(), SoundError> {
        self.inner.destroy()
    }

    /// The native name to attach this filter with, checking that it is still
    /// allocated.
    pub(crate) fn attachable_id(&self) -> Result<ALuint, SoundError> {
        self.inner.handle.check_allocated()
    }

    pub(crate) fn float(&self, param: &FloatParam) -> f32 {
        self.inner.values.float(param)
    }

    pub(crate) fn set_float(&self, param: &FloatParam, value: f32) -> Result<(), SoundError> {
        let value = param.clamp(value);
        self.inner
            .handle
            .call_efx(|efx, id| unsafe { (efx.alFilterf)(id, param.param, value) })?;
        self.inner.values.set_float(param, value);
        Ok(())
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Filter {}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("id", &self.id())
            .field("type", &self.filter_type())
            .finish()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter {} {}", self.id(), self.filter_type())
    }
}

macro_rules! typed_filter {
    ($name:ident) => {
        impl AsRef<$crate::filter::Filter> for $name {
            fn as_ref(&self) -> &$crate::filter::Filter {
                &self.0
            }
        }

        impl From<$name> for $crate::filter::Filter {
            fn from(filter: $name) -> $crate::filter::Filter {
                filter.0
            }
        }

        impl $name {
            pub(crate) fn from_filter(filter: $crate::filter::Filter) -> $name {
                $name(filter)
            }
        }
    };
}
pub(crate) use typed_filter;

/// A filter of any type.
#[derive(Debug, Clone)]
pub enum AnyFilter {
    LowPass(LowPass),
    HighPass(HighPass),
    BandPass(BandPass),
}

impl AnyFilter {
    pub(crate) fn from_filter(filter: Filter) -> AnyFilter {
        match filter.filter_type() {
            FilterType::LowPass => AnyFilter::LowPass(LowPass(filter)),
            FilterType::HighPass => AnyFilter::HighPass(HighPass(filter)),
            FilterType::BandPass => AnyFilter::BandPass(BandPass(filter)),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.as_ref().filter_type()
    }
}

impl AsRef<Filter> for AnyFilter {
    fn as_ref(&self) -> &Filter {
        match self {
            AnyFilter::LowPass(filter) => filter.as_ref(),
            AnyFilter::HighPass(filter) => filter.as_ref(),
            AnyFilter::BandPass(filter) => filter.as_ref(),
        }
    }
}
