/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The common core of every OpenAL object, and the registry that lets
//! [crate::System::shutdown] free all of them at once.
//!
//! Each object type (source, buffer, etc.) is a cheaply cloneable handle around
//! an `Arc` of an inner struct. The inner struct owns an [ObjectHandle], which
//! holds the native name and whether it is still allocated, and implements
//! [Destroy]. The registry only keeps weak references, so it never keeps an
//! object alive by itself.
//!
//! Native names are only unique within a context (sources, effect slots) or a
//! device (everything else), so the registry tells objects apart by a serial
//! number of its own. Each handle also remembers the context that was current
//! when it was allocated, and makes it current again for its own calls.

use crate::audio::openal::{ALCcontext, ALuint, Api, EfxFunctions, Functions};
use crate::error::SoundError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// The kinds of OpenAL object. The declaration order is the order in which
/// [Registry::destroy_all] tears them down: things that refer to other objects
/// go before the things they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Source,
    EffectSlot,
    Effect,
    Filter,
    Buffer,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Source => "Source",
            ObjectKind::EffectSlot => "EffectSlot",
            ObjectKind::Effect => "Effect",
            ObjectKind::Filter => "Filter",
            ObjectKind::Buffer => "Buffer",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-specific teardown of an object. Implementations must be idempotent.
pub(crate) trait Destroy: Send + Sync {
    fn destroy(&self) -> Result<(), SoundError>;
}

/// Every live object of a [crate::System], keyed by kind and then by
/// registration serial.
#[derive(Default)]
pub(crate) struct Registry {
    objects: Mutex<BTreeMap<(ObjectKind, u64), (ALuint, Weak<dyn Destroy>)>>,
    next_serial: AtomicU64,
}

impl Registry {
    /// Returns the serial to [deregister](Self::deregister) the object with.
    pub fn register(&self, kind: ObjectKind, id: ALuint, object: Weak<dyn Destroy>) -> u64 {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        self.objects.lock().insert((kind, serial), (id, object));
        serial
    }

    pub fn deregister(&self, kind: ObjectKind, serial: u64) {
        self.objects.lock().remove(&(kind, serial));
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Destroy every registered object, in [ObjectKind] order. Teardown carries
    /// on past failures; the first one is returned.
    pub fn destroy_all(&self) -> Result<(), SoundError> {
        // The lock can't be held while destroying, because destroying an
        // object deregisters it.
        let objects: Vec<_> = std::mem::take(&mut *self.objects.lock())
            .into_iter()
            .collect();

        let mut first_error = None;
        for ((kind, _), (id, object)) in objects {
            let Some(object) = object.upgrade() else {
                continue;
            };
            if let Err(err) = object.destroy() {
                log!("Couldn't destroy {} {}: {}", kind, id, err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextPtr(pub *mut ALCcontext);
// SAFETY: ALC context handles may be used from any thread.
unsafe impl Send for ContextPtr {}
unsafe impl Sync for ContextPtr {}

/// The native name of an object, plus what's needed to make calls on it.
pub(crate) struct ObjectHandle {
    api: Arc<Api>,
    registry: Arc<Registry>,
    kind: ObjectKind,
    id: ALuint,
    /// The context current at allocation. Null if there was none.
    owner: ContextPtr,
    serial: Mutex<Option<u64>>,
    allocated: Mutex<bool>,
}

impl ObjectHandle {
    /// Allocate a native object with `generate` (an `alGen*` call), checking
    /// for errors. The caller still has to [register](Self::register) it once
    /// it is wrapped in an `Arc`.
    pub fn allocate(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        kind: ObjectKind,
        generate: impl FnOnce(&Api) -> Result<ALuint, SoundError>,
    ) -> Result<ObjectHandle, SoundError> {
        api.clear_error();
        let id = generate(api)?;
        api.error_check(kind.name())?;
        log_dbg!("Allocated {} {}", kind, id);
        Ok(ObjectHandle {
            api: Arc::clone(api),
            registry: Arc::clone(registry),
            kind,
            id,
            owner: ContextPtr(api.current_context()),
            serial: Mutex::new(None),
            allocated: Mutex::new(true),
        })
    }

    pub fn register(&self, object: Weak<dyn Destroy>) {
        let serial = self.registry.register(self.kind, self.id, object);
        *self.serial.lock() = Some(serial);
    }

    pub fn api(&self) -> &Arc<Api> {
        &self.api
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The native name. Only meaningful while [Self::is_allocated].
    pub fn id(&self) -> ALuint {
        self.id
    }

    pub fn is_allocated(&self) -> bool {
        *self.allocated.lock()
    }

    pub fn check_allocated(&self) -> Result<ALuint, SoundError> {
        if self.is_allocated() {
            Ok(self.id)
        } else {
            Err(SoundError::Destroyed(self.kind))
        }
    }

    /// Run `f` with the owning context current, then put back whichever
    /// context was current before.
    fn in_owner_context<T>(
        &self,
        f: impl FnOnce() -> Result<T, SoundError>,
    ) -> Result<T, SoundError> {
        let previous = ContextPtr(self.api.current_context());
        if self.owner.0.is_null() || previous == self.owner {
            return f();
        }
        if !self.api.make_context_current(self.owner.0) {
            return Err(SoundError::ContextCurrent(format!(
                "owning {} {}",
                self.kind, self.id
            )));
        }
        let result = f();
        if !self.api.make_context_current(previous.0) {
            log!(
                "Couldn't restore the current context after a call on {} {}",
                self.kind,
                self.id
            );
        }
        result
    }

    /// Make a core AL call on this object, with error checking.
    pub fn call<T>(&self, f: impl FnOnce(&Functions, ALuint) -> T) -> Result<T, SoundError> {
        let id = self.check_allocated()?;
        self.in_owner_context(|| {
            self.api.clear_error();
            let result = f(self.api.fns(), id);
            self.api.error_check(self.kind.name())?;
            Ok(result)
        })
    }

    /// Make an EFX call on this object, with error checking.
    pub fn call_efx<T>(
        &self,
        f: impl FnOnce(&EfxFunctions, ALuint) -> T,
    ) -> Result<T, SoundError> {
        let id = self.check_allocated()?;
        let efx = self.api.efx()?;
        self.in_owner_context(|| {
            self.api.clear_error();
            let result = f(efx, id);
            self.api.error_check(self.kind.name())?;
            Ok(result)
        })
    }

    /// Free the native object with `delete` (an `alDelete*` call) and
    /// deregister it. Returns `false` if it was already released. If `delete`
    /// fails the object stays allocated.
    pub fn release(&self, delete: impl FnOnce(&Api, ALuint)) -> Result<bool, SoundError> {
        let mut allocated = self.allocated.lock();
        if !*allocated {
            return Ok(false);
        }
        self.in_owner_context(|| {
            self.api.clear_error();
            delete(&self.api, self.id);
            self.api.error_check(self.kind.name())
        })?;
        *allocated = false;
        drop(allocated);

        if let Some(serial) = self.serial.lock().take() {
            self.registry.deregister(self.kind, serial);
        }
        log_dbg!("Released {} {}", self.kind, self.id);
        Ok(true)
    }
}
