use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::foundation::error::{StrobeError, StrobeResult};
use crate::signal::runtime::{Runtime, RuntimeInner, SignalId};

/// Typed handle to a signal owned by a [`Runtime`].
///
/// Handles are cheap to clone and are meant to be moved into derived closures and scene
/// bindings. They do not keep the runtime alive.
pub struct Signal<T> {
    rt: Weak<RuntimeInner>,
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            rt: self.rt.clone(),
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Signal<T> {
    pub(crate) fn new(rt: Weak<RuntimeInner>, id: SignalId) -> Self {
        Self {
            rt,
            id,
            _marker: PhantomData,
        }
    }

    /// Arena id of this signal.
    pub fn id(&self) -> SignalId {
        self.id
    }

    fn inner(&self) -> StrobeResult<Rc<RuntimeInner>> {
        self.rt.upgrade().ok_or_else(|| {
            StrobeError::validation(format!("signal #{} outlived its runtime", self.id.0))
        })
    }

    /// Debug name given at creation.
    pub fn name(&self) -> String {
        self.rt
            .upgrade()
            .map(|rt| rt.name_of(self.id))
            .unwrap_or_else(|| format!("#{}", self.id.0))
    }

    /// Return `true` when the next read will recompute.
    pub fn is_dirty(&self) -> bool {
        self.rt.upgrade().is_some_and(|rt| rt.is_dirty(self.id))
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Current value, recomputing if stale.
    ///
    /// When called from inside a derived computation the read is recorded as a dependency.
    pub fn read(&self) -> StrobeResult<T> {
        let rt = self.inner()?;
        let value = rt.read(self.id)?;
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            StrobeError::validation(format!(
                "signal '{}' does not hold a {}",
                rt.name_of(self.id),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Replace the value of a source signal and invalidate its dependents.
    pub fn write(&self, value: T) -> StrobeResult<()> {
        self.inner()?.write(self.id, Rc::new(value))
    }

    /// Write `f(current)` back into a source signal.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> StrobeResult<()> {
        let current = self.read()?;
        self.write(f(&current))
    }

    /// Derive a new signal by applying `f` to this one.
    pub fn map<U, F>(&self, name: impl Into<String>, f: F) -> StrobeResult<Signal<U>>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let rt = Runtime::from_inner(self.inner()?);
        let this = self.clone();
        Ok(rt.derived(name, move || this.read().map(&f)))
    }
}
