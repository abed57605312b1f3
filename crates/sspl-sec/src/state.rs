//! The active method and the handle of the library backing it.

use crate::registry::MethodId;

/// Active `(method, handle)` pair.
///
/// Owns the handle exclusively. Both halves only ever change together.
#[derive(Debug)]
pub struct MethodState<H> {
    active: (MethodId, H),
}

impl<H> MethodState<H> {
    #[must_use]
    pub fn new(method: MethodId, handle: H) -> Self {
        Self {
            active: (method, handle),
        }
    }

    #[must_use]
    pub fn current(&self) -> MethodId {
        self.active.0
    }

    #[must_use]
    pub fn handle(&self) -> &H {
        &self.active.1
    }

    /// Replaces the active pair and returns the superseded handle, which the
    /// caller is responsible for closing.
    pub(crate) fn install(&mut self, method: MethodId, handle: H) -> H {
        let (_, previous) = std::mem::replace(&mut self.active, (method, handle));
        previous
    }

    /// Releases the handle for teardown.
    #[must_use]
    pub fn into_handle(self) -> H {
        self.active.1
    }
}
