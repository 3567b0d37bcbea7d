//! Module interceptor and loader slot.
//!
//! [`ModuleInterceptor`] stands between the host application and its module
//! loader: it implements [`RegistrationSink`] itself, delegates every
//! registration to the host's real sink first, then runs the capability
//! scanner over the registered record. The host observes identical
//! registration behavior; capability capture is a side effect only.
//!
//! [`LoaderSlot`] models the accessor through which the host reads and
//! replaces its loader surface. Reading always yields the interceptor;
//! writing re-arms the interceptor onto the replacement sink, so capability
//! capture keeps working after the host hot-swaps its loader.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::host::{ModuleRecord, RegistrationSink};

use super::matchers::ModuleScanner;

// ============================================================================
// ModuleInterceptor
// ============================================================================

/// Transparent wrapper around the host's registration sink.
///
/// Registration order is observed, not altered: the original registration
/// runs first and its return value is passed through unchanged, then the
/// record's exports are scanned.
pub struct ModuleInterceptor {
    /// The capability scanner applied to each registered record.
    scanner: ModuleScanner,

    /// The sink registrations are delegated to.
    inner: Mutex<Arc<dyn RegistrationSink>>,
}

impl ModuleInterceptor {
    /// Creates an interceptor delegating to `inner`.
    #[must_use]
    pub fn new(scanner: ModuleScanner, inner: Arc<dyn RegistrationSink>) -> Arc<Self> {
        Arc::new(Self {
            scanner,
            inner: Mutex::new(inner),
        })
    }

    /// Re-arms the interceptor onto a replacement sink.
    ///
    /// Called when the host replaces its loader surface. Re-arming onto the
    /// interceptor itself is ignored: the host reading the accessor and
    /// writing the value back must not create a delegation cycle.
    pub fn rearm(self: &Arc<Self>, replacement: Arc<dyn RegistrationSink>) {
        let replacement_ptr = Arc::as_ptr(&replacement) as *const u8;
        let self_ptr = Arc::as_ptr(self) as *const u8;
        if std::ptr::eq(replacement_ptr, self_ptr) {
            trace!("loader replacement is the interceptor itself; ignored");
            return;
        }

        *self.inner.lock() = replacement;
        debug!("interceptor re-armed onto replacement loader sink");
    }
}

impl RegistrationSink for ModuleInterceptor {
    fn register(&self, record: &ModuleRecord) -> usize {
        // Original registration first, scan second.
        let count = {
            let inner = self.inner.lock().clone();
            inner.register(record)
        };
        self.scanner.scan(record);
        count
    }
}

// ============================================================================
// LoaderSlot
// ============================================================================

/// The accessor the host uses to reach its loader surface.
///
/// Stands in for a live property with both getter and setter: `get` always
/// yields the interceptor, and `set` re-arms it onto the replacement, so
/// interception survives the host reassigning its own loader.
pub struct LoaderSlot {
    /// The installed interceptor.
    interceptor: Arc<ModuleInterceptor>,
}

impl LoaderSlot {
    /// Installs an interceptor behind the accessor.
    #[inline]
    #[must_use]
    pub fn install(interceptor: Arc<ModuleInterceptor>) -> Self {
        Self { interceptor }
    }

    /// Reads the loader surface. Always the interceptor.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Arc<dyn RegistrationSink> {
        self.interceptor.clone()
    }

    /// Replaces the loader surface.
    ///
    /// The replacement becomes the interceptor's delegation target; future
    /// registrations still pass through capability scanning.
    pub fn set(&self, replacement: Arc<dyn RegistrationSink>) {
        self.interceptor.rearm(replacement);
    }

    /// Returns the installed interceptor.
    #[inline]
    #[must_use]
    pub fn interceptor(&self) -> &Arc<ModuleInterceptor> {
        &self.interceptor
    }
}

// ============================================================================
// Tests
// ============================================================================
