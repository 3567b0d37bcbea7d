//! Host module loader seam.
//!
//! The host application registers executable units with a dynamic module
//! loader at unpredictable times and in no guaranteed order. This module
//! defines the loader surface the interceptor wraps:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ModuleRecord`] | One unit presented by the loader, observed once |
//! | [`RegistrationSink`] | Where registrations land (the host's own sink) |
//! | [`VecSink`] | Plain array-like sink, the host's default shape |
//!
//! The interceptor implements [`RegistrationSink`] itself and delegates to
//! whatever sink the host currently uses, so the host observes identical
//! registration behavior.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

use super::object::HostObject;

// ============================================================================
// ModuleRecord
// ============================================================================

/// One unit registered with the host's dynamic module loader.
///
/// Observed exactly once per registration event. The exports surface is
/// opaque: matchers probe it with a bounded number of shape checks and the
/// record is not retained unless a matcher captures from it.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Loader-assigned module identifier.
    pub id: String,

    /// The module's exported surface.
    pub exports: Arc<HostObject>,
}

impl ModuleRecord {
    /// Creates a record.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, exports: Arc<HostObject>) -> Self {
        Self {
            id: id.into(),
            exports,
        }
    }
}

// ============================================================================
// RegistrationSink
// ============================================================================

/// Destination of module registrations.
///
/// Implemented by the host's own loader surface and by the interceptor that
/// wraps it. `register` returns the number of units the sink has accepted,
/// mirroring the host loader's own return value; wrappers must pass it
/// through unchanged.
pub trait RegistrationSink: Send + Sync {
    /// Registers one module unit.
    fn register(&self, record: &ModuleRecord) -> usize;
}

// ============================================================================
// VecSink
// ============================================================================

/// An array-like registration sink.
///
/// This is the shape the host's loader surface presents before (and after)
/// interception: registrations append, and the count is returned.
#[derive(Default)]
pub struct VecSink {
    /// Registered units, in arrival order.
    records: Mutex<Vec<ModuleRecord>>,
}

impl VecSink {
    /// Creates an empty sink.
    #[inline]
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the number of registered units.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Returns the ids of registered units, in arrival order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.id.clone()).collect()
    }
}

impl RegistrationSink for VecSink {
    fn register(&self, record: &ModuleRecord) -> usize {
        let mut records = self.records.lock();
        records.push(record.clone());
        records.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_counts_registrations() {
        let sink = VecSink::new();
        assert!(sink.is_empty());

        let first = ModuleRecord::new("m1", HostObject::new());
        let second = ModuleRecord::new("m2", HostObject::new());

        assert_eq!(sink.register(&first), 1);
        assert_eq!(sink.register(&second), 2);
        assert_eq!(sink.ids(), vec!["m1".to_string(), "m2".to_string()]);
    }
}
