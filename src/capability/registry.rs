//! Write-once capability registry.
//!
//! Holds first-discovered references to the fixed set of host capabilities.
//! The capture-once rule is the synchronization primitive that makes module
//! scanning idempotent under duplicate observations: without it, re-wrapping
//! or re-binding on every matching module would cause double side effects or
//! stale bindings.
//!
//! # Capabilities
//!
//! | Capability | Host shape captured |
//! |------------|---------------------|
//! | `advance-to-next` | Original play-current function, pre-wrap |
//! | `read-queue` | Queue getter, bound to its module |
//! | `append-to-queue` | Explicit queue append, bound to its module |
//! | `read-current-queue-item` | Current queue item getter, bound |
//! | `begin-playback` | Audible-playback trigger, bound to its owner |
//! | `instantiate-track-model` | Track model constructor |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::{HostCtor, HostMethod, HostObject, HostValue};

// ============================================================================
// Capability
// ============================================================================

/// The fixed, known set of capability names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The host's "play current item" function (original, pre-wrap).
    AdvanceToNext,

    /// Reads the playback queue.
    ReadQueue,

    /// Appends an explicit item to the playback queue.
    AppendToQueue,

    /// Reads the current queue item.
    ReadCurrentQueueItem,

    /// Starts playback of an audible item.
    BeginPlayback,

    /// Constructs a track model from track data.
    InstantiateTrackModel,
}

impl Capability {
    /// Every capability, in matcher order.
    pub const ALL: [Self; 6] = [
        Self::AdvanceToNext,
        Self::ReadQueue,
        Self::AppendToQueue,
        Self::ReadCurrentQueueItem,
        Self::BeginPlayback,
        Self::InstantiateTrackModel,
    ];

    /// Returns the capability's stable name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AdvanceToNext => "advance-to-next",
            Self::ReadQueue => "read-queue",
            Self::AppendToQueue => "append-to-queue",
            Self::ReadCurrentQueueItem => "read-current-queue-item",
            Self::BeginPlayback => "begin-playback",
            Self::InstantiateTrackModel => "instantiate-track-model",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CapabilityRef
// ============================================================================

/// A captured reference: either a method bound to its owning object, or a
/// constructor.
#[derive(Clone)]
pub enum CapabilityRef {
    /// A method with the receiver it was discovered on.
    Bound {
        /// Receiver the method is bound to.
        target: Arc<HostObject>,
        /// The callable itself.
        method: HostMethod,
    },

    /// A constructor.
    Ctor(HostCtor),
}

impl CapabilityRef {
    /// Creates a bound-method reference.
    #[inline]
    #[must_use]
    pub fn bound(target: Arc<HostObject>, method: HostMethod) -> Self {
        Self::Bound { target, method }
    }

    /// Invokes the reference as a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostCall`] if the reference is a constructor, or
    /// whatever error the host method raises.
    pub fn invoke(&self, args: &[HostValue]) -> Result<HostValue> {
        match self {
            Self::Bound { target, method } => method(target, args),
            Self::Ctor(_) => Err(Error::host_call("constructor invoked as a method")),
        }
    }

    /// Invokes the reference as a constructor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConstructible`] if the reference is a bound
    /// method, or whatever error the host constructor raises.
    pub fn construct(&self, capability: Capability, seed: &HostValue) -> Result<Arc<HostObject>> {
        match self {
            Self::Ctor(ctor) => ctor(seed),
            Self::Bound { .. } => Err(Error::not_constructible(capability)),
        }
    }
}

impl fmt::Debug for CapabilityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound { .. } => write!(f, "Bound(..)"),
            Self::Ctor(_) => write!(f, "Ctor(..)"),
        }
    }
}

// ============================================================================
// CapabilityRegistry
// ============================================================================

/// First-capture-wins store for host capabilities.
///
/// Created empty at startup, populated asynchronously as modules load, never
/// cleared. Once a slot is non-empty it is never overwritten.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// Captured references, keyed by capability.
    slots: Mutex<FxHashMap<Capability, CapabilityRef>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores `value` under `capability` only if the slot is empty.
    ///
    /// Returns `true` if the store happened.
    pub fn try_set(&self, capability: Capability, value: CapabilityRef) -> bool {
        let mut slots = self.slots.lock();
        if slots.contains_key(&capability) {
            return false;
        }
        slots.insert(capability, value);
        debug!(capability = %capability, "capability captured");
        true
    }

    /// Returns a clone of the captured reference, if any.
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<CapabilityRef> {
        self.slots.lock().get(&capability).cloned()
    }

    /// Returns `true` if the capability has been captured.
    #[inline]
    #[must_use]
    pub fn is_captured(&self, capability: Capability) -> bool {
        self.slots.lock().contains_key(&capability)
    }

    /// Returns the currently captured capabilities, in matcher order.
    #[must_use]
    pub fn captured(&self) -> Vec<Capability> {
        let slots = self.slots.lock();
        Capability::ALL
            .into_iter()
            .filter(|capability| slots.contains_key(capability))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    /// A bound ref whose target carries a recognizable marker.
    fn marked_ref(marker: i64) -> CapabilityRef {
        let target = HostObject::with_slots([("marker", HostValue::data(marker))]);
        CapabilityRef::bound(target, Arc::new(|this, _args| {
            Ok(HostValue::data(this.integer("marker").unwrap_or_default()))
        }))
    }

    fn marker_of(reference: &CapabilityRef) -> i64 {
        reference
            .invoke(&[])
            .expect("marker ref invokes")
            .as_i64()
            .expect("marker is an integer")
    }

    #[test]
    fn test_capture_once() {
        let registry = CapabilityRegistry::new();

        assert!(registry.try_set(Capability::ReadQueue, marked_ref(1)));
        assert!(!registry.try_set(Capability::ReadQueue, marked_ref(2)));

        let stored = registry.get(Capability::ReadQueue).expect("captured");
        assert_eq!(marker_of(&stored), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = CapabilityRegistry::new();
        assert!(registry.get(Capability::BeginPlayback).is_none());
        assert!(!registry.is_captured(Capability::BeginPlayback));
        assert!(registry.captured().is_empty());
    }

    #[test]
    fn test_captured_order() {
        let registry = CapabilityRegistry::new();
        registry.try_set(Capability::InstantiateTrackModel, marked_ref(1));
        registry.try_set(Capability::AdvanceToNext, marked_ref(2));

        assert_eq!(
            registry.captured(),
            vec![Capability::AdvanceToNext, Capability::InstantiateTrackModel]
        );
    }

    #[test]
    fn test_construct_on_bound_method_fails() {
        let reference = marked_ref(1);
        let err = reference
            .construct(Capability::InstantiateTrackModel, &HostValue::Null)
            .unwrap_err();
        assert!(matches!(err, crate::Error::NotConstructible { .. }));
    }

    proptest! {
        /// For any sequence of captures, each slot keeps its first value.
        #[test]
        fn prop_first_capture_wins(sequence in proptest::collection::vec(0..6usize, 0..40)) {
            let registry = CapabilityRegistry::new();
            let mut expected: FxHashMap<Capability, i64> = FxHashMap::default();

            for (index, slot) in sequence.iter().enumerate() {
                let capability = Capability::ALL[*slot];
                registry.try_set(capability, marked_ref(index as i64));
                expected.entry(capability).or_insert(index as i64);
            }

            for capability in Capability::ALL {
                match expected.get(&capability) {
                    Some(first) => {
                        let stored = registry.get(capability).expect("captured");
                        prop_assert_eq!(marker_of(&stored), *first);
                    }
                    None => prop_assert!(registry.get(capability).is_none()),
                }
            }
        }
    }
}
