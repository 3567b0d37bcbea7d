//! Dynamic host object model.
//!
//! The target application's playback engine is not statically linked: its
//! objects carry late-bound methods, nested descriptors, and constructors
//! that only exist once the host's module loader has run. This module models
//! that surface explicitly so the rest of the crate can inspect, wrap, and
//! invoke it without knowing the host's layout in advance.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HostObject`] | Slot map with interior mutability, shared via `Arc` |
//! | [`HostValue`] | One slot value: data, object, method, or constructor |
//! | [`HostMethod`] | Fallible callable bound to a receiver at call time |
//! | [`HostCtor`] | Fallible constructor producing a new object |
//!
//! Methods receive their owning object as an explicit receiver, so a method
//! moved between objects (or wrapped in place) keeps the late-binding
//! semantics of the host runtime: wrapping a slot and delegating to the
//! original preserves arguments, receiver, and return value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Callable Types
// ============================================================================

/// A fallible host method.
///
/// The first argument is the receiver (the object the method is invoked on),
/// the second the argument list. Failures model host-side exceptions and are
/// contained by callers; they never escape an event callback.
pub type HostMethod = Arc<dyn Fn(&Arc<HostObject>, &[HostValue]) -> Result<HostValue> + Send + Sync>;

/// A fallible host constructor.
///
/// Takes seed data and produces a new object.
pub type HostCtor = Arc<dyn Fn(&HostValue) -> Result<Arc<HostObject>> + Send + Sync>;

// ============================================================================
// HostValue
// ============================================================================

/// A single slot value on a [`HostObject`].
#[derive(Clone)]
pub enum HostValue {
    /// Absent / nothing.
    Null,

    /// Plain JSON-shaped data.
    Data(Value),

    /// A nested host object.
    Object(Arc<HostObject>),

    /// A callable method.
    Method(HostMethod),

    /// A constructor.
    Ctor(HostCtor),
}

impl HostValue {
    /// Wraps a closure as a method value.
    #[must_use]
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Arc<HostObject>, &[HostValue]) -> Result<HostValue> + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Wraps a closure as a constructor value.
    #[must_use]
    pub fn ctor<F>(f: F) -> Self
    where
        F: Fn(&HostValue) -> Result<Arc<HostObject>> + Send + Sync + 'static,
    {
        Self::Ctor(Arc::new(f))
    }

    /// Wraps JSON data as a value.
    #[inline]
    #[must_use]
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data(value.into())
    }

    /// Returns the nested object, if this value is one.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<HostObject>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the JSON data, if this value is data.
    #[inline]
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the data as an integer, if it is one.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(Value::as_i64)
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Data(value) => write!(f, "Data({value})"),
            Self::Object(_) => write!(f, "Object(..)"),
            Self::Method(_) => write!(f, "Method(..)"),
            Self::Ctor(_) => write!(f, "Ctor(..)"),
        }
    }
}

// ============================================================================
// HostObject
// ============================================================================

/// A dynamic host object: a named slot map with interior mutability.
///
/// Always handled through `Arc` so that wrappers installed on one reference
/// are observed by every holder, exactly as in the host runtime.
#[derive(Default)]
pub struct HostObject {
    /// Named slots.
    slots: Mutex<FxHashMap<String, HostValue>>,
}

impl HostObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates an object from `(name, value)` pairs.
    #[must_use]
    pub fn with_slots(slots: impl IntoIterator<Item = (&'static str, HostValue)>) -> Arc<Self> {
        let object = Self::new();
        for (name, value) in slots {
            object.set(name, value);
        }
        object
    }

    /// Returns a clone of the named slot value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<HostValue> {
        self.slots.lock().get(name).cloned()
    }

    /// Stores a slot value, replacing any previous one.
    pub fn set(&self, name: impl Into<String>, value: HostValue) {
        self.slots.lock().insert(name.into(), value);
    }

    /// Returns `true` if the named slot exists.
    #[inline]
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.slots.lock().contains_key(name)
    }

    /// Returns the named slot as JSON data.
    #[inline]
    #[must_use]
    pub fn data(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            HostValue::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the named slot as a nested object.
    #[inline]
    #[must_use]
    pub fn object(&self, name: &str) -> Option<Arc<HostObject>> {
        match self.get(name)? {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the named slot as a method.
    #[inline]
    #[must_use]
    pub fn method(&self, name: &str) -> Option<HostMethod> {
        match self.get(name)? {
            HostValue::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Returns the named slot as a constructor.
    #[inline]
    #[must_use]
    pub fn ctor(&self, name: &str) -> Option<HostCtor> {
        match self.get(name)? {
            HostValue::Ctor(ctor) => Some(ctor),
            _ => None,
        }
    }

    /// Returns the named slot's data as a string.
    #[inline]
    #[must_use]
    pub fn string(&self, name: &str) -> Option<String> {
        self.data(name)
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Returns the named slot's data as an integer.
    #[inline]
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.data(name).as_ref().and_then(Value::as_i64)
    }

    /// Invokes the named method slot with this object as the receiver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostCall`] if the slot is absent or not callable,
    /// or whatever error the method itself raises.
    pub fn call(self: &Arc<Self>, name: &str, args: &[HostValue]) -> Result<HostValue> {
        let method = self
            .method(name)
            .ok_or_else(|| Error::host_call(format!("no method slot: {name}")))?;
        method(self, args)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        let mut names: Vec<&str> = slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HostObject").field("slots", &names).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
