//! Host runtime model.
//!
//! Models the target application's dynamic runtime surface: objects with
//! late-bound slots, and the module loader that registers new units at
//! unpredictable times.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`object`] | Dynamic objects, methods, constructors |
//! | [`loader`] | Module records and the registration sink seam |

// ============================================================================
// Submodules
// ============================================================================

/// Dynamic host objects and callables.
pub mod object;

/// Module loader seam.
pub mod loader;

// ============================================================================
// Re-exports
// ============================================================================

pub use loader::{ModuleRecord, RegistrationSink, VecSink};
pub use object::{HostCtor, HostMethod, HostObject, HostValue};
