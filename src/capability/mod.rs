//! Capability discovery.
//!
//! Recovers live references to the host application's internal playback
//! functions as they are registered with its dynamic module loader: no
//! static linkage, no guaranteed load order, and no observable change in
//! host behavior.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`registry`] | Write-once capability store |
//! | [`matchers`] | Fixed matcher set and the module scanner |
//! | [`interceptor`] | Loader wrapping and re-arm on replacement |

// ============================================================================
// Submodules
// ============================================================================

/// Write-once capability registry.
pub mod registry;

/// Capability matchers and the module scanner.
pub mod matchers;

/// Module interceptor and loader slot.
pub mod interceptor;

// ============================================================================
// Re-exports
// ============================================================================

pub use interceptor::{LoaderSlot, ModuleInterceptor};
pub use matchers::{EmitFn, Matcher, ModuleScanner, default_matchers};
pub use registry::{Capability, CapabilityRef, CapabilityRegistry};
