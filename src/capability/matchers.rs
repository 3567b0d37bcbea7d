//! Capability matchers and the module scanner.
//!
//! Each matcher is an independent predicate/extractor pair over a module's
//! exported surface. A matcher fires when its shape check passes and the
//! corresponding registry slot is still empty; the registry's capture-once
//! rule makes scanning idempotent under duplicate module observations.
//!
//! # Matcher Set
//!
//! | Matcher | Capability | Mechanism |
//! |---------|------------|-----------|
//! | playback-start-hook | `advance-to-next` | Wraps the play-current function to emit a playback event before delegating |
//! | queue-accessors | `read-queue`, `append-to-queue`, `read-current-queue-item` | Binds exported getters to their module |
//! | audible-setup-hook | `begin-playback` | Wraps a nested after-setup lifecycle hook; first run captures the receiver's play-audible method |
//! | model-ctor-capture | `instantiate-track-model` | Wraps prepare-model; captures the configured model constructor when the result requests preloading |
//!
//! Scanning cost is a fixed number of shape checks per module. A module whose
//! expected shape is partially absent simply does not fire; it never aborts
//! the scan or the matchers after it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::host::{HostValue, ModuleRecord};
use crate::playback::{HostTrack, PlaybackEventBridge};
use crate::protocol::Message;

use super::registry::{Capability, CapabilityRef, CapabilityRegistry};

// ============================================================================
// Host Slot Names
// ============================================================================

/// Play-current function on a playback controller module.
const PLAY_CURRENT: &str = "playCurrent";

/// Current-sound getter on the same controller.
const GET_CURRENT_SOUND: &str = "getCurrentSound";

/// Queue getter.
const GET_QUEUE: &str = "getQueue";

/// Explicit queue append.
const ADD_EXPLICIT_QUEUE_ITEM: &str = "addExplicitQueueItem";

/// Current queue item getter.
const GET_CURRENT_QUEUE_ITEM: &str = "getCurrentQueueItem";

/// Exported descriptor holding lifecycle hooks.
const PROPERTIES: &str = "properties";

/// Audible-playback marker and instance method name.
const PLAY_AUDIBLE: &str = "playAudible";

/// Post-construction lifecycle hook container.
const AFTER: &str = "after";

/// Setup lifecycle hook.
const SETUP: &str = "setup";

/// Exported prototype surface.
const PROTOTYPE: &str = "prototype";

/// Prepare-model method on the prototype.
const PREPARE_MODEL: &str = "_prepareModel";

/// Configured model constructor on a collection-like receiver.
const MODEL: &str = "model";

/// Preloading request marker on a prepared model.
const REQUEST_PRELOADING: &str = "requestPreloading";

// ============================================================================
// Types
// ============================================================================

/// Sink for playback events emitted by the playback-start hook.
pub type EmitFn = Arc<dyn Fn(Message) + Send + Sync>;

/// Shape check applied to one module record.
type MatchFn = Box<dyn Fn(&ModuleRecord) -> bool + Send + Sync>;

// ============================================================================
// Matcher
// ============================================================================

/// A named predicate/extractor pair over a module's exports.
pub struct Matcher {
    /// Matcher name, for logging.
    name: &'static str,

    /// Shape check and capture. Returns `true` if anything was captured or
    /// installed.
    apply: MatchFn,
}

impl Matcher {
    /// Creates a matcher.
    #[must_use]
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(&ModuleRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    /// Returns the matcher's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the matcher to a record.
    #[inline]
    pub fn apply(&self, record: &ModuleRecord) -> bool {
        (self.apply)(record)
    }
}

// ============================================================================
// ModuleScanner
// ============================================================================

/// Runs the fixed matcher set against each observed module exactly once.
pub struct ModuleScanner {
    /// The ordered matcher set.
    matchers: Vec<Matcher>,
}

impl ModuleScanner {
    /// Creates a scanner with the default matcher set.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        bridge: Arc<PlaybackEventBridge>,
        emit: EmitFn,
    ) -> Self {
        Self {
            matchers: default_matchers(registry, bridge, emit),
        }
    }

    /// Creates a scanner with an explicit matcher set.
    #[must_use]
    pub fn with_matchers(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }

    /// Scans one module record.
    ///
    /// Every matcher runs regardless of whether earlier ones fired; a record
    /// that matches nothing is not retained.
    pub fn scan(&self, record: &ModuleRecord) {
        for matcher in &self.matchers {
            if matcher.apply(record) {
                trace!(module = %record.id, matcher = matcher.name(), "matcher fired");
            }
        }
    }
}

// ============================================================================
// Default Matcher Set
// ============================================================================

/// Builds the fixed matcher set.
#[must_use]
pub fn default_matchers(
    registry: Arc<CapabilityRegistry>,
    bridge: Arc<PlaybackEventBridge>,
    emit: EmitFn,
) -> Vec<Matcher> {
    vec![
        playback_start_hook(registry.clone(), bridge, emit),
        queue_accessors(registry.clone()),
        audible_setup_hook(registry.clone()),
        model_ctor_capture(registry),
    ]
}

/// Matcher 1: wrap the play-current function to emit a playback event.
///
/// The wrapper reads the current sound from the receiver and, if present and
/// populated, emits a snapshot before delegating to the original with
/// identical arguments and receiver. The registry's capture-once rule on the
/// original doubles as the re-wrap guard.
fn playback_start_hook(
    registry: Arc<CapabilityRegistry>,
    bridge: Arc<PlaybackEventBridge>,
    emit: EmitFn,
) -> Matcher {
    Matcher::new("playback-start-hook", move |record| {
        let exports = &record.exports;
        let Some(original) = exports.method(PLAY_CURRENT) else {
            return false;
        };

        let captured = registry.try_set(
            Capability::AdvanceToNext,
            CapabilityRef::bound(exports.clone(), original.clone()),
        );
        if !captured {
            return false;
        }

        let bridge = bridge.clone();
        let emit = emit.clone();
        exports.set(
            PLAY_CURRENT,
            HostValue::method(move |this, args| {
                if let Ok(HostValue::Object(sound)) = this.call(GET_CURRENT_SOUND, &[]) {
                    let track = HostTrack::new(sound);
                    if track.is_populated() {
                        emit(bridge.message(&track));
                    }
                }
                original(this, args)
            }),
        );
        true
    })
}

/// Matcher 2: bind exported queue accessors for later external invocation.
fn queue_accessors(registry: Arc<CapabilityRegistry>) -> Matcher {
    const ACCESSORS: [(&str, Capability); 3] = [
        (GET_QUEUE, Capability::ReadQueue),
        (ADD_EXPLICIT_QUEUE_ITEM, Capability::AppendToQueue),
        (GET_CURRENT_QUEUE_ITEM, Capability::ReadCurrentQueueItem),
    ];

    Matcher::new("queue-accessors", move |record| {
        let mut fired = false;
        for (slot, capability) in ACCESSORS {
            if let Some(method) = record.exports.method(slot) {
                fired |= registry.try_set(
                    capability,
                    CapabilityRef::bound(record.exports.clone(), method),
                );
            }
        }
        fired
    })
}

/// Matcher 3: discover the low-level playback trigger indirectly.
///
/// Fires on a descriptor exposing an audible-playback property alongside an
/// after-setup lifecycle hook. The hook is wrapped so that its first run
/// captures the receiver's play-audible method, then calls through to the
/// original unmodified.
fn audible_setup_hook(registry: Arc<CapabilityRegistry>) -> Matcher {
    Matcher::new("audible-setup-hook", move |record| {
        let Some(properties) = record.exports.object(PROPERTIES) else {
            return false;
        };
        if !properties.has(PLAY_AUDIBLE) {
            return false;
        }
        let Some(after) = properties.object(AFTER) else {
            return false;
        };
        let Some(original_setup) = after.method(SETUP) else {
            return false;
        };

        let registry = registry.clone();
        after.set(
            SETUP,
            HostValue::method(move |this, args| {
                if !registry.is_captured(Capability::BeginPlayback)
                    && let Some(play) = this.method(PLAY_AUDIBLE)
                {
                    registry.try_set(
                        Capability::BeginPlayback,
                        CapabilityRef::bound(this.clone(), play),
                    );
                }
                original_setup(this, args)
            }),
        );
        true
    })
}

/// Matcher 4: capture the track model constructor.
///
/// Wraps the prototype's prepare-model method. The wrapper aborts with no
/// effect if the receiver's configured model is not a constructor; otherwise
/// it delegates, and if the result requests preloading while no constructor
/// has been captured yet, the configured model is captured.
fn model_ctor_capture(registry: Arc<CapabilityRegistry>) -> Matcher {
    // Installed once: later modules with the same shape are left alone.
    let installed = AtomicBool::new(false);

    Matcher::new("model-ctor-capture", move |record| {
        let Some(prototype) = record.exports.object(PROTOTYPE) else {
            return false;
        };
        let Some(original) = prototype.method(PREPARE_MODEL) else {
            return false;
        };
        if installed.swap(true, Ordering::Relaxed) {
            return false;
        }

        let registry = registry.clone();
        prototype.set(
            PREPARE_MODEL,
            HostValue::method(move |this, args| {
                let Some(model) = this.ctor(MODEL) else {
                    return Ok(HostValue::Null);
                };
                let result = original(this, args)?;
                if let Some(prepared) = result.as_object()
                    && prepared.has(REQUEST_PRELOADING)
                    && !registry.is_captured(Capability::InstantiateTrackModel)
                {
                    registry.try_set(
                        Capability::InstantiateTrackModel,
                        CapabilityRef::Ctor(model),
                    );
                }
                Ok(result)
            }),
        );
        true
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::host::HostObject;

    /// Scanner plus the registry and emitted messages it writes to.
    fn recording_scanner() -> (ModuleScanner, Arc<CapabilityRegistry>, Arc<Mutex<Vec<Message>>>) {
        let registry = CapabilityRegistry::new();
        let bridge = Arc::new(PlaybackEventBridge::with_clock(Arc::new(|| 1_000_000)));
        let emitted: Arc<Mutex<Vec<Message>>> = Arc::default();

        let sink = emitted.clone();
        let scanner = ModuleScanner::new(
            registry.clone(),
            bridge,
            Arc::new(move |message| sink.lock().push(message)),
        );
        (scanner, registry, emitted)
    }

    /// A playback controller module: playCurrent plus a current sound.
    fn controller_module(id: &str, marker: i64) -> ModuleRecord {
        let sound = HostValue::Object(crate::playback::track::tests::sound_object(Some(45_000)));
        let exports = HostObject::with_slots([
            ("marker", HostValue::data(marker)),
            (
                GET_CURRENT_SOUND,
                HostValue::method(move |_this, _args| Ok(sound.clone())),
            ),
            (
                PLAY_CURRENT,
                HostValue::method(|this, _args| {
                    Ok(HostValue::data(this.integer("marker").unwrap_or_default()))
                }),
            ),
        ]);
        ModuleRecord::new(id, exports)
    }

    #[test]
    fn test_play_current_wrap_emits_and_delegates() {
        let (scanner, registry, emitted) = recording_scanner();
        let record = controller_module("controller", 7);
        scanner.scan(&record);

        assert!(registry.is_captured(Capability::AdvanceToNext));

        // The wrapped function keeps receiver binding and return value.
        let result = record.exports.call(PLAY_CURRENT, &[]).expect("wrapped call");
        assert_eq!(result.as_i64(), Some(7));

        // One playback event, with the documented timestamps.
        let messages = emitted.lock();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            Message::TrackNowPlaying(playing) => {
                assert_eq!(playing.start_time, 1_000_000 - 45_000);
                assert_eq!(playing.end_time, 1_000_000 + 135_000);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_second_controller_not_wrapped() {
        let (scanner, registry, emitted) = recording_scanner();
        let first = controller_module("first", 1);
        let second = controller_module("second", 2);
        scanner.scan(&first);
        scanner.scan(&second);

        // Registry kept the first capture.
        assert!(registry.is_captured(Capability::AdvanceToNext));

        // The second module's function is untouched: calling it emits nothing.
        emitted.lock().clear();
        let result = second.exports.call(PLAY_CURRENT, &[]).expect("call");
        assert_eq!(result.as_i64(), Some(2));
        assert!(emitted.lock().is_empty());
    }

    #[test]
    fn test_unpopulated_sound_emits_nothing() {
        let (scanner, _registry, emitted) = recording_scanner();

        let exports = HostObject::with_slots([
            (
                GET_CURRENT_SOUND,
                HostValue::method(|_this, _args| Ok(HostValue::Object(HostObject::new()))),
            ),
            (PLAY_CURRENT, HostValue::method(|_this, _args| Ok(HostValue::Null))),
        ]);
        let record = ModuleRecord::new("bare", exports);
        scanner.scan(&record);

        record.exports.call(PLAY_CURRENT, &[]).expect("call");
        assert!(emitted.lock().is_empty());
    }

    #[test]
    fn test_queue_accessors_bound_once() {
        let (scanner, registry, _emitted) = recording_scanner();

        let queue_module = |marker: i64| {
            let exports = HostObject::with_slots([
                ("marker", HostValue::data(marker)),
                (
                    GET_QUEUE,
                    HostValue::method(|this, _args| {
                        Ok(HostValue::data(this.integer("marker").unwrap_or_default()))
                    }),
                ),
                (GET_CURRENT_QUEUE_ITEM, HostValue::method(|_t, _a| Ok(HostValue::Null))),
            ]);
            ModuleRecord::new("queue", exports)
        };

        scanner.scan(&queue_module(1));
        scanner.scan(&queue_module(2));

        assert!(registry.is_captured(Capability::ReadQueue));
        assert!(registry.is_captured(Capability::ReadCurrentQueueItem));
        assert!(!registry.is_captured(Capability::AppendToQueue));

        // Bound to the first module.
        let read_queue = registry.get(Capability::ReadQueue).expect("captured");
        let result = read_queue.invoke(&[]).expect("invoke");
        assert_eq!(result.as_i64(), Some(1));
    }

    #[test]
    fn test_audible_setup_captures_on_first_run() {
        let (scanner, registry, _emitted) = recording_scanner();

        let setup_runs: Arc<Mutex<u32>> = Arc::default();
        let runs = setup_runs.clone();

        let after = HostObject::with_slots([(
            SETUP,
            HostValue::method(move |_this, _args| {
                *runs.lock() += 1;
                Ok(HostValue::Null)
            }),
        )]);
        let properties = HostObject::with_slots([
            (PLAY_AUDIBLE, HostValue::data(true)),
            (AFTER, HostValue::Object(after.clone())),
        ]);
        let exports = HostObject::with_slots([(PROPERTIES, HostValue::Object(properties))]);
        scanner.scan(&ModuleRecord::new("audible", exports));

        // Not captured until the lifecycle hook actually runs.
        assert!(!registry.is_captured(Capability::BeginPlayback));

        // The host runs setup on an instance exposing playAudible.
        let instance = HostObject::with_slots([
            ("played", HostValue::data(0)),
            (
                PLAY_AUDIBLE,
                HostValue::method(|this, _args| {
                    let played = this.integer("played").unwrap_or_default();
                    this.set("played", HostValue::data(played + 1));
                    Ok(HostValue::Null)
                }),
            ),
        ]);
        let setup = after.method(SETUP).expect("wrapped setup");
        setup(&instance, &[]).expect("setup runs");
        setup(&instance, &[]).expect("setup runs again");

        assert_eq!(*setup_runs.lock(), 2);
        assert!(registry.is_captured(Capability::BeginPlayback));

        // The captured trigger is bound to the instance.
        let play = registry.get(Capability::BeginPlayback).expect("captured");
        play.invoke(&[]).expect("invoke");
        assert_eq!(instance.integer("played"), Some(1));
    }

    #[test]
    fn test_model_ctor_captured_on_preloading_result() {
        let (scanner, registry, _emitted) = recording_scanner();

        let prototype = HostObject::with_slots([
            (
                MODEL,
                HostValue::ctor(|seed| {
                    let instance = HostObject::new();
                    if let Some(data) = seed.as_data() {
                        instance.set("attributes", HostValue::Data(data.clone()));
                    }
                    Ok(instance)
                }),
            ),
            (
                PREPARE_MODEL,
                HostValue::method(|_this, _args| {
                    let prepared = HostObject::with_slots([(
                        REQUEST_PRELOADING,
                        HostValue::method(|_t, _a| Ok(HostValue::Null)),
                    )]);
                    Ok(HostValue::Object(prepared))
                }),
            ),
        ]);
        let exports = HostObject::with_slots([(PROTOTYPE, HostValue::Object(prototype.clone()))]);
        scanner.scan(&ModuleRecord::new("collection", exports));

        // Capture happens only once the host calls the wrapped method.
        assert!(!registry.is_captured(Capability::InstantiateTrackModel));
        prototype.call(PREPARE_MODEL, &[]).expect("prepare");
        assert!(registry.is_captured(Capability::InstantiateTrackModel));

        // And the captured reference constructs models.
        let ctor = registry
            .get(Capability::InstantiateTrackModel)
            .expect("captured");
        let model = ctor
            .construct(
                Capability::InstantiateTrackModel,
                &HostValue::data(json!({"title": "T"})),
            )
            .expect("construct");
        assert!(model.has("attributes"));
    }

    #[test]
    fn test_prepare_model_aborts_without_ctor() {
        let (scanner, registry, _emitted) = recording_scanner();

        let original_calls: Arc<Mutex<u32>> = Arc::default();
        let calls = original_calls.clone();
        let prototype = HostObject::with_slots([(
            PREPARE_MODEL,
            HostValue::method(move |_this, _args| {
                *calls.lock() += 1;
                Ok(HostValue::Null)
            }),
        )]);
        let exports = HostObject::with_slots([(PROTOTYPE, HostValue::Object(prototype.clone()))]);
        scanner.scan(&ModuleRecord::new("collection", exports));

        // No configured model: the wrapper aborts without delegating.
        let result = prototype.call(PREPARE_MODEL, &[]).expect("call");
        assert!(matches!(result, HostValue::Null));
        assert_eq!(*original_calls.lock(), 0);
        assert!(!registry.is_captured(Capability::InstantiateTrackModel));
    }

    #[test]
    fn test_partial_shapes_do_not_fire_or_abort() {
        let (scanner, registry, _emitted) = recording_scanner();

        // properties without after, prototype without prepare-model.
        let partial = HostObject::with_slots([
            (
                PROPERTIES,
                HostValue::Object(HostObject::with_slots([(PLAY_AUDIBLE, HostValue::data(true))])),
            ),
            (PROTOTYPE, HostValue::Object(HostObject::new())),
        ]);
        scanner.scan(&ModuleRecord::new("partial", partial));

        // A later module still matches normally.
        scanner.scan(&controller_module("controller", 1));

        assert_eq!(registry.captured(), vec![Capability::AdvanceToNext]);
    }
}
