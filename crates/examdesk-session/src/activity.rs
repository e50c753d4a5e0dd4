//! Activity tracking: turning user interactions into "last activity now".
//!
//! The UI layer owns an event source (a browser document, a terminal, a
//! desktop window). It exposes it to us through the [`EventTarget`]
//! trait. The [`ActivityMonitor`] registers capture-phase listeners for
//! the interaction kinds that count as proof of presence, and every
//! matching event synchronously
//!
//! 1. stamps `lastActivity` in the persistent store, and
//! 2. re-arms the single-shot inactivity timer,
//!
//! before control returns to the dispatcher. There is no debouncing: a
//! redundant timer reset is cheaper than missing real activity.
//!
//! [`EventDispatcher`] is a ready-made in-process target for hosts that
//! do not have an event system of their own (and for tests).

use std::sync::{Arc, Mutex, PoisonError};

use crate::SessionManager;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Kinds of UI events a host can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
    Click,
    /// Hovering is not proof that someone is there.
    PointerMove,
    Focus,
    Blur,
    Resize,
}

impl EventKind {
    /// The interaction kinds that count as activity.
    pub const ACTIVITY: [EventKind; 5] = [
        EventKind::PointerDown,
        EventKind::KeyDown,
        EventKind::Scroll,
        EventKind::TouchStart,
        EventKind::Click,
    ];

    /// Returns `true` if this kind counts as activity.
    pub fn is_activity(self) -> bool {
        Self::ACTIVITY.contains(&self)
    }

    /// DOM event name, for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "mousedown",
            Self::KeyDown => "keydown",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
            Self::Click => "click",
            Self::PointerMove => "mousemove",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Resize => "resize",
        }
    }
}

/// One dispatched UI event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: EventKind,
}

impl UiEvent {
    pub fn new(kind: EventKind) -> Self {
        Self { kind }
    }
}

/// How a listener is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Capture-phase listeners run before bubble-phase ones, so they
    /// still see events whose handlers stop propagation.
    pub capture: bool,
}

impl ListenerOptions {
    pub const CAPTURE: Self = Self { capture: true };
    pub const BUBBLE: Self = Self { capture: false };
}

/// Opaque registration handle returned by [`EventTarget::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A registered callback.
pub type Listener = Arc<dyn Fn(&UiEvent) + Send + Sync>;

/// Something that dispatches UI events to listeners.
pub trait EventTarget: Send + Sync + 'static {
    /// Registers `listener` for events of `kind`.
    fn add_listener(&self, kind: EventKind, options: ListenerOptions, listener: Listener)
    -> ListenerId;

    /// Unregisters a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

struct Registered {
    id: ListenerId,
    kind: EventKind,
    capture: bool,
    listener: Listener,
}

#[derive(Default)]
struct DispatcherInner {
    next_id: u64,
    listeners: Vec<Registered>,
}

/// An in-process [`EventTarget`].
#[derive(Default)]
pub struct EventDispatcher {
    inner: Mutex<DispatcherInner>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every listener registered for its kind:
    /// capture-phase listeners first, then bubble-phase, each group in
    /// registration order. Returns how many listeners ran.
    ///
    /// Listeners are called without the registry lock held, so a
    /// listener may add or remove listeners (its own included).
    pub fn dispatch(&self, event: &UiEvent) -> usize {
        let targets: Vec<Listener> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let matching = || inner.listeners.iter().filter(|r| r.kind == event.kind);
            matching()
                .filter(|r| r.capture)
                .chain(matching().filter(|r| !r.capture))
                .map(|r| Arc::clone(&r.listener))
                .collect()
        };

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Number of registered listeners (all kinds).
    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl EventTarget for EventDispatcher {
    fn add_listener(
        &self,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> ListenerId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.listeners.push(Registered {
            id,
            kind,
            capture: options.capture,
            listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.listeners.len();
        inner.listeners.retain(|r| r.id != id);
        inner.listeners.len() != before
    }
}

// ---------------------------------------------------------------------------
// ActivityMonitor
// ---------------------------------------------------------------------------

/// Registers the activity listeners for a [`SessionManager`].
pub struct ActivityMonitor;

impl ActivityMonitor {
    /// Attaches one capture-phase listener per [`EventKind::ACTIVITY`]
    /// kind to `target`. Each qualifying event calls
    /// [`SessionManager::record_activity`].
    ///
    /// The listeners hold only a weak reference to the manager, so they
    /// never keep a dropped manager alive.
    pub fn attach(target: Arc<dyn EventTarget>, manager: &SessionManager) -> ListenerGuard {
        let ids = EventKind::ACTIVITY
            .iter()
            .map(|&kind| {
                let manager = manager.downgrade();
                let listener: Listener = Arc::new(move |event: &UiEvent| {
                    let Some(manager) = manager.upgrade() else {
                        return;
                    };
                    if let Err(e) = manager.record_activity() {
                        tracing::debug!(event = event.kind.as_str(), error = %e, "activity not recorded");
                    }
                });
                target.add_listener(kind, ListenerOptions::CAPTURE, listener)
            })
            .collect::<Vec<_>>();

        tracing::debug!(listeners = ids.len(), "activity listeners attached");
        ListenerGuard {
            target: Some(target),
            ids,
        }
    }
}

/// Owns the activity listeners; removing them is its only job.
///
/// [`detach`](Self::detach) may be called any number of times and also
/// runs on drop.
pub struct ListenerGuard {
    target: Option<Arc<dyn EventTarget>>,
    ids: Vec<ListenerId>,
}

impl ListenerGuard {
    /// Removes every listener this guard registered.
    pub fn detach(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        for id in self.ids.drain(..) {
            target.remove_listener(id);
        }
        tracing::debug!("activity listeners detached");
    }

    /// Returns `true` until [`detach`](Self::detach) has run.
    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Listener {
        let log = Arc::clone(log);
        Arc::new(move |_: &UiEvent| log.lock().unwrap().push(name))
    }

    #[test]
    fn test_activity_kinds_are_the_five_interactions() {
        assert!(EventKind::Click.is_activity());
        assert!(EventKind::Scroll.is_activity());
        assert!(!EventKind::PointerMove.is_activity());
        assert!(!EventKind::Focus.is_activity());
    }

    #[test]
    fn test_dispatch_runs_capture_before_bubble() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.add_listener(EventKind::Click, ListenerOptions::BUBBLE, recorder(&log, "bubble"));
        dispatcher.add_listener(EventKind::Click, ListenerOptions::CAPTURE, recorder(&log, "capture"));
        dispatcher.add_listener(EventKind::KeyDown, ListenerOptions::CAPTURE, recorder(&log, "key"));

        let ran = dispatcher.dispatch(&UiEvent::new(EventKind::Click));

        assert_eq!(ran, 2);
        assert_eq!(*log.lock().unwrap(), vec!["capture", "bubble"]);
    }

    #[test]
    fn test_remove_listener_reports_whether_it_existed() {
        let dispatcher = EventDispatcher::new();
        let id = dispatcher.add_listener(EventKind::Scroll, ListenerOptions::CAPTURE, Arc::new(|_: &UiEvent| {}));

        assert!(dispatcher.remove_listener(id));
        assert!(!dispatcher.remove_listener(id));
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_remove_itself_during_dispatch() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None::<ListenerId>));

        let listener: Listener = {
            let dispatcher = Arc::clone(&dispatcher);
            let calls = Arc::clone(&calls);
            let own_id = Arc::clone(&own_id);
            Arc::new(move |_: &UiEvent| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *own_id.lock().unwrap() {
                    dispatcher.remove_listener(id);
                }
            })
        };
        let id = dispatcher.add_listener(EventKind::Click, ListenerOptions::CAPTURE, listener);
        *own_id.lock().unwrap() = Some(id);

        dispatcher.dispatch(&UiEvent::new(EventKind::Click));
        dispatcher.dispatch(&UiEvent::new(EventKind::Click));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
