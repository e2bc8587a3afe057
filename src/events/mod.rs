//! Pass/failure event channel.
//!
//! The engine reports every assertion outcome here. External tooling
//! (reporters, runners) observes outcomes by subscribing:
//!
//! - [`EventChannel::on`] registers a handler and returns a [`Subscription`]
//! - [`EventChannel::record`] attaches an [`EventLog`] that keeps every event
//!
//! # Example
//!
//! ```rust
//! use referee::events::{Event, EventChannel, EventKind, PassEvent};
//!
//! let channel = EventChannel::new();
//! let log = channel.record();
//!
//! channel.emit(&Event::Pass(PassEvent::new("assert.same", vec![])));
//!
//! assert_eq!(log.passes().len(), 1);
//! assert!(log.failures().is_empty());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::error::AssertionError;
use crate::value::Value;

/// The two event names the engine emits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An assertion held.
    Pass,
    /// An assertion did not hold.
    Failure,
}

impl EventKind {
    /// The event name, `pass` or `failure`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `pass` event.
#[derive(Debug, Clone, PartialEq)]
pub struct PassEvent {
    /// Full assertion name, e.g. `assert.equals`.
    pub name: String,
    /// The effective call arguments.
    pub args: Vec<Value>,
}

impl PassEvent {
    /// Create a pass payload.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// An outcome emitted on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `pass` event.
    Pass(PassEvent),
    /// `failure` event.
    Failure(AssertionError),
}

impl Event {
    /// Which event this is.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Pass(_) => EventKind::Pass,
            Self::Failure(_) => EventKind::Failure,
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Listener {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

type Listeners = RwLock<Vec<Listener>>;

/// Fan-out publish/subscribe surface for assertion outcomes.
///
/// Handlers run synchronously, in subscription order, on the thread that
/// emits. A handler may subscribe or unsubscribe other handlers; the change
/// takes effect from the next emission.
pub struct EventChannel {
    listeners: Arc<Listeners>,
    next_id: AtomicU64,
}

impl EventChannel {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Subscribe `handler` to events of `kind`.
    ///
    /// The handler stays attached until [`Subscription::unsubscribe`] is
    /// called; dropping the subscription does not detach it.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push(Listener {
            id,
            kind,
            handler: Arc::new(handler),
        });
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every handler subscribed to its kind.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        // Snapshot so handlers can touch the listener list.
        let handlers: Vec<Handler> = self
            .listeners
            .read()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Arc::clone(&l.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers subscribed to `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }

    /// Remove every handler.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Attach a recorder to both event kinds.
    ///
    /// The recorder stays subscribed until [`EventLog::detach`] is called or
    /// the last clone of the returned log is dropped.
    #[must_use]
    pub fn record(&self) -> EventLog {
        let log = EventLog::new();
        let subscriptions = [EventKind::Pass, EventKind::Failure].map(|kind| {
            let sink = Arc::downgrade(&log.inner);
            self.on(kind, move |event| {
                if let Some(recorder) = sink.upgrade() {
                    recorder.events.lock().push(event.clone());
                }
            })
        });
        log.inner.subscriptions.lock().extend(subscriptions);
        log
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("pass_listeners", &self.listener_count(EventKind::Pass))
            .field("failure_listeners", &self.listener_count(EventKind::Failure))
            .finish()
    }
}

/// Disposer returned by [`EventChannel::on`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Detach the handler. Returns `false` if it was already gone.
    #[allow(clippy::must_use_candidate)]
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.write();
        let before = listeners.len();
        listeners.retain(|l| l.id != self.id);
        listeners.len() != before
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Recorder {
    fn detach(&self) -> bool {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        let mut detached = false;
        for subscription in subscriptions {
            detached |= subscription.unsubscribe();
        }
        detached
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Records every event seen on a channel, in order.
///
/// Clones share one buffer. Dropping the last clone unsubscribes the
/// recorder from its channel.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<Recorder>,
}

impl EventLog {
    fn new() -> Self {
        Self::default()
    }

    /// Stop recording. Events already seen are kept.
    ///
    /// Returns `false` if the recorder was not attached to a live channel.
    #[allow(clippy::must_use_candidate)]
    pub fn detach(&self) -> bool {
        self.inner.detach()
    }

    /// All recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.inner.events.lock().clone()
    }

    /// Recorded `pass` payloads.
    #[must_use]
    pub fn passes(&self) -> Vec<PassEvent> {
        self.inner
            .events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Pass(pass) => Some(pass.clone()),
                Event::Failure(_) => None,
            })
            .collect()
    }

    /// Recorded `failure` records.
    #[must_use]
    pub fn failures(&self) -> Vec<AssertionError> {
        self.inner
            .events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Failure(err) => Some(err.clone()),
                Event::Pass(_) => None,
            })
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.events.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.inner.events.lock().clear();
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &*self.inner.events.lock())
            .field("attached", &!self.inner.subscriptions.lock().is_empty())
            .finish()
    }
}
