//! Event dispatching.
//!
//! The host package manager announces lifecycle steps (`post-install-cmd`,
//! `post-package-install`, ...) on an event bus. This module models that bus:
//!
//! - [`EventDispatcher`] - anything events can be dispatched to
//! - [`ListenerDispatcher`] - a local bus with prioritized listeners
//! - [`BroadcastEventDispatcher`] - a local bus that forwards a fixed set of
//!   event names to an upstream bus
//!
//! Dispatch takes `&self` and never holds a borrow while listeners run, so a
//! listener may dispatch further events (a nested install announcing package
//! installs while the outer `post-install-cmd` is still being handled).

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A named event, optionally about a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    package: Option<String>,
}

impl Event {
    /// Event with no package attached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
        }
    }

    /// Attach the package the event is about.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package the event is about, if any.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{} ({package})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Something events can be dispatched to.
///
/// Returns the exit code of the listeners: `0` when all succeeded.
pub trait EventDispatcher {
    /// Dispatch `event`.
    fn dispatch(&self, event: &Event) -> Result<i32>;
}

/// Shared handle to an event bus.
pub type SharedDispatcher = Rc<dyn EventDispatcher>;

/// Event listener callback.
pub type Listener = Rc<dyn Fn(&Event) -> Result<i32>>;

struct Registration {
    event: String,
    priority: i32,
    sequence: u64,
    listener: Listener,
}

/// Event bus with prioritized listeners.
///
/// Listeners for an event run from highest to lowest priority, in
/// registration order within a priority. The first non-zero exit code stops
/// propagation and is returned.
#[derive(Default)]
pub struct ListenerDispatcher {
    listeners: RefCell<Vec<Registration>>,
    next_sequence: Cell<u64>,
}

impl ListenerDispatcher {
    /// Bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event` at `priority`.
    pub fn add_listener<F>(&self, event: impl Into<String>, priority: i32, listener: F)
    where
        F: Fn(&Event) -> Result<i32> + 'static,
    {
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);
        self.listeners.borrow_mut().push(Registration {
            event: event.into(),
            priority,
            sequence,
            listener: Rc::new(listener),
        });
    }

    /// Whether any listener is registered for `event`.
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.borrow().iter().any(|registration| registration.event == event)
    }

    fn listeners_for(&self, event: &str) -> Vec<Listener> {
        let listeners = self.listeners.borrow();
        let mut matching: Vec<&Registration> =
            listeners.iter().filter(|registration| registration.event == event).collect();
        matching.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.sequence.cmp(&b.sequence)));
        matching.into_iter().map(|registration| Rc::clone(&registration.listener)).collect()
    }
}

impl EventDispatcher for ListenerDispatcher {
    fn dispatch(&self, event: &Event) -> Result<i32> {
        for listener in self.listeners_for(event.name()) {
            let code = listener(event)?;
            if code != 0 {
                tracing::debug!(event = %event, code, "listener stopped propagation");
                return Ok(code);
            }
        }
        Ok(0)
    }
}

/// Local event bus that forwards selected events upstream.
///
/// A nested install gets one of these so that plugins already loaded by the
/// host still hear about a narrow set of events (a package was installed)
/// without the whole plugin chain re-running for everything else.
pub struct BroadcastEventDispatcher {
    local: ListenerDispatcher,
    upstream: Option<SharedDispatcher>,
    broadcast_events: Vec<String>,
}

impl BroadcastEventDispatcher {
    /// Forward `broadcast_events` to `upstream`; dispatch everything else locally.
    pub fn new(upstream: Option<SharedDispatcher>, broadcast_events: Vec<String>) -> Self {
        Self {
            local: ListenerDispatcher::new(),
            upstream,
            broadcast_events,
        }
    }

    /// The local bus, for registering listeners.
    #[must_use]
    pub fn local(&self) -> &ListenerDispatcher {
        &self.local
    }

    /// Event names forwarded upstream.
    #[must_use]
    pub fn broadcast_events(&self) -> &[String] {
        &self.broadcast_events
    }
}

impl EventDispatcher for BroadcastEventDispatcher {
    fn dispatch(&self, event: &Event) -> Result<i32> {
        let broadcast = self.broadcast_events.iter().any(|name| name == event.name());
        match &self.upstream {
            Some(upstream) if broadcast => {
                tracing::debug!(event = %event, "broadcasting event upstream");
                upstream.dispatch(event)
            }
            _ => self.local.dispatch(event),
        }
    }
}
