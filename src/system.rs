use std::cell::Cell;
use std::rc::Rc;

use crate::env::SystemPreference;
use crate::listeners::{Listeners, SubscriptionId};
use crate::mode::ThemeMode;

/// A system preference whose value is set by the caller.
///
/// Mirrors a media query list: listeners fire only when the value actually
/// changes.
pub struct ManualSystemPreference {
    prefers_dark: Cell<bool>,
    listeners: Listeners<bool>,
}

impl ManualSystemPreference {
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            prefers_dark: Cell::new(mode == ThemeMode::Dark),
            listeners: Listeners::new(),
        }
    }

    /// Updates the value, notifying listeners when it changed. Returns
    /// whether a notification was sent.
    pub fn set(&self, mode: ThemeMode) -> bool {
        let prefers_dark = mode == ThemeMode::Dark;
        if self.prefers_dark.replace(prefers_dark) == prefers_dark {
            return false;
        }
        self.listeners.emit(&prefers_dark);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SystemPreference for ManualSystemPreference {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark.get()
    }

    fn subscribe_change(&self, listener: Rc<dyn Fn(bool)>) -> SubscriptionId {
        self.listeners
            .subscribe(Rc::new(move |prefers_dark: &bool| listener(*prefers_dark)))
    }

    fn unsubscribe_change(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

type Detector = Box<dyn Fn() -> ThemeMode>;

/// The operating system's color scheme, read through `dark-light`.
///
/// There is no event loop driving OS notifications here, so changes are
/// picked up by calling [`OsSystemPreference::poll`]. A pinned mode takes the
/// place of the OS reading until it is pinned again.
pub struct OsSystemPreference {
    detector: Detector,
    pinned: Cell<Option<ThemeMode>>,
    inner: ManualSystemPreference,
}

impl OsSystemPreference {
    pub fn new() -> Self {
        Self::with_detector(detect_os_mode)
    }

    pub fn with_detector(detector: impl Fn() -> ThemeMode + 'static) -> Self {
        let initial = detector();
        Self {
            detector: Box::new(detector),
            pinned: Cell::new(None),
            inner: ManualSystemPreference::new(initial),
        }
    }

    /// Reports `mode` without ever asking the OS.
    pub fn pinned(mode: ThemeMode) -> Self {
        Self {
            detector: Box::new(detect_os_mode),
            pinned: Cell::new(Some(mode)),
            inner: ManualSystemPreference::new(mode),
        }
    }

    /// Re-reads the OS setting and notifies listeners if it changed.
    pub fn poll(&self) -> bool {
        let mode = match self.pinned.get() {
            Some(mode) => mode,
            None => (self.detector)(),
        };
        let changed = self.inner.set(mode);
        if changed {
            tracing::debug!(%mode, "os color scheme changed");
        }
        changed
    }

    /// Overrides the OS reading with `mode` and polls.
    pub fn pin(&self, mode: ThemeMode) -> bool {
        self.pinned.set(Some(mode));
        self.poll()
    }
}

impl Default for OsSystemPreference {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPreference for OsSystemPreference {
    fn prefers_dark(&self) -> bool {
        self.inner.prefers_dark()
    }

    fn subscribe_change(&self, listener: Rc<dyn Fn(bool)>) -> SubscriptionId {
        self.inner.subscribe_change(listener)
    }

    fn unsubscribe_change(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe_change(id)
    }
}

/// Maps `dark-light`'s answer onto a binary mode; "unspecified" counts as
/// light, the same as a media query that does not match.
pub fn detect_os_mode() -> ThemeMode {
    match dark_light::detect() {
        dark_light::Mode::Dark => ThemeMode::Dark,
        dark_light::Mode::Light | dark_light::Mode::Default => ThemeMode::Light,
    }
}
