//! Capabilities the synchronizer needs from its surroundings.
//!
//! The synchronizer never touches a browser or a parsed page directly; it
//! talks to a [`SystemPreference`] and a [`HostDocument`]. Real adapters live
//! in [`crate::system`] and [`crate::page`], and tests plug in their own.

use std::rc::Rc;

use crate::listeners::SubscriptionId;
use crate::mode::ThemeMode;

/// The OS/browser level "prefers dark" signal.
pub trait SystemPreference {
    fn prefers_dark(&self) -> bool;

    /// Registers a listener called with the new value on every change.
    fn subscribe_change(&self, listener: Rc<dyn Fn(bool)>) -> SubscriptionId;

    fn unsubscribe_change(&self, id: SubscriptionId) -> bool;
}

/// The host page: its preference marker, its theme toggle controls and the
/// tagged asset groups.
pub trait HostDocument {
    /// Current value of the preference marker attribute, if present.
    fn preference_marker(&self) -> Option<String>;

    /// Shows or hides every element tagged with `group`. Returns how many
    /// elements were updated.
    fn set_group_visible(&self, group: ThemeMode, visible: bool) -> usize;

    /// Registers a listener fired whenever any toggle control changes.
    fn subscribe_toggle(&self, listener: Rc<dyn Fn()>) -> SubscriptionId;

    fn unsubscribe_toggle(&self, id: SubscriptionId) -> bool;
}

impl<T: SystemPreference + ?Sized> SystemPreference for Rc<T> {
    fn prefers_dark(&self) -> bool {
        (**self).prefers_dark()
    }

    fn subscribe_change(&self, listener: Rc<dyn Fn(bool)>) -> SubscriptionId {
        (**self).subscribe_change(listener)
    }

    fn unsubscribe_change(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe_change(id)
    }
}

impl<T: HostDocument + ?Sized> HostDocument for Rc<T> {
    fn preference_marker(&self) -> Option<String> {
        (**self).preference_marker()
    }

    fn set_group_visible(&self, group: ThemeMode, visible: bool) -> usize {
        (**self).set_group_visible(group, visible)
    }

    fn subscribe_toggle(&self, listener: Rc<dyn Fn()>) -> SubscriptionId {
        (**self).subscribe_toggle(listener)
    }

    fn unsubscribe_toggle(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe_toggle(id)
    }
}
