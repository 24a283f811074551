use std::rc::{Rc, Weak};

use crate::config::SyncConfig;
use crate::env::{HostDocument, SystemPreference};
use crate::listeners::SubscriptionId;
use crate::mode::{HostMarker, PreferenceState, ThemeMode};

/// Logs only when the instance was configured with `debug`.
macro_rules! sync_log {
    ($sync:expr, $level:ident, $($arg:tt)+) => {
        if $sync.config.debug {
            tracing::$level!($($arg)+);
        }
    };
}

/// Outcome of one [`ThemeSynchronizer::apply_mode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMode {
    pub mode: ThemeMode,
    pub shown: usize,
    pub hidden: usize,
}

/// Keeps the visible diagram variant in step with the host page's color
/// scheme preference.
pub struct ThemeSynchronizer<S, D> {
    system: S,
    document: D,
    config: SyncConfig,
}

impl<S: SystemPreference, D: HostDocument> ThemeSynchronizer<S, D> {
    pub fn new(system: S, document: D, config: SyncConfig) -> Self {
        Self {
            system,
            document,
            config,
        }
    }

    pub fn read_system_preference(&self) -> ThemeMode {
        let mode = ThemeMode::from_prefers_dark(self.system.prefers_dark());
        sync_log!(self, debug, %mode, "system preference");
        mode
    }

    /// Reads the marker without resolving unknown values.
    pub fn read_host_marker(&self) -> HostMarker {
        let raw = self.document.preference_marker();
        self.config.marker_tokens.classify(raw.as_deref())
    }

    /// Reads the host preference. A missing or unrecognized marker resolves
    /// to the current system preference, so this returns `Auto` only when the
    /// host explicitly asks for it.
    pub fn read_host_preference(&self) -> PreferenceState {
        let state = match self.read_host_marker() {
            HostMarker::Recognized(state) => state,
            HostMarker::Missing => {
                sync_log!(self, debug, "host preference marker missing");
                self.read_system_preference().into()
            }
            HostMarker::Unrecognized(raw) => {
                sync_log!(
                    self,
                    warn,
                    marker = %raw,
                    attribute = %self.config.marker_attribute,
                    "unrecognized host preference marker; using system preference"
                );
                self.read_system_preference().into()
            }
        };
        sync_log!(self, debug, preference = %state, "host preference");
        state
    }

    pub fn resolve_effective_mode(&self) -> ThemeMode {
        match self.read_host_preference().explicit() {
            Some(mode) => mode,
            None => self.read_system_preference(),
        }
    }

    /// Shows the group tagged `mode` and hides the other one. Idempotent.
    pub fn apply_mode(&self, mode: ThemeMode) -> AppliedMode {
        let mut applied = AppliedMode {
            mode,
            shown: 0,
            hidden: 0,
        };
        for group in ThemeMode::ALL {
            let visible = group == mode;
            let count = self.document.set_group_visible(group, visible);
            if visible {
                applied.shown += count;
            } else {
                applied.hidden += count;
            }
        }
        sync_log!(
            self,
            debug,
            %mode,
            shown = applied.shown,
            hidden = applied.hidden,
            "diagram visibility toggled"
        );
        applied
    }

    /// Page-ready step: resolve once and apply.
    pub fn initialize(&self) -> AppliedMode {
        let mode = self.resolve_effective_mode();
        sync_log!(self, debug, %mode, "initial theme");
        self.apply_mode(mode)
    }

    /// Reacts to an OS preference change. The new mode is applied only while
    /// the host preference reads `Auto`; otherwise the change is ignored
    /// (`None`). A missing or unrecognized marker reads as a concrete mode
    /// here, so it ignores the change too.
    pub fn handle_system_change(&self, prefers_dark: bool) -> Option<AppliedMode> {
        let mode = ThemeMode::from_prefers_dark(prefers_dark);
        sync_log!(self, debug, %mode, "system preference changed");
        let state = self.read_host_preference();
        if state != PreferenceState::Auto {
            sync_log!(
                self,
                debug,
                preference = %state,
                "host preference is not auto; ignoring"
            );
            return None;
        }
        Some(self.apply_mode(mode))
    }

    /// Reacts to a change of one of the host's theme toggle controls.
    pub fn handle_toggle_change(&self) -> AppliedMode {
        sync_log!(self, debug, "host preference changed");
        let mode = self.resolve_effective_mode();
        self.apply_mode(mode)
    }
}

impl<S, D> ThemeSynchronizer<S, D>
where
    S: SystemPreference + 'static,
    D: HostDocument + 'static,
{
    /// Subscribes to both change signals for as long as the returned
    /// [`Attachment`] lives.
    pub fn attach(self: &Rc<Self>) -> Attachment<S, D> {
        let weak: Weak<Self> = Rc::downgrade(self);
        let system_id = self.system.subscribe_change(Rc::new(move |prefers_dark: bool| {
            if let Some(sync) = weak.upgrade() {
                sync.handle_system_change(prefers_dark);
            }
        }));

        let weak: Weak<Self> = Rc::downgrade(self);
        let toggle_id = self.document.subscribe_toggle(Rc::new(move || {
            if let Some(sync) = weak.upgrade() {
                sync.handle_toggle_change();
            }
        }));

        sync_log!(self, debug, "listening for color scheme changes");
        Attachment {
            sync: self.clone(),
            ids: Some((system_id, toggle_id)),
        }
    }

    /// Convenience for the page-ready sequence: apply once, then listen.
    pub fn start(self: &Rc<Self>) -> (AppliedMode, Attachment<S, D>) {
        let applied = self.initialize();
        (applied, self.attach())
    }
}

/// Live subscription of a synchronizer. Dropping it unsubscribes.
pub struct Attachment<S: SystemPreference, D: HostDocument> {
    sync: Rc<ThemeSynchronizer<S, D>>,
    ids: Option<(SubscriptionId, SubscriptionId)>,
}

impl<S: SystemPreference, D: HostDocument> Attachment<S, D> {
    pub fn is_attached(&self) -> bool {
        self.ids.is_some()
    }

    pub fn detach(&mut self) {
        if let Some((system_id, toggle_id)) = self.ids.take() {
            self.sync.system.unsubscribe_change(system_id);
            self.sync.document.unsubscribe_toggle(toggle_id);
            sync_log!(self.sync, debug, "stopped listening for color scheme changes");
        }
    }
}

impl<S: SystemPreference, D: HostDocument> Drop for Attachment<S, D> {
    fn drop(&mut self) {
        self.detach();
    }
}
