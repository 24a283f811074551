use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The resolved, binary rendering mode applied to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 2] = [ThemeMode::Light, ThemeMode::Dark];

    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    /// Value of the asset tag attribute for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => anyhow::bail!("unknown theme mode {other:?}; expected `light` or `dark`"),
        }
    }
}

/// The preference stored by the host page. `Auto` defers to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceState {
    Light,
    Dark,
    Auto,
}

impl PreferenceState {
    /// The explicit mode, or `None` for `Auto`.
    pub fn explicit(self) -> Option<ThemeMode> {
        match self {
            PreferenceState::Light => Some(ThemeMode::Light),
            PreferenceState::Dark => Some(ThemeMode::Dark),
            PreferenceState::Auto => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceState::Light => "light",
            PreferenceState::Dark => "dark",
            PreferenceState::Auto => "auto",
        }
    }
}

impl From<ThemeMode> for PreferenceState {
    fn from(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => PreferenceState::Light,
            ThemeMode::Dark => PreferenceState::Dark,
        }
    }
}

impl fmt::Display for PreferenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw reading of the host preference marker, kept apart from
/// [`PreferenceState`] so that unknown values stay visible in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMarker {
    Recognized(PreferenceState),
    Unrecognized(String),
    Missing,
}

/// Attribute values the host theme writes for each preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTokens {
    pub light: String,
    pub dark: String,
    pub auto: String,
}

impl Default for MarkerTokens {
    fn default() -> Self {
        Self {
            light: "(prefers-color-scheme: light)".to_string(),
            dark: "(prefers-color-scheme: dark)".to_string(),
            auto: "(prefers-color-scheme)".to_string(),
        }
    }
}

impl MarkerTokens {
    /// Classifies a raw attribute value. Matching is exact, as the host
    /// theme writes these strings verbatim.
    pub fn classify(&self, raw: Option<&str>) -> HostMarker {
        let Some(raw) = raw else {
            return HostMarker::Missing;
        };
        if raw == self.dark {
            HostMarker::Recognized(PreferenceState::Dark)
        } else if raw == self.light {
            HostMarker::Recognized(PreferenceState::Light)
        } else if raw == self.auto {
            HostMarker::Recognized(PreferenceState::Auto)
        } else {
            HostMarker::Unrecognized(raw.to_string())
        }
    }
}
