use std::collections::HashSet;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::mode::MarkerTokens;

/// Configuration for one synchronizer instance and the page adapter it runs
/// against. Every field has a default matching mkdocs-material + mkdocs_puml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Emit diagnostic log lines.
    pub debug: bool,
    /// Attribute on `<body>` holding the host preference marker.
    pub marker_attribute: String,
    pub marker_tokens: MarkerTokens,
    /// Attribute tagging diagram elements with `light` or `dark`.
    pub asset_attribute: String,
    /// `name` shared by the host's theme toggle inputs.
    pub toggle_name: String,
    /// Attribute on a toggle input carrying the marker value it selects.
    pub toggle_marker_attribute: String,
    pub visible_display: String,
    pub hidden_display: String,
    pub dark_media_query: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debug: false,
            marker_attribute: "data-md-color-media".to_string(),
            marker_tokens: MarkerTokens::default(),
            asset_attribute: "data-puml-theme".to_string(),
            toggle_name: "__palette".to_string(),
            toggle_marker_attribute: "data-md-color-media".to_string(),
            visible_display: "block".to_string(),
            hidden_display: "none".to_string(),
            dark_media_query: "(prefers-color-scheme: dark)".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config: SyncConfig = serde_json::from_str(text).context("parse sync config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("marker_attribute", &self.marker_attribute),
            ("asset_attribute", &self.asset_attribute),
            ("toggle_name", &self.toggle_name),
            ("toggle_marker_attribute", &self.toggle_marker_attribute),
            ("dark_media_query", &self.dark_media_query),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{name} must not be empty");
            }
        }

        let tokens = &self.marker_tokens;
        let mut seen = HashSet::new();
        for token in [&tokens.light, &tokens.dark, &tokens.auto] {
            if token.is_empty() {
                anyhow::bail!("marker tokens must not be empty");
            }
            if !seen.insert(token.as_str()) {
                anyhow::bail!("marker token {token:?} is used for more than one preference");
            }
        }

        if self.visible_display.trim() == self.hidden_display.trim() {
            anyhow::bail!(
                "visible_display and hidden_display are both {:?}",
                self.visible_display
            );
        }
        Ok(())
    }
}
