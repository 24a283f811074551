use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use anyhow::Context as _;
use kuchiki::traits::TendrilSink as _;
use regex::Regex;

use crate::config::SyncConfig;
use crate::env::HostDocument;
use crate::listeners::{Listeners, SubscriptionId};
use crate::mode::ThemeMode;

static DISPLAY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<lead>^|;)(?P<ws>\s*)display\s*:[^;]*")
        .expect("display declaration regex")
});

/// A parsed HTML page acting as the host document.
///
/// Toggle controls are the host theme's palette inputs. A static page has no
/// click events, so [`Page::select_toggle`] performs what the host theme does
/// on a click and then notifies toggle listeners.
pub struct Page {
    document: kuchiki::NodeRef,
    config: SyncConfig,
    toggles: Listeners<usize>,
}

impl Page {
    pub fn parse(html: &str, config: SyncConfig) -> Self {
        Self {
            document: kuchiki::parse_html().one(html),
            config,
            toggles: Listeners::new(),
        }
    }

    pub fn from_path(path: &Path, config: SyncConfig) -> anyhow::Result<Self> {
        let html =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(Self::parse(&html, config))
    }

    pub fn to_html(&self) -> anyhow::Result<String> {
        let mut out = Vec::new();
        self.document.serialize(&mut out).context("serialize page")?;
        String::from_utf8(out).context("page html not utf-8")
    }

    /// Sets or removes the preference marker directly.
    pub fn set_preference_marker(&self, value: Option<&str>) {
        let Some(body) = self.body() else { return };
        let mut attrs = body.attributes.borrow_mut();
        match value {
            Some(value) => {
                attrs.insert(self.config.marker_attribute.as_str(), value.to_string());
            }
            None => {
                attrs.remove(self.config.marker_attribute.as_str());
            }
        }
    }

    /// Appends the `<script>` element in `tag` to `<body>`. A script already
    /// on the page with the same `id` is removed first.
    pub fn embed_script(&self, tag: &str) -> anyhow::Result<()> {
        let fragment = kuchiki::parse_html().one(tag);
        let script = fragment
            .select_first("script")
            .map_err(|()| anyhow::anyhow!("no <script> element in markup"))?;
        let body = self.body().context("page has no <body>")?;

        let id = script.attributes.borrow().get("id").map(|s| s.to_string());
        if let Some(id) = id {
            let stale: Vec<_> = match self.document.select(&format!("script[id=\"{id}\"]")) {
                Ok(nodes) => nodes.collect(),
                Err(()) => Vec::new(),
            };
            if !stale.is_empty() {
                tracing::debug!(%id, count = stale.len(), "replacing embedded script");
            }
            for node in stale {
                node.as_node().detach();
            }
        }

        let node = script.as_node().clone();
        node.detach();
        body.as_node().append(node);
        Ok(())
    }

    pub fn toggle_count(&self) -> usize {
        self.toggle_controls().len()
    }

    /// Selects the toggle control at `index`: checks it, copies the marker
    /// value it carries onto the page and fires the change listeners.
    pub fn select_toggle(&self, index: usize) -> anyhow::Result<()> {
        let controls = self.toggle_controls();
        let Some(selected) = controls.get(index) else {
            anyhow::bail!(
                "toggle {index} does not exist; page has {} input(s) named {:?}",
                controls.len(),
                self.config.toggle_name
            );
        };

        for control in &controls {
            control.attributes.borrow_mut().remove("checked");
        }
        let marker = {
            let mut attrs = selected.attributes.borrow_mut();
            attrs.insert("checked", String::new());
            attrs
                .get(self.config.toggle_marker_attribute.as_str())
                .map(|s| s.to_string())
        };
        if marker.is_none() {
            tracing::warn!(
                index,
                attribute = %self.config.toggle_marker_attribute,
                "toggle control carries no marker value"
            );
        }
        self.set_preference_marker(marker.as_deref());
        tracing::debug!(index, marker = ?marker, "toggle control selected");

        self.toggles.emit(&index);
        Ok(())
    }

    /// Number of elements in `group` that are currently displayed, and the
    /// group's total size.
    pub fn visible_count(&self, group: ThemeMode) -> (usize, usize) {
        let elements = self.group_elements(group);
        let visible = elements
            .iter()
            .filter(|el| {
                let attrs = el.attributes.borrow();
                let style = attrs.get("style").unwrap_or("");
                display_value(style).as_deref() != Some(self.config.hidden_display.trim())
            })
            .count();
        (visible, elements.len())
    }

    fn body(&self) -> Option<kuchiki::NodeDataRef<kuchiki::ElementData>> {
        self.document.select_first("body").ok()
    }

    fn toggle_controls(&self) -> Vec<kuchiki::NodeDataRef<kuchiki::ElementData>> {
        let selector = format!("input[name=\"{}\"]", self.config.toggle_name);
        match self.document.select(&selector) {
            Ok(nodes) => nodes.collect(),
            Err(()) => Vec::new(),
        }
    }

    fn group_elements(
        &self,
        group: ThemeMode,
    ) -> Vec<kuchiki::NodeDataRef<kuchiki::ElementData>> {
        let selector = format!("[{}=\"{}\"]", self.config.asset_attribute, group.as_str());
        match self.document.select(&selector) {
            Ok(nodes) => nodes.collect(),
            Err(()) => {
                tracing::warn!(%selector, "invalid asset selector");
                Vec::new()
            }
        }
    }
}

impl HostDocument for Page {
    fn preference_marker(&self) -> Option<String> {
        let body = self.body()?;
        let attrs = body.attributes.borrow();
        attrs
            .get(self.config.marker_attribute.as_str())
            .map(|s| s.to_string())
    }

    fn set_group_visible(&self, group: ThemeMode, visible: bool) -> usize {
        let display = if visible {
            &self.config.visible_display
        } else {
            &self.config.hidden_display
        };
        let elements = self.group_elements(group);
        for el in &elements {
            let mut attrs = el.attributes.borrow_mut();
            let style = attrs.get("style").unwrap_or("").to_string();
            attrs.insert("style", with_display(&style, display));
        }
        elements.len()
    }

    fn subscribe_toggle(&self, listener: Rc<dyn Fn()>) -> SubscriptionId {
        self.toggles.subscribe(Rc::new(move |_: &usize| listener()))
    }

    fn unsubscribe_toggle(&self, id: SubscriptionId) -> bool {
        self.toggles.unsubscribe(id)
    }
}

/// Sets the `display` declaration of an inline style, leaving every other
/// declaration in place.
fn with_display(style: &str, value: &str) -> String {
    if DISPLAY_DECL.is_match(style) {
        return DISPLAY_DECL
            .replace_all(style, |caps: &regex::Captures<'_>| {
                format!("{}{}display: {value}", &caps["lead"], &caps["ws"])
            })
            .into_owned();
    }

    let trimmed = style.trim_end().trim_end_matches(';').trim_end();
    if trimmed.trim().is_empty() {
        format!("display: {value}")
    } else {
        format!("{trimmed}; display: {value}")
    }
}

/// Value of the last `display` declaration in an inline style.
fn display_value(style: &str) -> Option<String> {
    DISPLAY_DECL.find_iter(style).last().and_then(|m| {
        let decl = m.as_str();
        let (_, value) = decl.split_once(':')?;
        Some(value.trim().to_string())
    })
}
