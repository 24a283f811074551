use std::sync::LazyLock;

use maud::{Markup, PreEscaped, html};
use regex::Regex;

use crate::config::SyncConfig;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([A-Z][A-Z_]*[A-Z])__").expect("placeholder regex"));

/// Browser-side synchronizer. Placeholders of the form `__NAME__` are filled
/// in by [`render_script`] with JSON string literals.
const THEME_SYNC_JS: &str = r#"(function () {
  var DEBUG = __DEBUG__;
  var MARKER_ATTRIBUTE = __MARKER_ATTRIBUTE__;
  var TOKENS = { light: __TOKEN_LIGHT__, dark: __TOKEN_DARK__, auto: __TOKEN_AUTO__ };
  var ASSET_ATTRIBUTE = __ASSET_ATTRIBUTE__;
  var TOGGLE_NAME = __TOGGLE_NAME__;
  var VISIBLE = __VISIBLE__;
  var HIDDEN = __HIDDEN__;
  var DARK_QUERY = __DARK_QUERY__;

  function log(message) {
    if (DEBUG) {
      console.log("[puml-theme-sync] " + message);
    }
  }

  function systemPreference() {
    var mode = window.matchMedia(DARK_QUERY).matches ? "dark" : "light";
    log("system preference: " + mode);
    return mode;
  }

  function hostPreference() {
    var marker = document.body.getAttribute(MARKER_ATTRIBUTE);
    var state;
    if (marker === TOKENS.dark) {
      state = "dark";
    } else if (marker === TOKENS.light) {
      state = "light";
    } else if (marker === TOKENS.auto) {
      state = "auto";
    } else {
      log("unrecognized host preference marker: " + marker);
      state = systemPreference();
    }
    log("host preference: " + state);
    return state;
  }

  function effectiveMode() {
    var state = hostPreference();
    return state === "auto" ? systemPreference() : state;
  }

  function applyMode(mode) {
    ["light", "dark"].forEach(function (group) {
      var display = group === mode ? VISIBLE : HIDDEN;
      document
        .querySelectorAll("[" + ASSET_ATTRIBUTE + '="' + group + '"]')
        .forEach(function (el) {
          el.style.display = display;
        });
    });
    log("diagram visibility toggled to " + mode);
  }

  function onSystemChange(prefersDark) {
    var mode = prefersDark ? "dark" : "light";
    log("system preference changed to " + mode);
    if (hostPreference() !== "auto") {
      log("host preference is not auto; ignoring");
      return;
    }
    applyMode(mode);
  }

  function onToggleChange() {
    log("host preference changed");
    applyMode(effectiveMode());
  }

  document.addEventListener("DOMContentLoaded", function () {
    applyMode(effectiveMode());

    window.matchMedia(DARK_QUERY).addEventListener("change", function (e) {
      onSystemChange(e.matches);
    });

    document
      .querySelectorAll('input[name="' + TOGGLE_NAME + '"]')
      .forEach(function (input) {
        input.addEventListener("change", onToggleChange);
      });
  });
})();"#;

/// Renders the browser script for `config`.
pub fn render_script(config: &SyncConfig) -> String {
    PLACEHOLDER
        .replace_all(THEME_SYNC_JS, |caps: &regex::Captures<'_>| {
            match placeholder_value(config, &caps[1]) {
                Some(literal) => literal,
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn placeholder_value(config: &SyncConfig, name: &str) -> Option<String> {
    let tokens = &config.marker_tokens;
    let value = match name {
        "DEBUG" => return Some(config.debug.to_string()),
        "MARKER_ATTRIBUTE" => &config.marker_attribute,
        "TOKEN_LIGHT" => &tokens.light,
        "TOKEN_DARK" => &tokens.dark,
        "TOKEN_AUTO" => &tokens.auto,
        "ASSET_ATTRIBUTE" => &config.asset_attribute,
        "TOGGLE_NAME" => &config.toggle_name,
        "VISIBLE" => &config.visible_display,
        "HIDDEN" => &config.hidden_display,
        "DARK_QUERY" => &config.dark_media_query,
        _ => return None,
    };
    Some(js_string(value))
}

/// `id` of the embedded `<script>` element, so a page processed twice keeps
/// a single copy.
pub const SCRIPT_ID: &str = "puml-theme-sync";

/// The script wrapped in an inline `<script>` element.
pub fn render_script_tag(config: &SyncConfig) -> String {
    let markup: Markup = html! {
        script id=(SCRIPT_ID) { (PreEscaped(render_script(config).replace("</", "<\\/"))) }
    };
    markup.into_string()
}

fn js_string(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    serde_json::to_string(value).expect("a str always serializes")
}
