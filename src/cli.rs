use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::mode::ThemeMode;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Emit {
    /// The page after synchronization, as HTML.
    Page,
    /// The browser script for the configuration.
    Script,
    /// A JSON summary of what was visible after each step.
    Report,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SystemSource {
    Light,
    Dark,
    /// Ask the operating system.
    Os,
}

/// A change replayed against the page after it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// The system preference switches to the given mode.
    System(ThemeMode),
    /// The user selects the toggle control at the given index.
    Toggle(usize),
}

impl std::fmt::Display for PageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageEvent::System(mode) => write!(f, "system={mode}"),
            PageEvent::Toggle(index) => write!(f, "toggle={index}"),
        }
    }
}

pub fn parse_event(raw: &str) -> Result<PageEvent, String> {
    let (kind, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `system=<light|dark>` or `toggle=<index>`, got {raw:?}"))?;
    match kind.trim() {
        "system" => value
            .parse::<ThemeMode>()
            .map(PageEvent::System)
            .map_err(|e| e.to_string()),
        "toggle" => value
            .trim()
            .parse::<usize>()
            .map(PageEvent::Toggle)
            .map_err(|e| format!("invalid toggle index {value:?}: {e}")),
        other => Err(format!("unknown event kind {other:?}")),
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// HTML page containing diagrams tagged `light` / `dark`.
    ///
    /// Required unless `--emit script`.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// JSON configuration file. Missing keys keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// System color scheme at page load: `light`, `dark`, or `os` to detect it.
    #[arg(long, value_enum, default_value = "os")]
    pub system: SystemSource,

    /// Event replayed after page load, in order. Repeatable:
    /// `--event system=dark --event toggle=1`.
    #[arg(long = "event", value_parser = parse_event)]
    pub events: Vec<PageEvent>,

    /// What to write: `page`, `script`, or `report`.
    #[arg(long, value_enum, default_value = "page")]
    pub emit: Emit,

    /// Output file. Defaults to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Leave the browser script out of the written page.
    #[arg(long)]
    pub no_script: bool,

    /// Enable synchronizer diagnostics (overrides the config file).
    #[arg(long)]
    pub debug: bool,
}
