mod cli;
pub mod config;
pub mod env;
pub mod listeners;
pub mod mode;
pub mod page;
pub mod script;
pub mod sync;
pub mod system;

use std::path::Path;
use std::rc::Rc;

use anyhow::Context as _;
use serde::Serialize;

pub use cli::{Args as CliArgs, Emit, PageEvent, SystemSource};
pub use config::SyncConfig;
pub use env::{HostDocument, SystemPreference};
pub use listeners::{Listeners, SubscriptionId};
pub use mode::{HostMarker, MarkerTokens, PreferenceState, ThemeMode};
pub use page::Page;
pub use sync::{AppliedMode, Attachment, ThemeSynchronizer};
pub use system::{ManualSystemPreference, OsSystemPreference};

/// What was visible after one step of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub trigger: String,
    pub marker: Option<String>,
    pub system: ThemeMode,
    pub light_visible: usize,
    pub dark_visible: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub light_total: usize,
    pub dark_total: usize,
    pub steps: Vec<Step>,
}

pub fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::from_path(path)?,
        None => SyncConfig::default(),
    };
    if args.debug {
        config.debug = true;
    }

    if matches!(args.emit, Emit::Script) {
        if args.input.is_some() || !args.events.is_empty() {
            tracing::warn!("--emit script ignores --input and --event");
        }
        return write_output(args.out.as_deref(), &script::render_script(&config));
    }

    let Some(input) = args.input.as_deref() else {
        anyhow::bail!("--input is required unless --emit script");
    };

    let system = Rc::new(match args.system {
        SystemSource::Light => OsSystemPreference::pinned(ThemeMode::Light),
        SystemSource::Dark => OsSystemPreference::pinned(ThemeMode::Dark),
        SystemSource::Os => OsSystemPreference::new(),
    });
    let initial = ThemeMode::from_prefers_dark(system.prefers_dark());
    tracing::info!(input = %input.display(), system = %initial, "synchronizing page");

    let page = Rc::new(Page::from_path(input, config.clone())?);
    let report = replay(page.clone(), system, config.clone(), &args.events)?;

    let (light, dark) = report
        .steps
        .last()
        .map(|s| (s.light_visible, s.dark_visible))
        .unwrap_or_default();
    tracing::info!(
        steps = report.steps.len(),
        light_visible = light,
        dark_visible = dark,
        "page synchronized"
    );

    match args.emit {
        Emit::Report => {
            let json = serde_json::to_string_pretty(&report).context("serialize report")?;
            write_output(args.out.as_deref(), &json)
        }
        _ => {
            if !args.no_script {
                page.embed_script(&script::render_script_tag(&config))
                    .context("embed browser script")?;
            }
            write_output(args.out.as_deref(), &page.to_html()?)
        }
    }
}

/// Loads the page state, attaches a synchronizer and replays `events`,
/// recording the visible state after each step. System events pin the
/// preference to the given mode.
pub fn replay(
    page: Rc<Page>,
    system: Rc<OsSystemPreference>,
    config: SyncConfig,
    events: &[PageEvent],
) -> anyhow::Result<Report> {
    let sync = Rc::new(ThemeSynchronizer::new(system.clone(), page.clone(), config));
    let (applied, _attachment) = sync.start();
    tracing::debug!(mode = %applied.mode, "initial mode applied");

    let mut steps = vec![snapshot(&page, &system, "load".to_string())];
    for event in events {
        match *event {
            PageEvent::System(mode) => {
                system.pin(mode);
            }
            PageEvent::Toggle(index) => {
                page.select_toggle(index).with_context(|| format!("replay {event}"))?;
            }
        }
        steps.push(snapshot(&page, &system, event.to_string()));
    }

    Ok(Report {
        light_total: page.visible_count(ThemeMode::Light).1,
        dark_total: page.visible_count(ThemeMode::Dark).1,
        steps,
    })
}

fn snapshot(page: &Page, system: &OsSystemPreference, trigger: String) -> Step {
    Step {
        trigger,
        marker: page.preference_marker(),
        system: ThemeMode::from_prefers_dark(system.prefers_dark()),
        light_visible: page.visible_count(ThemeMode::Light).0,
        dark_visible: page.visible_count(ThemeMode::Dark).0,
    }
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let Some(path) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
