use std::path::{Path, PathBuf};
use std::rc::Rc;

use puml_theme_sync::{
    CliArgs, Emit, HostDocument as _, ManualSystemPreference, OsSystemPreference, Page, PageEvent,
    SyncConfig, SystemSource, ThemeMode, ThemeSynchronizer,
};
use tempfile::tempdir;

const DARK: &str = "(prefers-color-scheme: dark)";
const AUTO: &str = "(prefers-color-scheme)";

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/material_page.html")
}

fn load(marker: Option<&str>) -> Rc<Page> {
    let page = Page::from_path(&fixture(), SyncConfig::default()).unwrap();
    page.set_preference_marker(marker);
    Rc::new(page)
}

/// (visible light, visible dark) element counts.
fn visible(page: &Page) -> (usize, usize) {
    (
        page.visible_count(ThemeMode::Light).0,
        page.visible_count(ThemeMode::Dark).0,
    )
}

fn synchronizer(
    page: &Rc<Page>,
    system: ThemeMode,
) -> (
    Rc<ThemeSynchronizer<Rc<ManualSystemPreference>, Rc<Page>>>,
    Rc<ManualSystemPreference>,
) {
    let system = Rc::new(ManualSystemPreference::new(system));
    let sync = Rc::new(ThemeSynchronizer::new(
        system.clone(),
        page.clone(),
        SyncConfig::default(),
    ));
    (sync, system)
}

#[test]
fn host_dark_wins_over_light_system() {
    let page = load(Some(DARK));
    let (sync, _) = synchronizer(&page, ThemeMode::Light);
    let applied = sync.initialize();

    assert_eq!(applied.mode, ThemeMode::Dark);
    assert_eq!((applied.shown, applied.hidden), (2, 2));
    assert_eq!(visible(&page), (0, 2));
}

#[test]
fn auto_follows_system_changes() {
    let page = load(Some(AUTO));
    let (sync, system) = synchronizer(&page, ThemeMode::Dark);
    let (applied, _attachment) = sync.start();
    assert_eq!(applied.mode, ThemeMode::Dark);
    assert_eq!(visible(&page), (0, 2));

    system.set(ThemeMode::Light);
    assert_eq!(page.preference_marker().as_deref(), Some(AUTO));
    assert_eq!(visible(&page), (2, 0));
}

#[test]
fn missing_marker_uses_system() {
    let page = load(None);
    let (sync, _) = synchronizer(&page, ThemeMode::Dark);
    assert_eq!(sync.initialize().mode, ThemeMode::Dark);
    assert_eq!(visible(&page), (0, 2));
}

#[test]
fn toggle_to_auto_resolves_light_system() {
    let page = load(Some(DARK));
    let (sync, _) = synchronizer(&page, ThemeMode::Light);
    let (_, _attachment) = sync.start();
    assert_eq!(visible(&page), (0, 2));

    // __palette_0 carries the automatic marker.
    page.select_toggle(0).unwrap();
    assert_eq!(page.preference_marker().as_deref(), Some(AUTO));
    assert_eq!(visible(&page), (2, 0));
}

#[test]
fn unknown_marker_ignores_system_changes() {
    let page = load(Some("slate"));
    let (sync, system) = synchronizer(&page, ThemeMode::Light);
    let (applied, _attachment) = sync.start();
    assert_eq!(applied.mode, ThemeMode::Light);
    assert_eq!(visible(&page), (2, 0));

    system.set(ThemeMode::Dark);
    assert_eq!(visible(&page), (2, 0));
}

#[test]
fn explicit_toggle_pins_mode_against_system() {
    let page = load(Some(AUTO));
    let (sync, system) = synchronizer(&page, ThemeMode::Light);
    let (_, _attachment) = sync.start();

    page.select_toggle(2).unwrap();
    assert_eq!(visible(&page), (0, 2));

    system.set(ThemeMode::Dark);
    system.set(ThemeMode::Light);
    assert_eq!(visible(&page), (0, 2));
}

#[test]
fn untagged_diagrams_and_other_styles_are_preserved() {
    let page = load(Some(AUTO));
    let (sync, _) = synchronizer(&page, ThemeMode::Light);
    sync.initialize();
    sync.initialize();

    let html = page.to_html().unwrap();
    assert!(html.contains(r#"style="max-width: 80%; display: none""#));
    assert!(html.contains(r#"style="max-width: 80%; display: block""#));
    assert!(html.contains(r#"<div class="puml" style="display: block"><svg id="untagged">"#));
    assert_eq!(html.matches("display: block").count(), 3);
}

#[test]
fn replay_records_each_step() {
    let page = load(Some(AUTO));
    let system = Rc::new(OsSystemPreference::pinned(ThemeMode::Light));
    let report = puml_theme_sync::replay(
        page,
        system,
        SyncConfig::default(),
        &[
            PageEvent::System(ThemeMode::Dark),
            PageEvent::Toggle(1),
            PageEvent::System(ThemeMode::Light),
        ],
    )
    .unwrap();

    assert_eq!((report.light_total, report.dark_total), (2, 2));
    let seen: Vec<(&str, usize, usize)> = report
        .steps
        .iter()
        .map(|s| (s.trigger.as_str(), s.light_visible, s.dark_visible))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("load", 2, 0),
            ("system=dark", 0, 2),
            ("toggle=1", 2, 0),
            ("system=light", 2, 0),
        ]
    );
}

fn cli_args(input: Option<PathBuf>, out: PathBuf, emit: Emit) -> CliArgs {
    CliArgs {
        input,
        config: None,
        system: SystemSource::Dark,
        events: Vec::new(),
        emit,
        out: Some(out),
        no_script: false,
        debug: false,
    }
}

#[test]
fn cli_writes_synchronized_page() {
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("site/architecture.html");
    puml_theme_sync::run(cli_args(Some(fixture()), out.clone(), Emit::Page)).unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    let page = Page::parse(&html, SyncConfig::default());
    assert_eq!(visible(&page), (0, 2));
    assert_eq!(html.matches(r#"<script id="puml-theme-sync">"#).count(), 1);
    assert!(html.contains(r#"if (hostPreference() !== "auto") {"#));
}

#[test]
fn cli_keeps_one_script_when_run_twice() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("first.html");
    let second = tmp.path().join("second.html");
    puml_theme_sync::run(cli_args(Some(fixture()), first.clone(), Emit::Page)).unwrap();
    puml_theme_sync::run(cli_args(Some(first), second.clone(), Emit::Page)).unwrap();

    let html = std::fs::read_to_string(&second).unwrap();
    assert_eq!(html.matches("<script id=").count(), 1);
}

#[test]
fn cli_page_without_script() {
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("page.html");
    let mut args = cli_args(Some(fixture()), out.clone(), Emit::Page);
    args.no_script = true;
    puml_theme_sync::run(args).unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(!html.contains("puml-theme-sync"));
}

#[test]
fn cli_report_with_config_file() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("sync.json");
    std::fs::write(&config, r#"{ "hidden_display": "none !important" }"#).unwrap();

    let out = tmp.path().join("report.json");
    let mut args = cli_args(Some(fixture()), out.clone(), Emit::Report);
    args.config = Some(config);
    args.events = vec![PageEvent::Toggle(1)];
    puml_theme_sync::run(args).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["system"], "dark");
    assert_eq!(steps[0]["dark_visible"], 2);
    assert_eq!(steps[1]["trigger"], "toggle=1");
    assert_eq!(steps[1]["marker"], "(prefers-color-scheme: light)");
    assert_eq!(steps[1]["light_visible"], 2);
    assert_eq!(steps[1]["dark_visible"], 0);
}

#[test]
fn cli_emits_script_without_input() {
    let tmp = tempdir().unwrap();
    let out = tmp.path().join("assets/javascripts/puml-theme-sync.js");
    puml_theme_sync::run(cli_args(None, out.clone(), Emit::Script)).unwrap();

    let js = std::fs::read_to_string(&out).unwrap();
    assert!(js.contains("DOMContentLoaded"));
    assert!(js.contains(r#""data-puml-theme""#));
}

#[test]
fn cli_requires_input_for_page() {
    let tmp = tempdir().unwrap();
    let err = puml_theme_sync::run(cli_args(None, tmp.path().join("x.html"), Emit::Page))
        .unwrap_err();
    assert!(err.to_string().contains("--input is required"));
}

#[test]
fn cli_reports_bad_toggle_index() {
    let tmp = tempdir().unwrap();
    let mut args = cli_args(Some(fixture()), tmp.path().join("x.html"), Emit::Page);
    args.events = vec![PageEvent::Toggle(9)];
    let err = puml_theme_sync::run(args).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("replay toggle=9"));
    assert!(msg.contains("does not exist"));
}
