use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

use crate::{dispatch, translate, ChangeEvent, FileWatcher, IgnoreRules, Rebuild, WatchConfig, WatchIssueKind};

#[derive(Default)]
struct Recorder {
    rebuilt: Vec<PathBuf>,
    fail: bool,
}

impl Rebuild for Recorder {
    type Error = String;

    fn rebuild(&mut self, changed: &Path) -> Result<(), String> {
        self.rebuilt.push(changed.to_path_buf());
        if self.fail {
            Err("bundle failed".to_string())
        } else {
            Ok(())
        }
    }
}

fn rules() -> IgnoreRules {
    IgnoreRules::new(Path::new("/app"), &WatchConfig::default())
}

fn event(kind: EventKind, paths: &[&str]) -> notify::Result<Event> {
    Ok(paths
        .iter()
        .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path))))
}

#[test]
fn test_translate_kinds() {
    let rules = rules();

    assert_eq!(
        translate(&rules, event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/app/a.pug"])),
        vec![ChangeEvent::Changed(PathBuf::from("/app/a.pug"))]
    );
    assert_eq!(
        translate(&rules, event(EventKind::Create(CreateKind::File), &["/app/b.pug"])),
        vec![ChangeEvent::Added(PathBuf::from("/app/b.pug"))]
    );
    assert_eq!(
        translate(&rules, event(EventKind::Remove(RemoveKind::File), &["/app/c.pug"])),
        vec![ChangeEvent::Removed(PathBuf::from("/app/c.pug"))]
    );
    assert!(translate(
        &rules,
        event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)), &["/app/a.pug"])
    )
    .is_empty());
}

#[test]
fn test_translate_rename_pair() {
    let events = translate(
        &rules(),
        event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/app/old.pug", "/app/new.pug"],
        ),
    );
    assert_eq!(
        events,
        vec![
            ChangeEvent::Removed(PathBuf::from("/app/old.pug")),
            ChangeEvent::Added(PathBuf::from("/app/new.pug")),
        ]
    );

    // an editor swap file renamed into place only reports the real file
    let events = translate(
        &rules(),
        event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/app/.a.pug.swp", "/app/a.pug"],
        ),
    );
    assert_eq!(events, vec![ChangeEvent::Added(PathBuf::from("/app/a.pug"))]);
}

#[test]
fn test_translate_drops_ignored_paths() {
    let events = translate(
        &rules(),
        event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/app/build/bundle.js", "/app/node_modules/x/index.js", "/app/src/page.pug"],
        ),
    );
    assert_eq!(events, vec![ChangeEvent::Changed(PathBuf::from("/app/src/page.pug"))]);
}

#[test]
fn test_translate_error() {
    let events = translate(&rules(), Err(notify::Error::generic("inotify limit reached")));
    assert!(matches!(&events[..], [ChangeEvent::Error(message)] if message.contains("inotify limit")));
}

#[test]
fn test_dispatch_rebuilds_only_on_change() {
    let mut recorder = Recorder::default();

    dispatch(&ChangeEvent::Added(PathBuf::from("a.pug")), &mut recorder);
    dispatch(&ChangeEvent::Removed(PathBuf::from("a.pug")), &mut recorder);
    dispatch(&ChangeEvent::Error("boom".to_string()), &mut recorder);
    assert!(recorder.rebuilt.is_empty());

    dispatch(&ChangeEvent::Changed(PathBuf::from("a.pug")), &mut recorder);
    assert_eq!(recorder.rebuilt, vec![PathBuf::from("a.pug")]);
}

#[test]
fn test_failed_rebuild_keeps_going() {
    let mut recorder = Recorder {
        fail: true,
        ..Recorder::default()
    };
    dispatch(&ChangeEvent::Changed(PathBuf::from("a.pug")), &mut recorder);
    dispatch(&ChangeEvent::Changed(PathBuf::from("b.pug")), &mut recorder);
    assert_eq!(recorder.rebuilt.len(), 2);
}

#[test]
fn test_missing_extra_dir_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shared")).unwrap();
    fs::write(dir.path().join("shared/theme.styl"), "a {}").unwrap();

    let config = WatchConfig {
        also_watch_dirs: vec![PathBuf::from("shared"), PathBuf::from("missing"), PathBuf::from("gone")],
        ..WatchConfig::default()
    };
    let (_watcher, issues) = FileWatcher::new(dir.path(), &config).unwrap();

    assert_eq!(issues.len(), 2);
    assert!(issues
        .iter()
        .all(|(kind, message)| *kind == WatchIssueKind::AlsoWatchDirs && message == "path does not exist, skipping"));
    assert_eq!(issues.lines()[0], "[alsoWatchDirs]: path does not exist, skipping");
}

#[test]
fn test_file_watcher_reports_writes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let (watcher, issues) = FileWatcher::new(&root, &WatchConfig::default()).unwrap();
    assert!(issues.is_empty());

    let file = root.join("page.pug");
    fs::write(&file, "p hello").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        match watcher.next_events_timeout(Duration::from_millis(200)) {
            Some(events) => seen.extend(events),
            None => break,
        }
        if seen
            .iter()
            .any(|event| matches!(event, ChangeEvent::Added(p) | ChangeEvent::Changed(p) if p == &file))
        {
            return;
        }
    }
    panic!("no event for {}: {:?}", file.display(), seen);
}
