use std::collections::HashSet;
use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tidewatch_core::{Output, TEXT_HTML, TEXT_PLAIN};
use tidewatch_engine::{Action, AtomicFileWriter, DirectoryAction, LogAction};

fn output(n: usize) -> Output {
    Output::new(format!("Error while processing “r{n}”"))
        .with_text(TEXT_PLAIN, format!("Failed: cause {n}"))
        .with_text(TEXT_HTML, format!("<div>Failed: cause {n}</div>"))
}

#[test]
fn back_to_back_notifications_get_their_own_files() {
    let temp = TempDir::new().unwrap();
    let action = DirectoryAction::new(temp.path(), "errors");

    for n in 0..50 {
        action.execute(&output(n)).unwrap();
    }

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 100);
    assert_eq!(names.iter().filter(|name| name.ends_with(".txt")).count(), 50);

    let bodies: HashSet<String> = names
        .iter()
        .filter(|name| name.ends_with(".txt"))
        .map(|name| fs::read_to_string(temp.path().join(name)).unwrap())
        .collect();
    assert_eq!(bodies.len(), 50);
    assert!(bodies.contains("Failed: cause 49"));
}

#[test]
fn clones_share_the_sequence() {
    let temp = TempDir::new().unwrap();
    let action = DirectoryAction::new(temp.path(), "errors");
    let clone = action.clone();

    for n in 0..10 {
        action.execute(&output(n)).unwrap();
        clone.execute(&output(n + 100)).unwrap();
    }

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 40);
}

#[test]
fn plain_and_html_bodies_share_a_stem() {
    let temp = TempDir::new().unwrap();
    DirectoryAction::new(temp.path(), "daily comic")
        .execute(&output(1))
        .unwrap();

    let mut stems: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            path.file_stem().unwrap().to_string_lossy().into_owned()
        })
        .collect();
    stems.dedup();
    assert_eq!(stems.len(), 1);
    assert!(stems[0].contains("-0000-daily_comic--"), "{}", stems[0]);
}

#[test]
fn write_new_leaves_existing_files_alone() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write_new("note.txt", b"first").unwrap();
    let second = writer.write_new("note.txt", b"second").unwrap();

    assert_eq!(first, Some(temp.path().join("note.txt")));
    assert_eq!(second, None);
    assert_eq!(fs::read_to_string(temp.path().join("note.txt")).unwrap(), "first");
}

#[test]
fn log_action_always_succeeds() {
    assert!(LogAction.execute(&output(0)).is_ok());
}
