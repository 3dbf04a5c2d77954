//! End-to-end poll cycles against a fake Plex server and real directories.

mod common;

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{set_mtime, set_mtime_nanos, FakePlex};
use plexwatch::config::{AdvancePolicy, WatchPath};
use plexwatch::error::ResolutionError;
use plexwatch::remote::LibrarySection;
use plexwatch::startup::bootstrap;
use plexwatch::storage::{PersistedState, Signature, StateStore};
use plexwatch::watcher::{Phase, RecordingSink, WatchEvent};
use plexwatch::{Config, Error};
use tempfile::TempDir;

fn config(state_dir: &TempDir, watch: Vec<WatchPath>) -> Config {
    Config {
        token: Some("test-token".to_string()),
        watch_paths: watch,
        state_file: state_dir.path().join("state.json"),
        ..Default::default()
    }
}

fn movies_section(path: &str) -> LibrarySection {
    LibrarySection::new("3", "Movies", [path])
}

fn seed_state(config: &Config, entries: &[(&str, f64)]) {
    let state: PersistedState = entries
        .iter()
        .map(|(path, secs)| ((*path).to_string(), Signature::from_secs(*secs)))
        .collect();
    StateStore::new(&config.state_file, RecordingSink::new())
        .save(&state)
        .unwrap();
}

fn stored(config: &Config) -> PersistedState {
    StateStore::new(&config.state_file, RecordingSink::new())
        .try_load()
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_new_file_triggers_refresh_and_advances_state() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().join("movies");
    fs::create_dir(&movies).unwrap();
    let movies = movies.display().to_string();

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    seed_state(&config, &[(movies.as_str(), 100.0)]);

    fs::write(media.path().join("movies/new.mkv"), b"x").unwrap();
    set_mtime(&media.path().join("movies/new.mkv"), 150);
    set_mtime(media.path().join("movies").as_path(), 120);

    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    let sink = RecordingSink::new();
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), sink.clone())
        .await
        .unwrap();

    let report = scheduler.run_cycle().await;

    assert_eq!(report.changed, vec![movies.clone()]);
    assert_eq!(report.triggered, vec!["3".to_string()]);
    assert!(report.persisted);
    assert_eq!(plex.refreshed(), vec!["3".to_string()]);
    assert_eq!(stored(&config)[&movies], Signature::from_secs(150.0));
    assert_eq!(scheduler.phase(), Phase::Idle);
    assert_eq!(sink.count("trigger_succeeded"), 1);
}

#[tokio::test]
async fn test_unchanged_tree_does_not_trigger_again() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    fs::write(media.path().join("a.mkv"), b"x").unwrap();
    set_mtime(&media.path().join("a.mkv"), 150);
    set_mtime(media.path(), 150);

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    seed_state(&config, &[(movies.as_str(), 150.0)]);

    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();

    let first = scheduler.run_cycle().await;
    let second = scheduler.run_cycle().await;

    assert!(first.changed.is_empty());
    assert!(second.changed.is_empty());
    assert!(plex.refreshed().is_empty());
    assert_eq!(scheduler.cycles(), 2);
}

#[tokio::test]
async fn test_first_run_without_state_triggers_every_library() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    fs::write(media.path().join("a.mkv"), b"x").unwrap();

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();

    assert!(scheduler.baseline().is_empty());
    let report = scheduler.run_cycle().await;

    assert_eq!(report.triggered, vec!["3".to_string()]);
    assert!(state_dir.path().join("state.json").exists());
}

#[tokio::test]
async fn test_ignored_files_do_not_count() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    set_mtime(media.path(), 100);

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    seed_state(&config, &[(movies.as_str(), 100.0)]);

    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();

    let partial = media.path().join("film.mkv.partial~");
    fs::write(&partial, b"x").unwrap();
    set_mtime(&partial, 500);
    // Creating the file bumped the directory itself.
    set_mtime(media.path(), 100);

    let report = scheduler.run_cycle().await;

    assert!(report.changed.is_empty());
    assert!(plex.refreshed().is_empty());
}

#[tokio::test]
async fn test_only_matching_paths_are_watched() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().join("movies");
    let music = media.path().join("music");
    fs::create_dir(&movies).unwrap();
    fs::create_dir(&music).unwrap();
    let movies = movies.display().to_string();
    let music = music.display().to_string();

    let config = config(
        &state_dir,
        vec![
            WatchPath::new(&movies, "Movies"),
            WatchPath::new(&music, "Music"),
        ],
    );
    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    let sink = RecordingSink::new();
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), sink.clone())
        .await
        .unwrap();

    assert_eq!(scheduler.mapping().len(), 1);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        WatchEvent::ResolutionSkipped { path, .. } if *path == music
    )));

    let report = scheduler.run_cycle().await;
    assert!(report.signatures.contains_key(&movies));
    assert!(!report.signatures.contains_key(&music));
}

#[tokio::test]
async fn test_listing_failure_stops_before_any_cycle() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    plex.listing_fails.store(true, Ordering::SeqCst);

    let err = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, Error::Resolution(ResolutionError::Unreachable { .. })));
    assert!(err.is_fatal());
    assert!(plex.refreshed().is_empty());
    assert!(!state_dir.path().join("state.json").exists());
}

#[tokio::test]
async fn test_failed_refresh_is_retried_only_with_on_success_policy() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    fs::write(media.path().join("a.mkv"), b"x").unwrap();
    set_mtime(&media.path().join("a.mkv"), 200);
    set_mtime(media.path(), 200);

    let mut config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    config.advance_policy = AdvancePolicy::OnSuccess;
    seed_state(&config, &[(movies.as_str(), 100.0)]);

    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));
    plex.fail_refresh("3");
    let mut scheduler = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();

    let first = scheduler.run_cycle().await;
    assert_eq!(first.failed, vec!["3".to_string()]);
    assert_eq!(stored(&config)[&movies], Signature::from_secs(100.0));

    plex.failing_ids.lock().clear();
    let second = scheduler.run_cycle().await;
    assert_eq!(second.triggered, vec!["3".to_string()]);
    assert_eq!(stored(&config)[&movies], Signature::from_secs(200.0));
}

#[tokio::test]
async fn test_restart_resumes_from_saved_state() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    fs::write(media.path().join("a.mkv"), b"x").unwrap();
    set_mtime(&media.path().join("a.mkv"), 300);
    set_mtime(media.path(), 300);

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));

    let mut first = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();
    first.run_cycle().await;
    drop(first);

    let mut second = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();
    assert_eq!(second.baseline()[&movies], Signature::from_secs(300.0));
    let report = second.run_cycle().await;

    assert!(report.changed.is_empty());
    assert_eq!(plex.refreshed(), vec!["3".to_string()]);
}

#[tokio::test]
async fn test_restart_with_subsecond_mtimes_does_not_retrigger() {
    let media = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let movies = media.path().display().to_string();
    let file = media.path().join("a.mkv");
    fs::write(&file, b"x").unwrap();
    set_mtime_nanos(&file, 1_671_705_465, 534_415_700);
    set_mtime(media.path(), 1_000);

    let config = config(&state_dir, vec![WatchPath::new(&movies, "Movies")]);
    let plex = Arc::new(FakePlex::new(vec![movies_section(&movies)]));

    let mut first = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();
    let saved = first.run_cycle().await.signatures[&movies];
    drop(first);

    let mut second = bootstrap(&config, Arc::clone(&plex), RecordingSink::new())
        .await
        .unwrap();
    assert_eq!(second.baseline()[&movies].as_secs().to_bits(), saved.as_secs().to_bits());

    let report = second.run_cycle().await;
    assert!(report.changed.is_empty());
    assert_eq!(plex.refreshed(), vec!["3".to_string()]);
}
