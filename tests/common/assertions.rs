//! Assertions shared by the pipeline tests

use std::path::Path;
use tokio::sync::broadcast;
use vidgrab::{Event, RequestStage, UserId};

/// Drain every event already broadcast
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Stage recorded in the user's `Failed` event, if any
pub fn failed_stage(events: &[Event], user: UserId) -> Option<RequestStage> {
    events.iter().find_map(|e| match e {
        Event::Failed { user: u, stage, .. } if *u == user => Some(*stage),
        _ => None,
    })
}

/// Panic unless `dir` is empty
pub fn assert_no_artifacts(dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(
        leftovers.is_empty(),
        "artifacts left in {}: {:?}",
        dir.display(),
        leftovers
    );
}
