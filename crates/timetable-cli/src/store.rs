//! JSON files backing the CLI: the slot store and the scheduler config.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use timetable_engine::{InMemoryRepository, LectureSlot, SchedulerOptions};
use tracing::{debug, warn};

/// Load the slot store. A missing file is an empty store.
pub fn load_store(path: &Path) -> Result<InMemoryRepository> {
    if !path.exists() {
        debug!(path = %path.display(), "store not found, starting empty");
        return Ok(InMemoryRepository::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read store {}", path.display()))?;
    let slots: Vec<LectureSlot> = serde_json::from_str(&text)
        .with_context(|| format!("invalid store {}", path.display()))?;
    debug!(path = %path.display(), slots = slots.len(), "loaded store");
    check_stored(path, &slots);
    Ok(InMemoryRepository::from_slots(slots))
}

/// Hand-edited stores bypass the scheduler's validation. Flag what it
/// would have rejected; the audit command reports overlaps.
fn check_stored(path: &Path, slots: &[LectureSlot]) {
    let mut seen = HashSet::new();
    for slot in slots {
        if !seen.insert(slot.id.as_str()) {
            warn!(path = %path.display(), id = %slot.id, "duplicate slot id in store, keeping the last");
        }
        let problems = slot.details.shape_violations();
        if !problems.is_empty() {
            warn!(
                path = %path.display(),
                id = %slot.id,
                problems = %problems.join("; "),
                "stored slot is malformed"
            );
        }
    }
}

pub fn save_store(path: &Path, repo: InMemoryRepository) -> Result<()> {
    let slots = repo.into_slots();
    let text = serde_json::to_string_pretty(&slots)?;
    fs::write(path, text + "\n")
        .with_context(|| format!("failed to write store {}", path.display()))?;
    debug!(path = %path.display(), slots = slots.len(), "saved store");
    Ok(())
}

/// Scheduler options from `path`, or the defaults when no config is given.
pub fn load_options(path: Option<&Path>) -> Result<SchedulerOptions> {
    match path {
        None => Ok(SchedulerOptions::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))
        }
    }
}

/// Parse a JSON document from a file, or from stdin when `source` is `-`.
pub fn read_json<T: DeserializeOwned>(source: &str) -> Result<T> {
    let text = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {source}"))
}
