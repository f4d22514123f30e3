use std::collections::HashSet;

use super::TrackCandidate;

// Keeps candidate order; discovery mode drops anything in `already_heard`
// before truncating to `limit`.
pub fn select(
    candidates: Vec<TrackCandidate>,
    already_heard: &HashSet<String>,
    discovery_mode: bool,
    limit: usize,
) -> Vec<TrackCandidate> {
    candidates
        .into_iter()
        .filter(|track| !discovery_mode || !already_heard.contains(&track.id))
        .take(limit)
        .collect()
}
