//! Output paths claimed by the tasks of one batch.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::resolver::ResolvedTarget;

/// Paths already handed to a task of this batch. Two tasks never write the
/// same file: a later claim on a taken path gets a numbered name instead.
#[derive(Debug, Default)]
pub(crate) struct ClaimedPaths {
    taken: Mutex<HashSet<PathBuf>>,
}

impl ClaimedPaths {
    pub(crate) fn claim(&self, task: usize, mut target: ResolvedTarget) -> ResolvedTarget {
        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        if taken.insert(target.path()) {
            return target;
        }
        let original = target.filename.clone();
        let mut n = 2;
        loop {
            target.filename = numbered(&original, n);
            if taken.insert(target.path()) {
                tracing::warn!(
                    task,
                    requested = %original,
                    assigned = %target.filename,
                    "filename already used in this batch, renamed"
                );
                return target;
            }
            n += 1;
        }
    }
}

/// `x.iso` → `x-2.iso`; names without an extension get the suffix appended.
fn numbered(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", name, n),
    }
}
