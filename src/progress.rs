/// Build progress reporting

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle state of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// The build stopped with an error
    Failed,
    /// Reading the source directory
    Enumerating,
    /// Writing descriptors, path tables and directory structures
    WritingSectors,
    /// Copying file payload
    WritingFiles,
    /// Writing padding and the end-of-session descriptor
    WritingEnd,
    /// The image is complete
    Finished,
}

impl ProgressState {
    /// Check whether no further updates follow this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressState::Failed | ProgressState::Finished)
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ProgressState::Failed => "Failed",
            ProgressState::Enumerating => "Enumerating",
            ProgressState::WritingSectors => "Writing sectors",
            ProgressState::WritingFiles => "Writing files",
            ProgressState::WritingEnd => "Writing end",
            ProgressState::Finished => "Finished",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of build progress
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Current state
    pub state: ProgressState,
    /// Completion estimate in [0, 1]
    pub progress: f32,
    /// File being copied, if any
    pub file_name: Option<String>,
    /// Set once the build has succeeded or failed
    pub finished: bool,
    /// State changed since the last poll
    pub new_state: bool,
    /// File name changed since the last poll
    pub new_file: bool,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: ProgressState::Enumerating,
            progress: 0.0,
            file_name: None,
            finished: false,
            new_state: true,
            new_file: false,
        }
    }
}

impl Progress {
    /// Apply an update, keeping progress monotonic and the terminal state final
    pub fn apply(&mut self, state: ProgressState, progress: f32, file_name: Option<&str>) {
        if self.finished {
            return;
        }
        if state != self.state {
            self.state = state;
            self.new_state = true;
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress > self.progress {
            self.progress = progress;
        }
        if file_name != self.file_name.as_deref() {
            self.file_name = file_name.map(str::to_string);
            self.new_file = true;
        }
        if state.is_terminal() {
            self.finished = true;
            if state == ProgressState::Finished {
                self.progress = 1.0;
            }
        }
    }
}

/// Receiver of progress updates from a build
pub trait ProgressSink: Send + Sync {
    /// Publish a state, a completion estimate and the current file
    fn update(&self, state: ProgressState, progress: f32, file_name: Option<&str>);
}

/// Sink that drops every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _state: ProgressState, _progress: f32, _file_name: Option<&str>) {}
}

/// Progress record shared between a build thread and its pollers
#[derive(Debug, Clone, Default)]
pub struct SharedProgress {
    inner: Arc<Mutex<Progress>>,
}

impl SharedProgress {
    /// Create a record in the enumerating state
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        // A panicking writer leaves a complete record behind; keep reading it
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy the record and clear its change flags
    pub fn poll(&self) -> Progress {
        let mut guard = self.lock();
        let snapshot = guard.clone();
        guard.new_state = false;
        guard.new_file = false;
        snapshot
    }

    /// Copy the record without touching the change flags
    pub fn snapshot(&self) -> Progress {
        self.lock().clone()
    }
}

impl ProgressSink for SharedProgress {
    fn update(&self, state: ProgressState, progress: f32, file_name: Option<&str>) {
        self.lock().apply(state, progress, file_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_clears_flags() {
        let shared = SharedProgress::new();
        shared.update(ProgressState::WritingFiles, 0.5, Some("SYSTEM.CNF"));

        let first = shared.poll();
        assert_eq!(first.state, ProgressState::WritingFiles);
        assert!(first.new_state);
        assert!(first.new_file);
        assert_eq!(first.file_name.as_deref(), Some("SYSTEM.CNF"));

        let second = shared.poll();
        assert!(!second.new_state);
        assert!(!second.new_file);
        assert_eq!(second.progress, 0.5);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut p = Progress::default();
        p.apply(ProgressState::WritingSectors, 0.4, None);
        p.apply(ProgressState::WritingFiles, 0.2, Some("A.BIN"));
        assert_eq!(p.progress, 0.4);
        p.apply(ProgressState::WritingFiles, 1.5, Some("A.BIN"));
        assert_eq!(p.progress, 1.0);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut p = Progress::default();
        p.apply(ProgressState::Failed, 0.3, None);
        assert!(p.finished);
        p.apply(ProgressState::Finished, 1.0, None);
        assert_eq!(p.state, ProgressState::Failed);
        assert_eq!(p.progress, 0.3);
    }

    #[test]
    fn test_finished_reaches_one() {
        let mut p = Progress::default();
        p.apply(ProgressState::WritingEnd, 0.97, None);
        p.apply(ProgressState::Finished, 0.97, None);
        assert!(p.finished);
        assert_eq!(p.progress, 1.0);
    }

    #[test]
    fn test_snapshot_keeps_flags() {
        let shared = SharedProgress::new();
        assert!(shared.snapshot().new_state);
        assert!(shared.snapshot().new_state);
        assert!(shared.poll().new_state);
        assert!(!shared.snapshot().new_state);
    }
}
