//! Per-session registry of spawned process groups.
//!
//! Admission is two-phase: [`ProcessRegistry::try_admit`] reserves a slot
//! before the process starts, and [`AdmitTicket::commit`] records the live
//! handle once the process group id is known. Entries are never removed when
//! a process exits naturally — the registry exists so teardown can signal
//! every group the session ever admitted, exactly once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

/// Exit state of one spawned process, written by its wait task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// Process has not been observed to exit.
    Running,
    /// Process exited on its own with the given code.
    Exited(i32),
    /// Process group was signalled during teardown, or the process was
    /// terminated by a signal.
    Killed,
}

/// Handle to one spawned process group.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pgid: i32,
    exit: Arc<Mutex<ExitState>>,
}

impl ProcessHandle {
    /// Build a handle for the given process group id. A non-positive id
    /// marks a process whose group is unknown and cannot be signalled.
    #[must_use]
    pub fn new(pgid: i32) -> Self {
        Self {
            pgid,
            exit: Arc::new(Mutex::new(ExitState::Running)),
        }
    }

    /// Process group id (equals the child pid when spawned with
    /// `process_group(0)`).
    #[must_use]
    pub fn pgid(&self) -> i32 {
        self.pgid
    }

    /// Current exit state.
    #[must_use]
    pub fn exit_state(&self) -> ExitState {
        *self.lock_exit()
    }

    /// Record a natural exit. Only a running process transitions.
    pub fn record_exit(&self, code: i32) {
        let mut exit = self.lock_exit();
        if *exit == ExitState::Running {
            *exit = ExitState::Exited(code);
        }
    }

    /// Record a signal-driven termination. Only a running process
    /// transitions.
    pub fn record_killed(&self) {
        let mut exit = self.lock_exit();
        if *exit == ExitState::Running {
            *exit = ExitState::Killed;
        }
    }

    /// Send SIGKILL to the whole process group.
    ///
    /// Best-effort: a group that is already gone is expected during
    /// teardown, and any other failure is logged without propagating.
    pub fn kill_group(&self) {
        if self.pgid <= 0 {
            warn!(pgid = self.pgid, "process group id unknown, skipping kill");
            return;
        }

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            match killpg(Pid::from_raw(self.pgid), Signal::SIGKILL) {
                Ok(()) => {
                    self.record_killed();
                    debug!(pgid = self.pgid, "process group signalled");
                }
                Err(Errno::ESRCH) => {
                    debug!(pgid = self.pgid, "process group already gone");
                }
                Err(err) => {
                    warn!(pgid = self.pgid, %err, "failed to signal process group");
                }
            }
        }

        #[cfg(not(unix))]
        warn!(
            pgid = self.pgid,
            "process-group signalling is unsupported on this platform"
        );
    }

    fn lock_exit(&self) -> MutexGuard<'_, ExitState> {
        self.exit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: Vec<ProcessHandle>,
    reserved: usize,
    draining: bool,
}

/// Capacity-bounded registry of the process groups one session has admitted.
#[derive(Debug)]
pub struct ProcessRegistry {
    capacity: usize,
    inner: Arc<Mutex<RegistryInner>>,
}

impl ProcessRegistry {
    /// Create a registry admitting at most `capacity` processes over the
    /// session's lifetime.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Arc::new(Mutex::new(RegistryInner::default())),
        }
    }

    /// Reserve a slot ahead of spawning.
    ///
    /// Returns `None` when the registry is full or the session is already
    /// draining; the caller must refuse the spawn.
    pub fn try_admit(&self) -> Option<AdmitTicket> {
        let mut inner = self.lock();
        if inner.draining || inner.entries.len() + inner.reserved >= self.capacity {
            return None;
        }
        inner.reserved += 1;
        Some(AdmitTicket {
            inner: Arc::clone(&self.inner),
            spent: false,
        })
    }

    /// Number of committed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no entries have been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the registry draining and take every committed handle.
    ///
    /// Called exactly once at teardown; subsequent admissions and commits
    /// are refused, so each returned group is signalled exactly once.
    pub fn drain(&self) -> Vec<ProcessHandle> {
        let mut inner = self.lock();
        inner.draining = true;
        std::mem::take(&mut inner.entries)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Slot reservation returned by [`ProcessRegistry::try_admit`].
///
/// Dropping the ticket without committing releases the slot, so a failed
/// spawn leaves the registry count unchanged.
#[derive(Debug)]
pub struct AdmitTicket {
    inner: Arc<Mutex<RegistryInner>>,
    spent: bool,
}

impl AdmitTicket {
    /// Commit the spawned handle into the registry.
    ///
    /// Returns `false` when the session began draining after admission; the
    /// drain sweep has already run, so the caller must kill the group
    /// itself.
    pub fn commit(mut self, handle: ProcessHandle) -> bool {
        self.spent = true;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.reserved = inner.reserved.saturating_sub(1);
        if inner.draining {
            return false;
        }
        inner.entries.push(handle);
        true
    }
}

impl Drop for AdmitTicket {
    fn drop(&mut self) {
        if !self.spent {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.reserved = inner.reserved.saturating_sub(1);
        }
    }
}
