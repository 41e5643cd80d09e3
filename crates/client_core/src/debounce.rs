//! Cancellable quiet-period timer used to coalesce rapid edits on one field.
//!
//! Each [`DebounceTimer`] owns at most one sleeping task. Scheduling a new
//! value aborts the previous task before it can fire, so only the value that
//! survives a full quiet period is delivered on the commit channel. A task
//! that already fired cannot be recalled, so receivers tag values to spot
//! stale ones.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

pub struct DebounceTimer<T> {
    quiet_period: Duration,
    commits: mpsc::UnboundedSender<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> DebounceTimer<T>
where
    T: Send + 'static,
{
    pub fn new(quiet_period: Duration, commits: mpsc::UnboundedSender<T>) -> Self {
        Self {
            quiet_period,
            commits,
            task: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Restarts the quiet period with `value` as the candidate commit.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, value: T) {
        self.cancel();
        let commits = self.commits.clone();
        let quiet_period = self.quiet_period;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let _ = commits.send(value);
        }));
    }

    /// Drops the pending value without delivering it. Returns true when a
    /// commit was still outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let outstanding = !task.is_finished();
                task.abort();
                outstanding
            }
            None => false,
        }
    }

    /// True until the sleeping task has run. A value already handed to the
    /// channel may still be unread.
    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<T> Drop for DebounceTimer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
