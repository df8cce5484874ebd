use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Whether the dashboard is currently in front of the user.
///
/// Cloned into every poller that should go quiet while hidden. Pollers read
/// it only when their interval fires.
#[derive(Debug, Clone)]
pub struct Visibility(Arc<AtomicBool>);

impl Visibility {
    /// Starts visible.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set_visible(&self, visible: bool) {
        let was = self.0.swap(visible, Ordering::SeqCst);
        if was != visible {
            tracing::debug!(visible, "Visibility changed");
        }
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one scheduled poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New data was published.
    Updated,
    /// At least one request failed; the previous state was kept.
    Failed,
    /// Not issued because the dashboard was hidden when the interval fired.
    Skipped,
    /// Completed after unmount; the result was dropped.
    Discarded,
}

/// A mounted background poller. Dropping it unmounts.
///
/// Unmounting stops the interval immediately. A request already in flight
/// is allowed to finish, and the poller drops its result instead of
/// publishing it.
#[derive(Debug)]
pub struct Mounted {
    name: &'static str,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Mounted {
    /// Spawn `body` with a fresh mount token.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = tokio::spawn(body(token.clone()));
        tracing::debug!(poller = name, "Mounted");
        Self {
            name,
            token,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn unmount(self) {
        drop(self);
    }

    /// Unmount and wait until the poller task, including any in-flight
    /// request, has finished.
    pub async fn unmount_and_wait(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(poller = self.name, error = %e, "Poller task ended abnormally");
        }
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            self.token.cancel();
            tracing::debug!(poller = self.name, "Unmounted");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn visibility_starts_visible_and_is_shared() {
        let v = Visibility::new();
        let clone = v.clone();
        assert!(clone.is_visible());
        v.set_visible(false);
        assert!(!clone.is_visible());
    }

    #[tokio::test]
    async fn drop_cancels_token() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mounted = Mounted::spawn("test", |token| async move {
            token.cancelled().await;
            let _ = tx.send(());
        });
        assert!(mounted.is_mounted());
        drop(mounted);
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("task observed cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn unmount_and_wait_lets_work_finish() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let mounted = Mounted::spawn("test", |_token| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });
        mounted.unmount_and_wait().await;
        assert!(finished.load(Ordering::SeqCst));
    }
}
