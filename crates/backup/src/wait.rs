use crate::error::Result;
use crate::source::{ExtensionSource, TaskState};
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// How waiting on the listing refresh ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The refresh reached a terminal state (which may be a failure).
    Finished(TaskState),
    /// The timeout elapsed first; `last` is the last state observed.
    TimedOut { last: TaskState },
}

/// Poll the source's refresh state every `poll_interval` until it is
/// terminal or `timeout` has elapsed.
///
/// The state is always polled at least once, and once more at the deadline.
/// A timeout too large to be represented as a deadline never expires.
#[instrument(skip(source))]
pub async fn wait_until_terminal(
    source: &(dyn ExtensionSource + Send + Sync),
    poll_interval: Duration,
    timeout: Duration,
) -> Result<WaitOutcome> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        let state = source.refresh_state().await?;
        if state.is_terminal() {
            return Ok(WaitOutcome::Finished(state));
        }
        let Some(deadline) = deadline else {
            tokio::time::sleep(poll_interval).await;
            continue;
        };
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(%state, "gave up waiting for extension listing refresh");
            return Ok(WaitOutcome::TimedOut { last: state });
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
