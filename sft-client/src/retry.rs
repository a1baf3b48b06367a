//! Retry with exponential backoff for HTTP sends.
//!
//! Retries only on transport errors. A response of any status is returned to
//! the caller immediately.

use crate::config::RetryPolicy;

/// Which transport failures may be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    /// Repeating the request has no further effect: retry any send failure,
    /// timeouts included.
    Idempotent,
    /// The server may have acted on a request that timed out: retry only
    /// when the connection was never established.
    ConnectFailureOnly,
}

impl Replay {
    fn allows(self, error: &reqwest::Error) -> bool {
        match self {
            Self::Idempotent => true,
            Self::ConnectFailureOnly => error.is_connect(),
        }
    }
}

/// Send an HTTP request, retrying transport failures per `policy`.
///
/// The closure `f` is called up to `policy.max_retries + 1` times. Delays
/// come from [`sft_core::retry_delay`].
pub(crate) async fn retry_send<F, Fut>(
    policy: &RetryPolicy,
    replay: Replay,
    what: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if !replay.allows(&e) => {
                tracing::warn!("{what} failed and is not safe to repeat: {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = sft_core::retry_delay(policy.base_delay, attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "{what} failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    // Final attempt, no more retries.
    f().await
}
