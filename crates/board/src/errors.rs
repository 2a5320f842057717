//! Error and retry-policy types shared across the engine.
//!
//! [`TrackerError`] is the single error type of the [`crate::TrackerClient`]
//! port: adapters translate their transport-level failures into it so the
//! reconciler can classify a failure without knowing which backend produced
//! it.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error that participates in
//! retry decisions must be able to produce one. The engine itself never
//! retries — it is a reconciler, not a ledger, and every pass is safely
//! re-runnable from scratch — but callers scheduling passes use the policy to
//! decide whether an immediate rerun is worthwhile.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` response header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without operator intervention.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

/// Failure reported by a tracker client operation.
///
/// The variants separate transient conditions (rate limits, transport
/// failures) from permanent ones (missing entities, rejected credentials,
/// malformed responses) so a caller can choose to retry the whole pass
/// safely.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker throttled the request.
    #[error("tracker rate limit hit (retry after {retry_after:?})")]
    RateLimited {
        /// Server-suggested back-off, when the response carried one.
        retry_after: Option<Duration>,
    },

    /// The request could not be transported (connection, TLS, timeout).
    #[error("tracker transport failure: {message}")]
    Transport {
        /// Human-readable description from the HTTP layer.
        message: String,
    },

    /// The tracker rejected the credentials or the token lacks a scope.
    #[error("tracker rejected credentials: {message}")]
    Unauthorized {
        /// Tracker-supplied detail.
        message: String,
    },

    /// The addressed entity does not exist (board, repository, item).
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing entity.
        what: String,
    },

    /// The tracker answered with an application-level error.
    #[error("tracker API error: {message}")]
    Api {
        /// Concatenated error messages from the response body.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode tracker response: {message}")]
    Decode {
        /// What failed to decode.
        message: String,
    },
}

impl TrackerError {
    /// Classifies this error for callers deciding whether to rerun the pass.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Unauthorized { .. } | Self::NotFound { .. } | Self::Api { .. } | Self::Decode { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable_with_backoff() {
        let err = TrackerError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30))
            }
        );
    }

    #[test]
    fn not_found_is_permanent() {
        let err = TrackerError::NotFound {
            what: "board atnplex/projects/4".into(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
    }
}
