use std::future::Future;
use std::time::Duration;

use axum::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, StoreError, StoreResult};

/// Process-wide source of per-request call contexts.
///
/// Installed as a router extension. Cancelling `root` aborts every store call
/// still in flight.
#[derive(Clone, Debug)]
pub struct CallBudget {
    root: CancellationToken,
    timeout: Duration,
}

impl CallBudget {
    pub fn new(root: CancellationToken, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    /// Ceiling on a single request, also applied to the whole router.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn context(&self) -> CallContext {
        CallContext::new(self.root.child_token(), self.timeout)
    }
}

/// Cancellation signal and deadline handed to every store operation.
#[derive(Clone, Debug)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Instant,
}

impl CallContext {
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Drives `call` unless the context is cancelled or its deadline passes
    /// first. An already expired context never polls `call`.
    pub async fn run<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(StoreError::DeadlineExceeded);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(StoreError::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => Err(StoreError::DeadlineExceeded),
            result = call => result.map_err(StoreError::from),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallBudget>()
            .map(CallBudget::context)
            .ok_or_else(|| ApiError::Internal {
                message: "request context unavailable",
                source: StoreError::Cancelled,
            })
    }
}
