//! Settle-all joins: wait for every task to finish, successfully or not.
//!
//! Each future runs as its own tokio task. A task that panics or is cancelled
//! only fills its own slot with a [`SettleError`]; the remaining slots still
//! carry their outputs. Contrast with `futures::future::try_join_all`, which
//! stops at the first failure.

use futures::future::join_all;
use std::any::Any;
use std::future::Future;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettleError {
    #[error("task panicked: {0}")]
    Panicked(String),
    #[error("task was cancelled")]
    Cancelled,
}

impl From<JoinError> for SettleError {
    fn from(e: JoinError) -> Self {
        if e.is_panic() {
            SettleError::Panicked(panic_message(e.into_panic()))
        } else {
            SettleError::Cancelled
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub type Settled<T> = Result<T, SettleError>;

/// Runs three heterogeneous futures concurrently and returns all their results.
pub async fn settle3<A, B, C>(
    a: A,
    b: B,
    c: C,
) -> (Settled<A::Output>, Settled<B::Output>, Settled<C::Output>)
where
    A: Future + Send + 'static,
    A::Output: Send + 'static,
    B: Future + Send + 'static,
    B::Output: Send + 'static,
    C: Future + Send + 'static,
    C::Output: Send + 'static,
{
    let (ra, rb, rc) = tokio::join!(tokio::spawn(a), tokio::spawn(b), tokio::spawn(c));
    (
        ra.map_err(SettleError::from),
        rb.map_err(SettleError::from),
        rc.map_err(SettleError::from),
    )
}

/// Runs every future concurrently; results keep the input order.
pub async fn settle_all<I, F>(futures: I) -> Vec<Settled<F::Output>>
where
    I: IntoIterator<Item = F>,
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    join_all(handles)
        .await
        .into_iter()
        .map(|r| r.map_err(SettleError::from))
        .collect()
}
